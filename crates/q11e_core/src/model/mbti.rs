//! Myers-Briggs personality type codes.
//!
//! # Responsibility
//! - Map the 16 four-letter types to their stable integer codes.
//! - Decode persisted/wire codes back into named variants.
//!
//! # Invariants
//! - Codes are opaque identifiers; callers must not derive meaning from
//!   ordering or arithmetic between codes.
//! - `UnKnown` (`-1`) is the only code outside `0..=15`.

use crate::model::q11e::Q11eValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Personality classification stored in `Q11e::mbti`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum MbtiType {
    Infp = 0,
    Enfp = 1,
    Infj = 2,
    Enfj = 3,

    Intj = 4,
    Entj = 5,
    Intp = 6,
    Entp = 7,

    Isfp = 8,
    Esfp = 9,
    Istp = 10,
    Estp = 11,

    Isfj = 12,
    Esfj = 13,
    Istj = 14,
    Estj = 15,

    /// Absent or unclassified answer.
    #[default]
    UnKnown = -1,
}

impl MbtiType {
    /// The 16 named types in code order. Excludes `UnKnown`.
    pub const ALL: [MbtiType; 16] = [
        Self::Infp,
        Self::Enfp,
        Self::Infj,
        Self::Enfj,
        Self::Intj,
        Self::Entj,
        Self::Intp,
        Self::Entp,
        Self::Isfp,
        Self::Esfp,
        Self::Istp,
        Self::Estp,
        Self::Isfj,
        Self::Esfj,
        Self::Istj,
        Self::Estj,
    ];

    /// Integer code persisted in `Q11e::mbti`.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decodes a persisted code. Returns `None` for unrecognized codes.
    pub fn from_code(code: i32) -> Option<Self> {
        if code == Self::UnKnown.code() {
            return Some(Self::UnKnown);
        }
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Four-letter upper-case name, `UNKNOWN` for the sentinel.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Infp => "INFP",
            Self::Enfp => "ENFP",
            Self::Infj => "INFJ",
            Self::Enfj => "ENFJ",
            Self::Intj => "INTJ",
            Self::Entj => "ENTJ",
            Self::Intp => "INTP",
            Self::Entp => "ENTP",
            Self::Isfp => "ISFP",
            Self::Esfp => "ESFP",
            Self::Istp => "ISTP",
            Self::Estp => "ESTP",
            Self::Isfj => "ISFJ",
            Self::Esfj => "ESFJ",
            Self::Istj => "ISTJ",
            Self::Estj => "ESTJ",
            Self::UnKnown => "UNKNOWN",
        }
    }

    /// Returns whether this is one of the 16 named types.
    pub fn is_known(self) -> bool {
        self != Self::UnKnown
    }
}

impl Display for MbtiType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MbtiType> for i32 {
    fn from(value: MbtiType) -> Self {
        value.code()
    }
}

impl TryFrom<i32> for MbtiType {
    type Error = Q11eValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or(Q11eValidationError::InvalidMbtiCode(value))
    }
}

impl FromStr for MbtiType {
    type Err = Q11eValidationError;

    /// Parses a four-letter name, case-insensitive. `UNKNOWN` maps to the
    /// sentinel.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        if normalized == Self::UnKnown.as_str() {
            return Ok(Self::UnKnown);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Q11eValidationError::UnknownMbtiName(value.to_string()))
    }
}
