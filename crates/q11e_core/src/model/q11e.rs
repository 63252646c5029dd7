//! Questionnaire response model.
//!
//! # Responsibility
//! - Define the canonical survey response keyed by respondent address.
//! - Provide validation used by repository write and read paths.
//!
//! # Invariants
//! - `address` is non-empty (after trimming) for any persisted record.
//! - `mbti` is one of the `MbtiType` codes, `-1` included.
//! - Wire keys are `address, goals, interests, pref1, pref2, pref3, mbti`.

use crate::model::mbti::MbtiType;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation errors for questionnaire data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Q11eValidationError {
    /// Address is empty or whitespace only.
    EmptyAddress,
    /// `mbti` holds a code outside the known table.
    InvalidMbtiCode(i32),
    /// Four-letter name does not match any known type.
    UnknownMbtiName(String),
}

impl Display for Q11eValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "q11e address cannot be empty"),
            Self::InvalidMbtiCode(code) => write!(f, "invalid mbti code `{code}`"),
            Self::UnknownMbtiName(name) => write!(f, "unknown mbti type `{name}`"),
        }
    }
}

impl Error for Q11eValidationError {}

/// One respondent's answers to the hackathon questionnaire.
///
/// `mbti` stays a raw integer so records carrying codes from newer clients
/// still deserialize; use [`Q11e::mbti_type`] for the decoded value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Q11e {
    /// Respondent identity, usually a wallet address.
    pub address: String,
    /// Free-form goal tags, order preserved.
    pub goals: Vec<String>,
    /// Free-form interest tags, order preserved.
    pub interests: Vec<String>,
    pub pref1: String,
    pub pref2: String,
    pub pref3: String,
    /// `MbtiType` code; `-1` when unclassified.
    pub mbti: i32,
}

impl Q11e {
    /// Creates an empty response for `address` with an unknown type.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            goals: Vec::new(),
            interests: Vec::new(),
            pref1: String::new(),
            pref2: String::new(),
            pref3: String::new(),
            mbti: MbtiType::UnKnown.code(),
        }
    }

    /// Sets `mbti` from a named type.
    pub fn with_mbti(mut self, kind: MbtiType) -> Self {
        self.mbti = kind.code();
        self
    }

    /// Decoded personality type, `None` when `mbti` is unrecognized.
    pub fn mbti_type(&self) -> Option<MbtiType> {
        MbtiType::from_code(self.mbti)
    }

    /// Checks address presence and mbti code.
    ///
    /// # Errors
    /// - `EmptyAddress` when `address` is blank.
    /// - `InvalidMbtiCode` when `mbti` is outside the known table.
    pub fn validate(&self) -> Result<(), Q11eValidationError> {
        if self.address.trim().is_empty() {
            return Err(Q11eValidationError::EmptyAddress);
        }
        if self.mbti_type().is_none() {
            return Err(Q11eValidationError::InvalidMbtiCode(self.mbti));
        }
        Ok(())
    }
}
