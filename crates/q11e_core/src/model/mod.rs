//! Questionnaire domain model.
//!
//! # Responsibility
//! - Define the survey response record and personality type codes.
//!
//! # Invariants
//! - A response is identified externally by its respondent `address`.
//! - Personality codes are opaque and stable across releases.

pub mod mbti;
pub mod q11e;
