//! Core storage and lookup logic for hackathon questionnaire responses.
//! This crate is the single source of truth for q11e invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, Q11eConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::mbti::MbtiType;
pub use model::q11e::{Q11e, Q11eValidationError};
pub use repo::base::{Page, RecordId, RepoError, RepoResult, RepositoryBase};
pub use repo::context::{ContextDone, RequestContext};
pub use repo::q11e_repo::{Q11eListQuery, Q11eRepository, SqliteQ11eRepository, UpsertOutcome};
pub use service::q11e_service::Q11eService;
pub use tokio_util::sync::CancellationToken;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
