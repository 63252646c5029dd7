//! Generic repository contract and shared error type.
//!
//! # Responsibility
//! - Define CRUD/list operations every entity repository exposes.
//! - Define the error channel shared by all repository implementations.
//!
//! # Invariants
//! - "Not found" on reads is `Ok(None)`, never an error.
//! - Write paths on missing ids return `RepoError::NotFound`.

use crate::db::DbError;
use crate::model::q11e::Q11eValidationError;
use crate::repo::context::{ContextDone, RequestContext};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable storage identifier assigned at insert.
pub type RecordId = Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for questionnaire persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(Q11eValidationError),
    Db(DbError),
    NotFound(RecordId),
    /// Another record already owns this address.
    DuplicateAddress(String),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    Cancelled,
    DeadlineExceeded,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "q11e record not found: {id}"),
            Self::DuplicateAddress(address) => {
                write!(f, "q11e record already exists for address `{address}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted q11e data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "q11e repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "q11e repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "q11e repository requires column `{column}` in table `{table}`"
            ),
            Self::Cancelled => write!(f, "request cancelled"),
            Self::DeadlineExceeded => write!(f, "request deadline exceeded"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Q11eValidationError> for RepoError {
    fn from(value: Q11eValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ContextDone> for RepoError {
    fn from(value: ContextDone) -> Self {
        match value {
            ContextDone::Cancelled => Self::Cancelled,
            ContextDone::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Pagination window shared by list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// CRUD contract every entity repository builds on.
///
/// Every method checks `ctx` before touching the store.
pub trait RepositoryBase<T> {
    /// Entity-specific list filter.
    type ListQuery;

    /// Persists a new entity and returns its assigned id.
    fn insert(&self, ctx: &RequestContext, entity: &T) -> RepoResult<RecordId>;
    fn get(&self, ctx: &RequestContext, id: RecordId) -> RepoResult<Option<T>>;
    /// Replaces the stored entity for `id`.
    fn update(&self, ctx: &RequestContext, id: RecordId, entity: &T) -> RepoResult<()>;
    fn delete(&self, ctx: &RequestContext, id: RecordId) -> RepoResult<()>;
    fn list(&self, ctx: &RequestContext, query: &Self::ListQuery) -> RepoResult<Vec<T>>;
    fn count(&self, ctx: &RequestContext) -> RepoResult<u64>;
}
