//! Error types for reference-data sync.

use std::fmt;

use exchange_rates::LookupError;

use crate::ports::SourceError;

/// Domain-level errors (data-quality and business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Natural key collision: {key} appears more than once in one snapshot")]
    KeyCollision { key: String },

    #[error("Currency code not found: {0}")]
    UnknownCurrency(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Apply phase of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Delete,
    Insert,
    Update,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Delete => write!(f, "delete"),
            SyncPhase::Insert => write!(f, "insert"),
            SyncPhase::Update => write!(f, "update"),
        }
    }
}

/// Errors aborting a reconciliation run.
///
/// Phases applied before the failure are not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Source failed: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Loading stored {entity} failed: {source}")]
    Snapshot {
        entity: &'static str,
        source: RepoError,
    },

    #[error("{phase} of {entity} failed on {target}: {source}")]
    Persistence {
        entity: &'static str,
        phase: SyncPhase,
        target: String,
        source: RepoError,
    },

    #[error("No currencies found: sync currencies first")]
    NoCurrencies,

    #[error("Source returned no {entity}; refusing to delete all {stored} stored records")]
    ImplausibleWipe { entity: &'static str, stored: usize },
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::Validation(msg)) => AppError::BadRequest(msg),
            RepoError::Domain(e) => AppError::BadRequest(e.to_string()),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::BadRequest(e),
        }
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => AppError::NotFound(err.to_string()),
            LookupError::InvalidRange { .. } => AppError::BadRequest(err.to_string()),
            LookupError::TooStale { .. } | LookupError::InsufficientCoverage { .. } => {
                AppError::Unprocessable(err.to_string())
            }
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Source(SourceError::InvalidRequest(msg)) => AppError::BadRequest(msg),
            SyncError::Source(e) => AppError::Upstream(e.to_string()),
            SyncError::Domain(e) => AppError::Upstream(e.to_string()),
            SyncError::ImplausibleWipe { .. } => AppError::Upstream(err.to_string()),
            SyncError::NoCurrencies => AppError::Unprocessable(err.to_string()),
            SyncError::Snapshot { .. } | SyncError::Persistence { .. } => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
