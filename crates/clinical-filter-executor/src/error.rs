//! Error types for filter execution.

use std::time::Duration;

use clinical_filter::FilterError;
use thiserror::Error;

/// Failure of a single document index query.
///
/// Recovered at the predicate strategy boundary: a failed query counts as
/// "no matches" for its token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The index could not be reached.
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// The query did not complete in time.
    #[error("query timeout after {0:?}")]
    Timeout(Duration),

    /// The index rejected the query.
    #[error("malformed query: {0}")]
    Malformed(String),

    /// The index answered with something that is not a hit list.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Failure while translating identifiers or loading patient records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No identifiers were given, or none resolved.
    #[error("no matching records found")]
    NotFound,

    /// The backing index failed.
    #[error("resolver query failed: {0}")]
    Query(#[from] QueryError),
}

/// Errors surfaced by the composer and the patient search pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// The selection was null, absent, or malformed.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Filter configuration error.
    #[error("filter configuration error: {0}")]
    Filter(FilterError),

    /// Identifier resolution failed.
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

impl From<FilterError> for ExecutorError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidSelection(reason) => ExecutorError::InvalidSelection(reason),
            other => ExecutorError::Filter(other),
        }
    }
}

/// Result type for executor operations.
pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;
