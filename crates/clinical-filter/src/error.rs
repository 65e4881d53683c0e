//! Error types for filter selections and field maps.

use thiserror::Error;

use crate::Category;

/// Errors that can occur while building filter configuration or decoding
/// a selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The selection was null, absent, or not shaped as `{key: [values]}`.
    #[error("invalid filter selection: {0}")]
    InvalidSelection(String),

    /// A category field map violates its construction invariants.
    #[error("invalid field map for {category}: {reason}")]
    InvalidFieldMap {
        /// Category the map belongs to.
        category: Category,
        /// Description of the violated invariant.
        reason: String,
    },
}

impl FilterError {
    /// Creates an invalid field map error.
    pub fn invalid_field_map(category: Category, reason: impl Into<String>) -> Self {
        Self::InvalidFieldMap {
            category,
            reason: reason.into(),
        }
    }
}

/// Result type for filter model operations.
pub type FilterResult<T> = std::result::Result<T, FilterError>;
