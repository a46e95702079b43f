//! Model Layer Error Types
//!
//! Numeric degeneracies (empty windows, zero durations) are never errors;
//! analytics functions return documented fallback values instead.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for strata-model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Model layer errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A sample arrived with a timestamp earlier than the last one observed
    #[error("Sample at {incoming} is older than last seen {last_seen}")]
    OutOfOrder {
        last_seen: DateTime<Utc>,
        incoming: DateTime<Utc>,
    },

    /// A sample arrived with the same timestamp as the last one observed
    #[error("Duplicate sample timestamp: {0}")]
    DuplicateTimestamp(DateTime<Utc>),

    /// Configuration value out of range
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },
}

// Helper methods
impl ModelError {
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
