//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent argument values that can never form a valid request.
/// These are independent of the queue server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid tube name {name:?}: {reason}")]
    InvalidTubeName { name: String, reason: String },

    #[error("invalid job state: {0}")]
    InvalidJobState(String),
}
