//! Application-level errors

use std::time::Duration;

use thiserror::Error;

use crate::domain::JobId;

/// Command execution errors: every outcome the mapper can surface.
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// Type or range violation caught at the capability boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("job {0} is not reserved by this session")]
    NotReserved(JobId),

    #[error("no job reserved within {}", pretty_duration(.0))]
    ReserveTimedOut(Duration),

    /// Server refused or could only partially apply the request.
    #[error("server rejected request: {0}")]
    ServerRejected(String),

    /// Mid-operation I/O failure; completion state on the server is unknown.
    #[error("transport error during {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

fn pretty_duration(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
