//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Connection failures (69) are kept apart from rejected commands (1)
    /// so scripts can tell "server unreachable" from "operation refused".
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::InvalidAddress { .. } => crate::exitcode::USAGE,
                InfraError::ConnectionFailed { .. } => crate::exitcode::UNAVAILABLE,
                InfraError::Application(app) => match app {
                    ApplicationError::InvalidArgument(_) => {
                        crate::exitcode::DATAERR
                    }
                    ApplicationError::NotFound(_)
                    | ApplicationError::NotReserved(_)
                    | ApplicationError::ReserveTimedOut(_)
                    | ApplicationError::ServerRejected(_) => crate::exitcode::FAILURE,
                    ApplicationError::Transport { .. } => crate::exitcode::IOERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                },
            },
        }
    }
}
