//! Error conversion helpers for queue client calls
//!
//! Provides an extension trait that classifies client errors with the
//! subject of the failed operation.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::{ClientError, ClientResult};

/// Extension trait for converting `ClientResult` to `ApplicationResult`.
pub trait ClientResultExt<T> {
    /// Classify a client error; `subject` names what was acted on.
    ///
    /// # Example
    /// ```ignore
    /// client.delete(id).classify(&format!("job {id}"))?;
    /// ```
    fn classify(self, subject: &str) -> ApplicationResult<T>;
}

impl<T> ClientResultExt<T> for ClientResult<T> {
    fn classify(self, subject: &str) -> ApplicationResult<T> {
        self.map_err(|e| classify_error(e, subject))
    }
}

/// Map one client error into the application taxonomy.
pub fn classify_error(err: ClientError, subject: &str) -> ApplicationError {
    match err {
        ClientError::NotFound => ApplicationError::NotFound(subject.to_string()),
        ClientError::BadFormat | ClientError::JobTooBig | ClientError::ExpectedCrlf => {
            ApplicationError::InvalidArgument(format!("{subject}: {err}"))
        }
        ClientError::Buried(_)
        | ClientError::TimedOut
        | ClientError::DeadlineSoon
        | ClientError::Draining
        | ClientError::OutOfMemory
        | ClientError::InternalError
        | ClientError::UnknownCommand => {
            ApplicationError::ServerRejected(format!("{subject}: {err}"))
        }
        ClientError::Protocol(msg) => ApplicationError::Transport {
            context: subject.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidData, msg),
        },
        ClientError::Io(source) => ApplicationError::Transport {
            context: subject.to_string(),
            source,
        },
    }
}
