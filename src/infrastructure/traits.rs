//! Queue client capability
//!
//! The command mapper talks to the queue server only through [`QueueClient`],
//! so handlers can be tested against an in-memory fake.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{Job, JobId, Priority, TubeName};

/// Classified failure of a single client operation.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Job or tube does not exist, or is not in a state the operation accepts.
    #[error("not found")]
    NotFound,

    #[error("timed out")]
    TimedOut,

    /// A job reserved by this session is about to exceed its TTR.
    #[error("deadline soon")]
    DeadlineSoon,

    /// The server buried the job instead of inserting or releasing it.
    #[error("job {0} buried by server (out of memory)")]
    Buried(JobId),

    #[error("request rejected as badly formatted")]
    BadFormat,

    #[error("job body exceeds the server's max-job-size")]
    JobTooBig,

    #[error("job body not terminated by CRLF")]
    ExpectedCrlf,

    #[error("server is draining and accepts no new jobs")]
    Draining,

    #[error("server out of memory")]
    OutOfMemory,

    #[error("server internal error")]
    InternalError,

    #[error("server does not know the command")]
    UnknownCommand,

    /// Reply did not match the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for queue client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Operations a queue server session offers.
///
/// A session is single-writer, single-reader: every call runs to completion
/// before the next one is issued.
pub trait QueueClient: Send {
    /// Select the tube subsequent `put` and `peek-*` calls act on.
    fn use_tube(&mut self, tube: &TubeName) -> ClientResult<()>;

    /// Watch exactly the given tubes for `reserve`, ignoring all others.
    fn watch_only(&mut self, tubes: &[TubeName]) -> ClientResult<()>;

    fn put(
        &mut self,
        body: &[u8],
        priority: Priority,
        delay: Duration,
        ttr: Duration,
    ) -> ClientResult<JobId>;

    /// Reserve the next ready job. `None` blocks without limit.
    fn reserve(&mut self, timeout: Option<Duration>) -> ClientResult<Job>;

    /// Reserve one specific job.
    fn reserve_job(&mut self, id: JobId) -> ClientResult<Job>;

    fn peek(&mut self, id: JobId) -> ClientResult<Job>;
    fn peek_ready(&mut self) -> ClientResult<Job>;
    fn peek_delayed(&mut self) -> ClientResult<Job>;
    fn peek_buried(&mut self) -> ClientResult<Job>;

    fn release(&mut self, id: JobId, priority: Priority, delay: Duration) -> ClientResult<()>;
    fn bury(&mut self, id: JobId, priority: Priority) -> ClientResult<()>;
    fn delete(&mut self, id: JobId) -> ClientResult<()>;
    fn touch(&mut self, id: JobId) -> ClientResult<()>;
    fn kick_job(&mut self, id: JobId) -> ClientResult<()>;
    fn pause_tube(&mut self, tube: &TubeName, delay: Duration) -> ClientResult<()>;

    fn list_tubes(&mut self) -> ClientResult<Vec<String>>;
    fn stats(&mut self) -> ClientResult<BTreeMap<String, String>>;
    fn stats_job(&mut self, id: JobId) -> ClientResult<BTreeMap<String, String>>;
    fn stats_tube(&mut self, tube: &TubeName) -> ClientResult<BTreeMap<String, String>>;
}
