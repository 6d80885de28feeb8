//! Command mapper: one handler per command
//!
//! Each handler issues exactly one state-changing (or read-only) request and
//! normalizes the reply. Nothing is retried: `put`, `release` and `bury` are
//! not idempotent, so an ambiguous failure goes back to the caller.

use tracing::{info, instrument};

use crate::application::error_ext::classify_error;
use crate::application::{ApplicationError, ApplicationResult, ClientResultExt};
use crate::domain::{
    BuryArgs, CommandResult, FieldValue, Job, JobId, PauseTubeArgs, PutArgs, ReleaseArgs,
    ReserveArgs, TubeName,
};
use crate::infrastructure::traits::{ClientError, QueueClient};

/// Handlers for every command, bound to one session.
///
/// Preconditions (tube selection, reservation confirmation) are the
/// dispatcher's job; handlers assume they hold.
pub struct CommandMapper<'c> {
    client: &'c mut dyn QueueClient,
}

fn tube_label(tube: Option<&TubeName>) -> String {
    match tube {
        Some(t) => format!("tube {t}"),
        None => "current tube".to_string(),
    }
}

impl<'c> CommandMapper<'c> {
    pub fn new(client: &'c mut dyn QueueClient) -> Self {
        Self { client }
    }

    /// Create a job in the selected tube: ready, or delayed when `delay > 0`.
    #[instrument(skip(self, args), fields(tube = ?args.tube, priority = %args.priority))]
    pub fn put(&mut self, args: &PutArgs) -> ApplicationResult<CommandResult> {
        let id = self
            .client
            .put(&args.body, args.priority, args.delay, args.ttr)
            .classify("put")?;
        info!("inserted job {}", id);
        Ok(CommandResult::id(id))
    }

    /// Block (or wait up to the timeout) for the next ready job.
    #[instrument(skip(self))]
    pub fn reserve(&mut self, args: &ReserveArgs) -> ApplicationResult<CommandResult> {
        match self.client.reserve(args.timeout) {
            Ok(job) => Ok(CommandResult::job(&job)),
            Err(ClientError::TimedOut) => Err(ApplicationError::ReserveTimedOut(
                args.timeout.unwrap_or_default(),
            )),
            Err(e) => Err(classify_error(e, "reserve")),
        }
    }

    #[instrument(skip(self))]
    pub fn reserve_by_id(&mut self, id: JobId) -> ApplicationResult<CommandResult> {
        let job = self.client.reserve_job(id).classify(&format!("job {id}"))?;
        Ok(CommandResult::body(&job))
    }

    #[instrument(skip(self))]
    pub fn peek(&mut self, id: JobId) -> ApplicationResult<CommandResult> {
        let job = self.client.peek(id).classify(&format!("job {id}"))?;
        Ok(CommandResult::job(&job))
    }

    pub fn peek_ready(&mut self, tube: Option<&TubeName>) -> ApplicationResult<CommandResult> {
        let job = self
            .client
            .peek_ready()
            .classify(&format!("ready job in {}", tube_label(tube)))?;
        Ok(CommandResult::job(&job))
    }

    pub fn peek_delayed(&mut self, tube: Option<&TubeName>) -> ApplicationResult<CommandResult> {
        let job = self
            .client
            .peek_delayed()
            .classify(&format!("delayed job in {}", tube_label(tube)))?;
        Ok(CommandResult::job(&job))
    }

    pub fn peek_buried(&mut self, tube: Option<&TubeName>) -> ApplicationResult<CommandResult> {
        let job = self
            .client
            .peek_buried()
            .classify(&format!("buried job in {}", tube_label(tube)))?;
        Ok(CommandResult::job(&job))
    }

    /// Reserved → ready (or delayed). `job` comes from reservation confirmation.
    #[instrument(skip(self, job))]
    pub fn release(&mut self, job: Job, args: &ReleaseArgs) -> ApplicationResult<CommandResult> {
        match self.client.release(args.id, args.priority, args.delay) {
            Ok(()) => Ok(CommandResult::job(&job)),
            Err(ClientError::NotFound) => Err(ApplicationError::NotReserved(args.id)),
            Err(e) => Err(classify_error(e, &format!("release job {}", args.id))),
        }
    }

    /// Reserved → buried. `job` comes from reservation confirmation.
    #[instrument(skip(self, job))]
    pub fn bury(&mut self, job: Job, args: &BuryArgs) -> ApplicationResult<CommandResult> {
        match self.client.bury(args.id, args.priority) {
            Ok(()) => Ok(CommandResult::job(&job)),
            Err(ClientError::NotFound) => Err(ApplicationError::NotReserved(args.id)),
            Err(e) => Err(classify_error(e, &format!("bury job {}", args.id))),
        }
    }

    /// Buried or delayed → ready.
    #[instrument(skip(self))]
    pub fn kick(&mut self, id: JobId) -> ApplicationResult<CommandResult> {
        self.client
            .kick_job(id)
            .classify(&format!("buried or delayed job {id}"))?;
        Ok(CommandResult::Unit)
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: JobId) -> ApplicationResult<CommandResult> {
        self.client.delete(id).classify(&format!("job {id}"))?;
        Ok(CommandResult::Unit)
    }

    /// Extend the TTR of a job this session holds.
    #[instrument(skip(self))]
    pub fn touch(&mut self, id: JobId) -> ApplicationResult<CommandResult> {
        match self.client.touch(id) {
            Ok(()) => Ok(CommandResult::Unit),
            Err(ClientError::NotFound) => Err(ApplicationError::NotReserved(id)),
            Err(e) => Err(classify_error(e, &format!("touch job {id}"))),
        }
    }

    #[instrument(skip(self))]
    pub fn pause_tube(&mut self, args: &PauseTubeArgs) -> ApplicationResult<CommandResult> {
        self.client
            .pause_tube(&args.tube, args.delay)
            .classify(&format!("tube {}", args.tube))?;
        Ok(CommandResult::Unit)
    }

    pub fn stats(&mut self) -> ApplicationResult<CommandResult> {
        let stats = self.client.stats().classify("stats")?;
        Ok(CommandResult::stats(stats))
    }

    pub fn stats_job(&mut self, id: JobId) -> ApplicationResult<CommandResult> {
        let stats = self.client.stats_job(id).classify(&format!("job {id}"))?;
        Ok(CommandResult::stats(stats))
    }

    pub fn stats_tube(&mut self, tube: &TubeName) -> ApplicationResult<CommandResult> {
        let stats = self
            .client
            .stats_tube(tube)
            .classify(&format!("tube {tube}"))?;
        Ok(CommandResult::stats(stats))
    }

    pub fn list_tubes(&mut self) -> ApplicationResult<CommandResult> {
        let tubes = self.client.list_tubes().classify("list-tubes")?;
        Ok(CommandResult::from_pairs([("tubes", FieldValue::List(tubes))]))
    }
}
