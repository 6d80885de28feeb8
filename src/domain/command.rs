//! Command requests: one closed variant per supported command

use std::time::Duration;

use crate::domain::{JobId, Priority, TubeName, TubeSelector};

/// Arguments of `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutArgs {
    pub body: Vec<u8>,
    /// `None` keeps the session's current tube.
    pub tube: Option<TubeName>,
    pub priority: Priority,
    pub delay: Duration,
    pub ttr: Duration,
}

/// Arguments of `reserve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveArgs {
    pub tubes: TubeSelector,
    /// `None` blocks until a job arrives.
    pub timeout: Option<Duration>,
}

/// Arguments of `release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArgs {
    pub id: JobId,
    pub priority: Priority,
    pub delay: Duration,
}

/// Arguments of `bury`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuryArgs {
    pub id: JobId,
    pub priority: Priority,
}

/// Arguments of `pause-tube`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseTubeArgs {
    pub tube: TubeName,
    pub delay: Duration,
}

/// One CLI invocation, already validated.
///
/// Produced only by the CLI layer and consumed exactly once by
/// [`dispatch`](crate::application::services::dispatcher::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    Put(PutArgs),
    Reserve(ReserveArgs),
    ReserveById { id: JobId },
    Peek { id: JobId },
    PeekReady { tube: Option<TubeName> },
    PeekDelayed { tube: Option<TubeName> },
    PeekBuried { tube: Option<TubeName> },
    Release(ReleaseArgs),
    Bury(BuryArgs),
    Kick { id: JobId },
    Delete { id: JobId },
    Touch { id: JobId },
    PauseTube(PauseTubeArgs),
    Stats,
    StatsJob { id: JobId },
    StatsTube { tube: TubeName },
    ListTubes,
}

impl CommandRequest {
    /// Command name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            CommandRequest::Put(_) => "put",
            CommandRequest::Reserve(_) => "reserve",
            CommandRequest::ReserveById { .. } => "reserve-by-id",
            CommandRequest::Peek { .. } => "peek",
            CommandRequest::PeekReady { .. } => "peek-ready",
            CommandRequest::PeekDelayed { .. } => "peek-delayed",
            CommandRequest::PeekBuried { .. } => "peek-buried",
            CommandRequest::Release(_) => "release",
            CommandRequest::Bury(_) => "bury",
            CommandRequest::Kick { .. } => "kick",
            CommandRequest::Delete { .. } => "delete",
            CommandRequest::Touch { .. } => "touch",
            CommandRequest::PauseTube(_) => "pause-tube",
            CommandRequest::Stats => "stats",
            CommandRequest::StatsJob { .. } => "stats-job",
            CommandRequest::StatsTube { .. } => "stats-tube",
            CommandRequest::ListTubes => "list-tubes",
        }
    }

    /// Whether the command changes server-side state.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            CommandRequest::Peek { .. }
                | CommandRequest::PeekReady { .. }
                | CommandRequest::PeekDelayed { .. }
                | CommandRequest::PeekBuried { .. }
                | CommandRequest::Stats
                | CommandRequest::StatsJob { .. }
                | CommandRequest::StatsTube { .. }
                | CommandRequest::ListTubes
        )
    }
}
