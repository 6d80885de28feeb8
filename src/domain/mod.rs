//! Domain layer: jobs, tubes, command requests and results
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod command;
pub mod entities;
pub mod error;
pub mod result;

pub use command::{
    BuryArgs, CommandRequest, PauseTubeArgs, PutArgs, ReleaseArgs, ReserveArgs,
};
pub use entities::*;
pub use error::DomainError;
pub use result::{CommandResult, FieldValue};
