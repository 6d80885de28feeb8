//! Application layer: command mapping and dispatch
//!
//! This layer orchestrates domain requests against the queue client capability.

pub mod error;
pub mod error_ext;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::ClientResultExt;
