//! Infrastructure layer: queue client, connection provider and DI container
//!
//! This layer implements the queue client capability and wires up the session.

pub mod beanstalk;
pub mod connection;
pub mod di;
pub mod error;
pub mod traits;

pub use error::{InfraError, InfraResult};
