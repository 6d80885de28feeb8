//! Application services
//!
//! The dispatcher routes each request through its preconditions to one
//! mapper handler.

pub mod dispatcher;
pub mod mapper;
pub mod preconditions;

pub use dispatcher::dispatch;
pub use mapper::CommandMapper;
