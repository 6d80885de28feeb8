//! tubectl: operator command-line client for beanstalkd work queues
//!
//! Layers, innermost first:
//! - [`domain`]: jobs, tubes, command requests and results
//! - [`application`]: command mapper, preconditions and dispatcher
//! - [`infrastructure`]: queue client capability, beanstalkd protocol, connection
//! - [`cli`]: argument parsing, rendering and exit codes

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
