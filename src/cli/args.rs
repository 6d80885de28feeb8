//! CLI argument definitions using clap

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::OutputFormat;

/// Operator client for beanstalkd: put, reserve, peek, bury, kick and inspect jobs
#[derive(Parser, Debug)]
#[command(name = "tubectl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug output (repeat for more: -d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Connect address: tcp://host:port or unix://path [default: tcp://127.0.0.1:11300]
    #[arg(short = 'c', long, global = true)]
    pub address: Option<String>,

    /// Output format [default: text]
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Parse a duration: humantime (`5s`, `1m30s`, `250ms`) or bare seconds (`5`).
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|e| format!("invalid duration {raw:?}: {e}"))
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bury a job
    Bury {
        /// Job ID
        job: u64,
        /// Job priority
        #[arg(short, long, default_value_t = 0)]
        priority: u32,
    },

    /// Delete a job
    Delete {
        /// Job ID
        job: u64,
    },

    /// Kick a buried or delayed job
    Kick {
        /// Job ID
        job: u64,
    },

    /// List tubes
    #[command(name = "list-tubes")]
    ListTubes,

    /// Peek a job
    Peek {
        /// Job ID
        job: u64,
    },

    /// Peek the next ready job
    #[command(name = "peek-ready")]
    PeekReady {
        /// Tube name
        tube: Option<String>,
    },

    /// Peek the next delayed job
    #[command(name = "peek-delayed")]
    PeekDelayed {
        /// Tube name
        tube: Option<String>,
    },

    /// Peek the next buried job
    #[command(name = "peek-buried")]
    PeekBuried {
        /// Tube name
        tube: Option<String>,
    },

    /// Put a job
    Put {
        /// Job body
        body: String,
        /// Job priority
        #[arg(short, long, default_value_t = 0)]
        priority: u32,
        /// Tube name
        #[arg(short = 'b', long)]
        tube: Option<String>,
        /// Job delay
        #[arg(short = 'l', long, value_parser = parse_duration, default_value = "0")]
        delay: Duration,
        /// Job time-to-run
        #[arg(short = 'r', long, value_parser = parse_duration, default_value = "0")]
        ttr: Duration,
    },

    /// Release a job
    Release {
        /// Job ID
        job: u64,
        /// Job priority
        #[arg(short, long, default_value_t = 0)]
        priority: u32,
        /// Job delay
        #[arg(short = 'l', long, value_parser = parse_duration, default_value = "0")]
        delay: Duration,
    },

    /// Reserve a job
    Reserve {
        /// Tube name(s), comma separated
        #[arg(short = 'b', long)]
        tube: Option<String>,
        /// Reserve timeout (0 blocks until a job arrives)
        #[arg(short, long, value_parser = parse_duration, default_value = "0")]
        timeout: Duration,
    },

    /// Reserve a specific job
    #[command(name = "reserve-by-id", alias = "reserve-job")]
    ReserveById {
        /// Job ID
        job: u64,
    },

    /// Get server stats
    Stats,

    /// Get job stats
    #[command(name = "stats-job")]
    StatsJob {
        /// Job ID
        job: u64,
    },

    /// Get tube stats
    #[command(name = "stats-tube")]
    StatsTube {
        /// Tube name
        tube: String,
    },

    /// Pause a tube
    #[command(name = "pause-tube")]
    PauseTube {
        /// Tube name
        tube: String,
        /// Pause duration
        #[arg(short = 'l', long, value_parser = parse_duration, default_value = "0")]
        delay: Duration,
    },

    /// Touch a job
    Touch {
        /// Job ID
        job: u64,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create global config template
    Init,

    /// Show config paths
    Path,
}
