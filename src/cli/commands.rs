//! Command execution: builds the request, opens the session, renders the result

use std::io;
use std::time::Duration;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::render::render;
use crate::cli::{output, CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{
    BuryArgs, CommandRequest, DomainError, JobId, PauseTubeArgs, Priority, PutArgs, ReleaseArgs,
    ReserveArgs, TubeName, TubeSelector,
};
use crate::infrastructure::di::ServiceContainer;

fn invalid(e: DomainError) -> CliError {
    CliError::InvalidArgs(e.to_string())
}

fn optional_tube(raw: &Option<String>) -> CliResult<Option<TubeName>> {
    TubeName::parse_optional(raw.as_deref()).map_err(invalid)
}

/// Translate parsed arguments into a validated request.
///
/// This is the only place a [`CommandRequest`] is built from user text.
pub fn build_request(command: &Commands) -> CliResult<CommandRequest> {
    let request = match command {
        Commands::Bury { job, priority } => CommandRequest::Bury(BuryArgs {
            id: JobId(*job),
            priority: Priority(*priority),
        }),
        Commands::Delete { job } => CommandRequest::Delete { id: JobId(*job) },
        Commands::Kick { job } => CommandRequest::Kick { id: JobId(*job) },
        Commands::ListTubes => CommandRequest::ListTubes,
        Commands::Peek { job } => CommandRequest::Peek { id: JobId(*job) },
        Commands::PeekReady { tube } => CommandRequest::PeekReady {
            tube: optional_tube(tube)?,
        },
        Commands::PeekDelayed { tube } => CommandRequest::PeekDelayed {
            tube: optional_tube(tube)?,
        },
        Commands::PeekBuried { tube } => CommandRequest::PeekBuried {
            tube: optional_tube(tube)?,
        },
        Commands::Put {
            body,
            priority,
            tube,
            delay,
            ttr,
        } => CommandRequest::Put(PutArgs {
            body: body.as_bytes().to_vec(),
            tube: optional_tube(tube)?,
            priority: Priority(*priority),
            delay: *delay,
            ttr: *ttr,
        }),
        Commands::Release {
            job,
            priority,
            delay,
        } => CommandRequest::Release(ReleaseArgs {
            id: JobId(*job),
            priority: Priority(*priority),
            delay: *delay,
        }),
        Commands::Reserve { tube, timeout } => CommandRequest::Reserve(ReserveArgs {
            tubes: TubeSelector::parse(tube.as_deref().unwrap_or_default()).map_err(invalid)?,
            timeout: (*timeout != Duration::ZERO).then_some(*timeout),
        }),
        Commands::ReserveById { job } => CommandRequest::ReserveById { id: JobId(*job) },
        Commands::Stats => CommandRequest::Stats,
        Commands::StatsJob { job } => CommandRequest::StatsJob { id: JobId(*job) },
        Commands::StatsTube { tube } => CommandRequest::StatsTube {
            tube: TubeName::new(tube.as_str()).map_err(invalid)?,
        },
        Commands::PauseTube { tube, delay } => CommandRequest::PauseTube(PauseTubeArgs {
            tube: TubeName::new(tube.as_str()).map_err(invalid)?,
            delay: *delay,
        }),
        Commands::Touch { job } => CommandRequest::Touch { id: JobId(*job) },
        Commands::Config { .. } | Commands::Completion { .. } => {
            return Err(CliError::Usage(
                "config and completion are not queue commands".to_string(),
            ))
        }
    };
    Ok(request)
}

/// Merge settings with the global flags; flags win.
pub fn effective_settings(cli: &Cli, mut settings: Settings) -> Settings {
    if let Some(address) = &cli.address {
        settings.address = address.clone();
    }
    if let Some(format) = cli.format {
        settings.format = format;
    }
    settings
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => execute_config(cli, command),
        command => {
            let request = build_request(command)?;
            let settings = effective_settings(cli, load_settings()?);
            run_queue_command(settings, request)
        }
    }
}

fn load_settings() -> CliResult<Settings> {
    let cwd = std::env::current_dir().ok();
    Ok(Settings::load(cwd.as_deref())?)
}

/// Open the session, run the request, render the result.
///
/// The container (and with it the session) is dropped before returning,
/// on success and on every error path.
#[instrument(skip(settings))]
fn run_queue_command(settings: Settings, request: CommandRequest) -> CliResult<()> {
    let format = settings.format;
    let wrap_width = settings.wrap_width;
    debug!("address: {}", settings.address);

    let mut container = ServiceContainer::connect(settings)?;
    let result = container.execute(request)?;
    drop(container);

    if let Some(rendered) = render(&result, format, wrap_width)? {
        output::info(&rendered);
    }
    Ok(())
}

fn execute_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = effective_settings(cli, load_settings()?);
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory available on this platform"),
            }
            if let Ok(cwd) = std::env::current_dir() {
                output::action("local", &local_config_path(&cwd).display());
            }
        }
        ConfigCommands::Init => {
            let path = global_config_path().ok_or_else(|| {
                CliError::Usage("no config directory available on this platform".to_string())
            })?;
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            let write = || -> io::Result<()> {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, Settings::template())
            };
            write().map_err(|e| {
                CliError::Usage(format!("cannot write {}: {e}", path.display()))
            })?;
            output::action("created", &path.display());
        }
    }
    Ok(())
}
