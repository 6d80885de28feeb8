//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tubectl/tubectl.toml`
//! 3. Local config: `<dir>/.tubectl.toml` (usually the working directory)
//! 4. Environment variables: `TUBECTL_*` prefix
//! 5. Command line flags (applied by the CLI layer)

use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Default server address.
pub const DEFAULT_ADDRESS: &str = "tcp://127.0.0.1:11300";

/// Result rendering format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApplicationError::Config {
                message: format!("unknown format {other:?}, expected text or json"),
            }),
        }
    }
}

/// Raw settings for intermediate parsing (all optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub address: Option<String>,
    pub format: Option<OutputFormat>,
    pub connect_timeout_secs: Option<u64>,
    pub wrap_width: Option<usize>,
}

/// Unified configuration for tubectl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Server address: `tcp://host:port` or `unix://path`
    pub address: String,
    /// Output format for results
    pub format: OutputFormat,
    /// Connection setup timeout in seconds (0 = system default)
    pub connect_timeout_secs: u64,
    /// Column at which text output wraps values
    pub wrap_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            format: OutputFormat::Text,
            connect_timeout_secs: 5,
            wrap_width: 80,
        }
    }
}

/// Get the XDG config directory for tubectl.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tubectl").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tubectl.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".tubectl.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            address: overlay
                .address
                .clone()
                .unwrap_or_else(|| self.address.clone()),
            format: overlay.format.unwrap_or(self.format),
            connect_timeout_secs: overlay
                .connect_timeout_secs
                .unwrap_or(self.connect_timeout_secs),
            wrap_width: overlay.wrap_width.unwrap_or(self.wrap_width),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.tubectl.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Load defaults plus one explicit file, ignoring global config and env.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        Ok(Self::default().merge_with(&load_raw_settings(path)?))
    }

    /// Apply TUBECTL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TUBECTL").prefix_separator("_"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("address") {
            settings.address = val;
        }
        if let Ok(val) = config.get_string("format") {
            settings.format = val.parse()?;
        }
        if let Ok(val) = config.get_string("connect_timeout_secs") {
            settings.connect_timeout_secs = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("TUBECTL_CONNECT_TIMEOUT_SECS: {e}"),
            })?;
        }
        if let Ok(val) = config.get_string("wrap_width") {
            settings.wrap_width = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("TUBECTL_WRAP_WIDTH: {e}"),
            })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tubectl configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tubectl/tubectl.toml
#   Local:  ./.tubectl.toml
#   Env:    TUBECTL_* environment variables (e.g. TUBECTL_ADDRESS)
#   Flags:  --address, --format

# Server address: tcp://host:port or unix:///path/to/socket
# address = "tcp://127.0.0.1:11300"

# Output format: "text" or "json"
# format = "text"

# Seconds to wait for the connection to be established (0 = system default)
# connect_timeout_secs = 5

# Column at which text output wraps long values
# wrap_width = 80
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
