// Configuration module entry point
// Layers defaults, an optional config file, `.env` and the environment

mod state;
mod types;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use config::{ConfigError, Environment, Map};

use crate::error::StartupError;
use crate::logger;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Config file name without extension, looked up in the working directory
pub const CONFIG_FILE: &str = "getter";
/// Dotenv file consulted for keys missing from the environment
pub const DOTENV_FILE: &str = ".env";
/// Prefix shared by all environment keys (`GETTER_PORT`, `GETTER_LOGGING__LEVEL`, ...)
pub const ENV_PREFIX: &str = "GETTER";

/// Where configuration values are read from
#[derive(Debug, Clone)]
pub struct ConfigSources {
    /// Config file path without extension
    pub config_file: Option<String>,
    pub dotenv_file: Option<PathBuf>,
    /// Variables to use instead of the process environment
    pub environment: Option<Map<String, String>>,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            config_file: Some(CONFIG_FILE.to_string()),
            dotenv_file: Some(PathBuf::from(DOTENV_FILE)),
            environment: None,
        }
    }
}

impl ConfigSources {
    /// No file, no `.env` and an empty environment: built-in defaults only
    pub fn defaults_only() -> Self {
        Self {
            config_file: None,
            dotenv_file: None,
            environment: Some(Map::new()),
        }
    }
}

impl Config {
    /// Load configuration from the working directory and process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&ConfigSources::default())
    }

    /// Load configuration from explicit sources
    ///
    /// Precedence, lowest first: defaults, config file, `.env`, environment.
    pub fn load_from(sources: &ConfigSources) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(ref config_file) = sources.config_file {
            builder = builder.add_source(config::File::with_name(config_file).required(false));
        }
        let dotenv = sources
            .dotenv_file
            .as_deref()
            .map(read_dotenv)
            .unwrap_or_default();

        let settings = builder
            .add_source(environment().source(Some(dotenv)))
            .add_source(environment().source(sources.environment.clone()))
            .set_default("port", ":8080")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.request_log_format", "text")?
            .set_default("performance.read_timeout", 5)?
            .set_default("performance.write_timeout", 10)?
            .set_default("performance.idle_timeout", 60)?
            .set_default("http.server_name", "getter")?
            .set_default("http.record_not_found_status", false)?
            .build()?;

        settings.try_deserialize()
    }

    /// Built-in defaults, ignoring files and the environment
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::load_from(&ConfigSources::defaults_only())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        parse_listen_addr(&self.port)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

/// Read `.env` without touching the process environment.
///
/// A missing file yields nothing. A malformed file is ignored as a whole.
fn read_dotenv(path: &Path) -> Map<String, String> {
    let Ok(entries) = dotenvy::from_path_iter(path) else {
        return Map::new();
    };

    let mut vars = Map::new();
    for entry in entries {
        match entry {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => {
                logger::log_warning(&format!("Ignoring malformed {}: {e}", path.display()));
                return Map::new();
            }
        }
    }
    vars
}

/// Parse a listen address: `:PORT`, `PORT`, `HOST:PORT` or `[V6]:PORT`.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, StartupError> {
    let trimmed = addr.trim();
    let candidate = if let Some(port) = trimmed.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else if trimmed.parse::<u16>().is_ok() {
        format!("0.0.0.0:{trimmed}")
    } else {
        trimmed.to_string()
    };

    let invalid = |reason: String| StartupError::InvalidAddress {
        addr: addr.to_string(),
        reason,
    };

    candidate
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no address resolved".to_string()))
}
