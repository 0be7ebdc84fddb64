// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Listen address, `GETTER_PORT` in the environment (e.g. `:8080`)
    pub port: String,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    /// Tokio worker threads (CPU cores when unset)
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level written: debug, info, warn or error
    pub level: String,
    /// Emit a line for every received request
    pub access_log: bool,
    /// Request log format (text, json, or custom pattern)
    pub request_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration, timeouts in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub idle_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of the `Server` response header
    pub server_name: String,
    /// Answer by-ID misses with 404 instead of 200 (body is `{}` either way)
    pub record_not_found_status: bool,
}
