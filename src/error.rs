//! Error taxonomy
//!
//! Startup errors are fatal to the process. Request errors are isolated to
//! the request that raised them and always surface as a generic 500.

use std::io;
use std::path::PathBuf;

use crate::files::PathError;

/// Errors raised before the server starts accepting connections.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("{0}")]
    Argument(String),

    #[error(transparent)]
    PathResolution(#[from] PathError),

    #[error("The path does not exist or is not a directory: {}", path.display())]
    InvalidDataRoot { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: io::Error,
    },

    #[error("Failed to build runtime: {0}")]
    Runtime(io::Error),

    #[error("Failed to open log files: {0}")]
    Logger(io::Error),

    #[error("Listener failed: {0}")]
    Listener(io::Error),
}

/// Errors raised while serving a single request.
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("failed to read directory {}: {source}", path.display())]
    DirectoryRead { path: PathBuf, source: io::Error },

    #[error("file not found: {name}")]
    FileNotFound { name: String },

    #[error("error reading file {name}: {source}")]
    FileRead { name: String, source: io::Error },

    #[error("invalid JSON in file {name}: {source}")]
    InvalidJson {
        name: String,
        source: serde_json::Error,
    },

    #[error("invalid JSON in file {name}: {reason}")]
    InvalidShape { name: String, reason: String },

    #[error("error encoding response: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("panic: {0}")]
    Panic(String),

    #[error("handler did not finish within {0} seconds")]
    Timeout(u64),
}

impl RequestError {
    /// Taxonomy name used in error log lines.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DirectoryRead { .. } => "DirectoryReadError",
            Self::FileNotFound { .. } => "FileNotFound",
            Self::FileRead { .. } => "FileReadError",
            Self::InvalidJson { .. } | Self::InvalidShape { .. } => "InvalidJSON",
            Self::Encoding(_) => "EncodingError",
            Self::Panic(_) => "Panic",
            Self::Timeout(_) => "Timeout",
        }
    }
}
