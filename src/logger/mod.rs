//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Leveled `key=value` lines for lifecycle events and errors
//! - Request logging with multiple formats
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{format_line, RequestLogEntry};

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::Local;

use crate::config::Config;
use crate::error::RequestError;

/// Log severity, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    /// Parse a configured level name, falling back to `Info`
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    MIN_LEVEL.store(Level::parse(&config.logging.level) as u8, Ordering::Relaxed);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: Level) -> bool {
    level as u8 >= MIN_LEVEL.load(Ordering::Relaxed)
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn log(level: Level, msg: &str, fields: &[(&str, &str)]) {
    if !enabled(level) {
        return;
    }
    let line = format_line(Local::now(), level.as_str(), msg, fields);
    if level >= Level::Warn {
        write_error(&line);
    } else {
        write_info(&line);
    }
}

pub fn log_debug(message: &str) {
    log(Level::Debug, message, &[]);
}

pub fn log_warning(message: &str) {
    log(Level::Warn, message, &[]);
}

pub fn log_error(message: &str) {
    log(Level::Error, message, &[]);
}

pub fn log_server_start(addr: &SocketAddr, data_root: &Path, config: &Config) {
    let data_path = data_root.display().to_string();
    let listen = addr.to_string();
    log(
        Level::Info,
        "Initialized application",
        &[
            ("dataPath", data_path.as_str()),
            ("port", config.port.as_str()),
            ("addr", listen.as_str()),
        ],
    );
    if let Some(workers) = config.server.workers {
        let workers = workers.to_string();
        log(Level::Debug, "worker threads", &[("workers", workers.as_str())]);
    }
    if let Some(ref path) = config.logging.access_log_file {
        log(Level::Debug, "access log file", &[("path", path.as_str())]);
    }
    if let Some(ref path) = config.logging.error_log_file {
        log(Level::Debug, "error log file", &[("path", path.as_str())]);
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    let peer = peer_addr.to_string();
    log(Level::Debug, "connection accepted", &[("peer", peer.as_str())]);
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    let error = err.to_string();
    log(
        Level::Error,
        "failed to serve connection",
        &[("error", error.as_str())],
    );
}

/// Log a received request in the configured format
pub fn log_request(entry: &RequestLogEntry, format: &str) {
    if enabled(Level::Info) {
        write_info(&entry.format(format));
    }
}

/// Log a failed request with its full context
pub fn log_request_error(method: &str, uri: &str, err: &RequestError) {
    let detail = err.to_string();
    log(
        Level::Error,
        &detail,
        &[("method", method), ("uri", uri), ("kind", err.kind())],
    );
}

/// Route panics through the error log with their location and a backtrace
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        let location = info
            .location()
            .map(ToString::to_string)
            .unwrap_or_default();
        let trace = std::backtrace::Backtrace::force_capture().to_string();
        log(
            Level::Error,
            "panic recovered",
            &[
                ("panic", message.as_str()),
                ("location", location.as_str()),
                ("trace", trace.as_str()),
            ],
        );
    }));
}

pub fn log_shutdown(reason: &str) {
    log(Level::Info, "shutting down", &[("reason", reason)]);
}
