//! Log writer module
//!
//! Provides thread-safe log writing to files or stdout/stderr.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Set once a file write has failed and been reported
static WRITE_FAILED: AtomicBool = AtomicBool::new(false);

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to file
    File(Mutex<File>),
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Access log target (request lines and info messages)
    access: LogTarget,
    /// Error log target (warnings and errors)
    error: LogTarget,
}

impl LogWriter {
    /// Create a new log writer with optional file paths
    fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        let access = match access_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stdout,
        };

        let error = match error_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stderr,
        };

        Ok(Self { access, error })
    }

    /// Write to access log
    pub fn write_access(&self, message: &str) {
        write_to_target(&self.access, message);
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        write_to_target(&self.error, message);
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Write message to log target
///
/// The first failed file write is reported on stderr; later failures are
/// dropped so a full disk does not flood the terminal.
fn write_to_target(target: &LogTarget, message: &str) {
    if let Err(e) = write_line(target, message) {
        if !WRITE_FAILED.swap(true, Ordering::Relaxed) {
            eprintln!("Failed to write log file, further write errors are suppressed: {e}");
        }
    }
}

fn write_line(target: &LogTarget, message: &str) -> io::Result<()> {
    match target {
        LogTarget::Stdout => {
            println!("{message}");
            Ok(())
        }
        LogTarget::Stderr => {
            eprintln!("{message}");
            Ok(())
        }
        LogTarget::File(file) => {
            let mut f = file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?;
            writeln!(f, "{message}")
        }
    }
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if `init()` has been called
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_targets_append() {
        let dir = TempDir::new().unwrap();
        let access = dir.path().join("logs").join("access.log");
        let error = dir.path().join("error.log");
        let writer = LogWriter::new(access.to_str(), error.to_str()).unwrap();

        writer.write_access("first");
        writer.write_access("second");
        writer.write_error("boom");

        assert_eq!(std::fs::read_to_string(&access).unwrap(), "first\nsecond\n");
        assert_eq!(std::fs::read_to_string(&error).unwrap(), "boom\n");
    }

    #[test]
    fn test_failed_file_write_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("readonly.log");
        std::fs::write(&path, "").unwrap();
        // Opened without write access, so every write fails
        let target = LogTarget::File(Mutex::new(File::open(&path).unwrap()));

        assert!(write_line(&target, "lost").is_err());
        write_to_target(&target, "lost");
        assert!(WRITE_FAILED.load(Ordering::Relaxed));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
