//! Log line format module
//!
//! Supports multiple request log formats:
//! - `text` (`key=value` pairs, the default)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::{DateTime, Local, SecondsFormat};

/// Request log entry, captured when a request is received
#[derive(Debug, Clone)]
pub struct RequestLogEntry {
    /// Client socket address
    pub remote_addr: String,
    /// Request timestamp
    pub time: DateTime<Local>,
    /// HTTP method (GET, HEAD, ...)
    pub method: String,
    /// Request URI (path and query)
    pub uri: String,
    /// Protocol version, e.g. `HTTP/1.1`
    pub proto: String,
}

impl RequestLogEntry {
    /// Create a new request log entry with current timestamp
    pub fn new(remote_addr: String, method: String, uri: String, proto: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            uri,
            proto,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "text" => self.format_text(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn format_text(&self) -> String {
        format_line(
            self.time,
            "INFO",
            "received request",
            &[
                ("ip", self.remote_addr.as_str()),
                ("proto", self.proto.as_str()),
                ("method", self.method.as_str()),
                ("uri", self.uri.as_str()),
            ],
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        serde_json::json!({
            "time": self.time.to_rfc3339_opts(SecondsFormat::Millis, true),
            "level": "INFO",
            "msg": "received request",
            "ip": self.remote_addr,
            "proto": self.proto,
            "method": self.method,
            "uri": self.uri,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request URI with query string
    /// - `$server_protocol` - Protocol version
    fn format_custom(&self, pattern: &str) -> String {
        pattern
            .replace("$remote_addr", &self.remote_addr)
            .replace(
                "$time_local",
                &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
            )
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.uri)
            .replace("$server_protocol", &self.proto)
    }
}

/// Build a `key=value` log line: `time=… level=… msg=… k=v …`
pub fn format_line(
    time: DateTime<Local>,
    level: &str,
    msg: &str,
    fields: &[(&str, &str)],
) -> String {
    let mut line = format!(
        "time={} level={level} msg={}",
        time.to_rfc3339_opts(SecondsFormat::Millis, true),
        quote_value(msg)
    );
    for (key, value) in fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(&quote_value(value));
    }
    line
}

/// Quote a value when it would otherwise break `key=value` parsing
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control());
    if needs_quotes {
        format!("{value:?}")
    } else {
        value.to_string()
    }
}
