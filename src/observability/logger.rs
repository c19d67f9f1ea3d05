//! Structured JSON logger
//!
//! - Structured logs (JSON), one log line = one event
//! - Deterministic key ordering
//! - Explicit severity levels with a construction-time threshold
//! - Synchronous, no buffering
//!
//! The logger is an explicit handle: subsystems receive a `Logger` value at
//! construction and call it directly. Cloning is cheap; clones share the
//! same output writer and threshold.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Debug = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable failures
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "" | "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!("unrecognized log level: {}", other)),
        }
    }
}

/// A leveled logger that writes one JSON object per event.
///
/// Events below the configured threshold are dropped before any formatting
/// happens. Field keys are sorted alphabetically so identical events always
/// render identically.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    level: Severity,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    /// Creates a logger writing to stdout.
    pub fn new(level: Severity) -> Self {
        Self::with_writer(level, Box::new(io::stdout()))
    }

    /// Creates a logger writing to an arbitrary sink.
    pub fn with_writer(level: Severity, out: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                level,
                out: Mutex::new(out),
            }),
        }
    }

    /// Returns the configured severity threshold.
    pub fn level(&self) -> Severity {
        self.inner.level
    }

    /// Log at DEBUG level
    pub fn debug(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Debug, event, fields);
    }

    /// Log at INFO level
    pub fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }

    /// Log at FATAL level. The logger never terminates the process; the
    /// caller decides what follows a fatal event.
    pub fn fatal(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Fatal, event, fields);
    }

    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity < self.inner.level {
            return;
        }

        let mut output = String::with_capacity(256);

        output.push('{');

        // Fixed prefix: event, severity, timestamp
        output.push_str("\"event\":\"");
        escape_json_string(&mut output, event);
        output.push('"');

        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        output.push_str(",\"ts\":\"");
        output.push_str(&Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        output.push('"');

        // Remaining fields sorted alphabetically
        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            escape_json_string(&mut output, key);
            output.push_str("\":\"");
            escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        let mut out = match self.inner.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = out.write_all(output.as_bytes());
        let _ = out.flush();
    }
}

/// Escape special characters for JSON strings
fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
}
