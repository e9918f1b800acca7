//! Injected logging for upload and body construction.
//!
//! Nothing in this crate logs through global state. Components that emit
//! observations take a [`SharedSink`] through their configuration and default
//! to [`NoopSink`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use netkit_core::logging::{MemorySink, LogLevel};
//! use netkit_core::{UploadConfig, UploadFile};
//!
//! let sink = Arc::new(MemorySink::new());
//! let config = UploadConfig::new().sink(sink.clone());
//! let file = UploadFile::from_bytes_with_config("file", "big.bin", vec![0; 11 << 20], &config)?;
//! assert_eq!(sink.entries_at(LogLevel::Warn).len(), 1);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Log target used by entries emitted from this crate.
pub const LOG_TARGET: &str = "netkit::multipart";

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very fine-grained tracing.
    Trace,
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something worth attention that does not change behavior.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Returns the lowercase name of the level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    fn to_log_level(self) -> log::Level {
        match self {
            Self::Trace => log::Level::Trace,
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Emitting component.
    pub target: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Structured key/value fields, in insertion order.
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Create an entry with the crate's default target.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            target: LOG_TARGET,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Attach a structured field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Look up a field value by key.
    #[must_use]
    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the entry as a single-line JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Destination for log entries.
pub trait LogSink: Send + Sync {
    /// Record an entry.
    fn log(&self, entry: LogEntry);

    /// Returns true when entries at `level` would be recorded.
    ///
    /// Callers use this to skip building expensive messages.
    fn enabled(&self, level: LogLevel) -> bool {
        let _ = level;
        true
    }
}

/// Shared handle to a sink, as carried by configuration types.
pub type SharedSink = Arc<dyn LogSink>;

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _entry: LogEntry) {}

    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// Returns the default (discarding) sink.
#[must_use]
pub fn noop_sink() -> SharedSink {
    Arc::new(NoopSink)
}

/// Sink that keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Snapshot of entries recorded at exactly `level`.
    #[must_use]
    pub fn entries_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all recorded entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }
}

/// Sink that forwards entries to the [`log`] facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log(&self, entry: LogEntry) {
        let level = entry.level.to_log_level();
        if entry.fields.is_empty() {
            log::log!(target: entry.target, level, "{}", entry.message);
        } else {
            let fields = entry
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            log::log!(target: entry.target, level, "{} {fields}", entry.message);
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        log::log_enabled!(target: LOG_TARGET, level.to_log_level())
    }
}

/// Format a byte count for humans using decimal units.
///
/// ```ignore
/// assert_eq!(format_size(512), "512 bytes");
/// assert_eq!(format_size(1_500), "1.5 KB");
/// assert_eq!(format_size(10_485_760), "10.5 MB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < 1000 {
        return if bytes == 1 {
            "1 byte".to_string()
        } else {
            format!("{bytes} bytes")
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let rendered = format!("{value:.1}");
    let rendered = rendered.strip_suffix(".0").unwrap_or(&rendered);
    format!("{rendered} {}", UNITS[unit])
}
