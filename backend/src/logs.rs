//! Console logging for pipeline runs.
//!
//! Every stage reports through the `log_*` helpers. Entries are printed to
//! stderr and also kept for the current run so they can be included in the
//! JSON run report.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Log level for console display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Render the entry the way it appears on the console.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// Global log sink
pub static LOG_SINK: Lazy<LogSink> = Lazy::new(LogSink::new);

/// Prints log entries and remembers them for the run report
pub struct LogSink {
    history: Mutex<Vec<LogEntry>>,
    quiet: AtomicBool,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            quiet: AtomicBool::new(false),
        }
    }

    /// Print an entry and record it.
    ///
    /// In quiet mode only warnings and errors reach the console; everything
    /// is still recorded.
    pub fn log(&self, entry: LogEntry) {
        let muted = self.quiet.load(Ordering::Relaxed)
            && matches!(entry.level, LogLevel::Info | LogLevel::Success);
        if !muted {
            eprintln!("{}", entry.render());
        }

        if let Ok(mut history) = self.history.lock() {
            history.push(entry);
        }
    }

    /// Silence info and success lines.
    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    /// Number of entries recorded so far, to pass to [`LogSink::since`].
    pub fn mark(&self) -> usize {
        self.history.lock().map(|history| history.len()).unwrap_or(0)
    }

    /// Entries recorded after `mark`.
    pub fn since(&self, mark: usize) -> Vec<LogEntry> {
        self.history
            .lock()
            .map(|history| history.get(mark..).map(<[LogEntry]>::to_vec).unwrap_or_default())
            .unwrap_or_default()
    }

    /// Every entry recorded so far.
    pub fn history(&self) -> Vec<LogEntry> {
        self.since(0)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_SINK.log(LogEntry::info(msg).with_indent(indent));
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LOG_SINK.log(LogEntry::warning(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prefix_and_indent() {
        let entry = LogEntry::warning("column missing").with_indent(1);
        assert_eq!(entry.render(), "      ⚠️ column missing");
    }

    #[test]
    fn test_local_sink_records_entries() {
        let sink = LogSink::new();
        sink.set_quiet(true);
        sink.log(LogEntry::info("loaded"));
        sink.log(LogEntry::error("failed"));

        let mark = sink.mark();
        sink.log(LogEntry::warning("late"));

        let entries = sink.history();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].level, LogLevel::Error);
        assert_eq!(sink.since(mark).len(), 1);
        assert!(sink.since(99).is_empty());
    }

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let json = serde_json::to_value(LogEntry::success("done")).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["indent"], 0);
    }
}
