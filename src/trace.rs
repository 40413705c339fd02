//! Best-effort diagnostic trace sinks.
//!
//! The labeling engine narrates every decision point into a [`TraceSink`].
//! Sinks are append-only and must never fail the caller: a run that cannot
//! write its diagnostics still labels every email.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

/// Append-only destination for diagnostic trace lines.
///
/// Implementations swallow their own errors; `record` has no way to fail.
pub trait TraceSink {
    /// Record one diagnostic message.
    fn record(&self, message: &str);
}

// ── NoopSink ────────────────────────────────────────────────────────────

/// Sink that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn record(&self, _message: &str) {}
}

// ── FileSink ────────────────────────────────────────────────────────────

/// Append-only file sink writing one `[UTC ISO-8601 timestamp] message`
/// line per record.
///
/// The file is created on first write. All I/O errors are swallowed, with a
/// debug-level note on the tracing subscriber so operators can still find
/// out why the trace file stayed empty.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TraceSink for FileSink {
    fn record(&self, message: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let line = format!("[{timestamp}] {message}\n");
        let result = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = result {
            tracing::debug!("trace write to {} failed: {err}", self.path.display());
        }
    }
}

// ── MemorySink ──────────────────────────────────────────────────────────

/// In-memory sink for tests: captures messages so assertions can inspect
/// the emitted diagnostics without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of all recorded messages, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Whether any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl TraceSink for MemorySink {
    fn record(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_discards() {
        let sink = NoopSink;
        sink.record("anything");
    }

    #[test]
    fn memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.record("first");
        sink.record("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
        assert!(sink.contains("sec"));
        assert!(!sink.contains("third"));
    }

    #[test]
    fn file_sink_appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.txt");
        let sink = FileSink::new(&path);

        sink.record("startup");
        sink.record("email 1 start");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("startup"));
        assert!(lines[1].contains("email 1 start"));
        // Timestamp is UTC ISO-8601.
        assert!(lines[0].contains('T'));
        assert!(lines[0].contains("Z]"));
    }

    #[test]
    fn file_sink_swallows_write_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory path cannot be opened for appending; record must not panic.
        let sink = FileSink::new(dir.path());
        sink.record("into the void");
    }
}
