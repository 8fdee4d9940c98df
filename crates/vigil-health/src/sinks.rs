//! Log sink implementations

use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use vigil_core::{LogSink, Result};

/// Writes to standard output.
///
/// Usually registered under the `echo` name so it receives the rich report.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, text: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }
}

/// Writes to standard error
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, text: &str) -> Result<()> {
        let mut err = std::io::stderr().lock();
        writeln!(err, "{text}")?;
        Ok(())
    }
}

/// Appends to a file, creating it when missing
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink appending to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{text}")?;
        Ok(())
    }
}

/// Emits every line of the text as a `tracing` event
#[derive(Debug, Clone)]
pub struct TracingSink {
    name: String,
}

impl TracingSink {
    /// Create a sink tagging its events with `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl LogSink for TracingSink {
    fn write(&self, text: &str) -> Result<()> {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            info!(sink = %self.name, "{}", line.trim_end());
        }
        Ok(())
    }
}

/// Keeps every write in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Most recent write
    pub fn last(&self) -> Option<String> {
        self.entries.lock().last().cloned()
    }
}

impl LogSink for MemorySink {
    fn write(&self, text: &str) -> Result<()> {
        self.entries.lock().push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        assert!(sink.last().is_none());

        sink.write("first").unwrap();
        sink.write("second").unwrap();
        assert_eq!(sink.entries(), vec!["first", "second"]);
        assert_eq!(sink.last().as_deref(), Some("second"));
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.log");
        let sink = FileSink::new(&path);

        sink.write("one").unwrap();
        sink.write("two").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn test_file_sink_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("missing").join("report.log"));
        assert!(sink.write("lost").is_err());
    }

    #[test]
    fn test_tracing_sink_accepts_multiline() {
        let sink = TracingSink::new("audit");
        assert!(sink.write("line one\r\n\r\nline two").is_ok());
    }
}
