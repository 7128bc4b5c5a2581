//! DailyFileSink - append-only daily store on disk
//!
//! One payload per line, no envelope. Every write is followed by a data
//! sync; a reset truncates the file to zero length.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use contracts::{ContractError, DataSink, Item};
use tracing::{debug, info, instrument};

use crate::error::DispatcherError;

/// Record separator
const SEPARATOR: u8 = b'\n';

/// Sink appending events to a single file
pub struct DailyFileSink {
    name: String,
    path: PathBuf,
    file: File,
}

impl DailyFileSink {
    /// Open (or create) the store file in append mode
    ///
    /// The parent directory is created if missing. Existing content is kept.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DispatcherError> {
        let path = path.into();
        let name = format!("daily:{}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| DispatcherError::sink_creation(&name, e.to_string()))?;
        }

        // Append mode keeps writes at the end after a truncate
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| DispatcherError::sink_creation(&name, e.to_string()))?;

        info!(sink = %name, "daily store opened");
        Ok(Self { name, path, file })
    }

    /// Store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&mut self, payload: &str) -> std::io::Result<()> {
        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload.as_bytes());
        line.push(SEPARATOR);

        // Single write so a failed record never leaves a partial prefix buffered
        self.file.write_all(&line)?;
        self.file.flush()?;
        self.file.sync_data()
    }
}

impl DataSink for DailyFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "daily_sink_write",
        skip(self, item),
        fields(sink = %self.name, len = item.len())
    )]
    async fn write(&mut self, item: &Item) -> Result<(), ContractError> {
        self.append_line(item.payload())
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "daily_sink_reset", skip(self), fields(sink = %self.name))]
    async fn reset(&mut self) -> Result<(), ContractError> {
        self.file
            .set_len(0)
            .and_then(|_| self.file.sync_all())
            .map_err(|e| ContractError::sink_reset(&self.name, e.to_string()))?;
        debug!(sink = %self.name, "daily store truncated");
        Ok(())
    }

    #[instrument(name = "daily_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.file
            .flush()
            .and_then(|_| self.file.sync_all())
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "daily_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        info!(sink = %self.name, "daily store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Command;
    use tempfile::tempdir;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_append_one_record_per_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daily.json");
        let mut sink = DailyFileSink::open(&path).unwrap();

        sink.write(&Item::new(r#"{"a":1}"#)).await.unwrap();
        sink.write(&Item::new(r#"{"b":2}"#)).await.unwrap();

        assert_eq!(read(&path), "{\"a\":1}\n{\"b\":2}\n");
    }

    #[tokio::test]
    async fn test_reset_truncates_and_keeps_appending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daily.json");
        let mut sink = DailyFileSink::open(&path).unwrap();

        sink.write(&Item::new("E1")).await.unwrap();
        sink.write(&Item::new("E2")).await.unwrap();
        sink.reset().await.unwrap();
        assert_eq!(read(&path), "");

        sink.write(&Item::new("E3")).await.unwrap();
        assert_eq!(read(&path), "E3\n");
    }

    #[tokio::test]
    async fn test_open_keeps_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daily.json");
        std::fs::write(&path, "old\n").unwrap();

        let mut sink = DailyFileSink::open(&path).unwrap();
        sink.write(&Item::new("new")).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(read(&path), "old\nnew\n");
    }

    #[tokio::test]
    async fn test_open_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build").join("daily.json");
        let sink = DailyFileSink::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(sink.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_write_does_not_filter() {
        // Filtering happens in the store worker, not the sink
        let dir = tempdir().unwrap();
        let path = dir.path().join("daily.json");
        let mut sink = DailyFileSink::open(&path).unwrap();

        sink.write(&Item::command(Command::flush())).await.unwrap();
        assert_eq!(read(&path), "{\"command\":\"flush\"}\n");
    }

    #[test]
    fn test_open_fails_on_directory() {
        let dir = tempdir().unwrap();
        let result = DailyFileSink::open(dir.path());
        assert!(matches!(result, Err(DispatcherError::SinkCreation { .. })));
    }
}
