//! JSONL file writer for conversation events.
//!
//! Each [`ConversationEvent`] is serialized as a single JSON line (its
//! `type` tag and fields plus a `timestamp`), appended via a buffered writer.
//! Existing logs are appended to, so one file can hold many conversations.

use multiturn_application::{ConversationEvent, ConversationLogger};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL conversation logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Create a new logger writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist and
    /// appends to it otherwise.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create conversation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not create conversation log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One log line: the tagged event plus a `timestamp` field.
fn to_record(event: &ConversationEvent, timestamp: String) -> serde_json::Result<serde_json::Value> {
    let mut record = serde_json::to_value(event)?;
    if let Some(fields) = record.as_object_mut() {
        fields.insert("timestamp".into(), timestamp.into());
    }
    Ok(record)
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let line = match to_record(&event, timestamp).and_then(|r| serde_json::to_string(&r)) {
            Ok(line) => line,
            Err(e) => {
                warn!("Could not encode {} event: {}", event.kind(), e);
                return;
            }
        };

        // Flushed per line so a crash loses at most the event being written
        if let Ok(mut writer) = self.writer.lock()
            && writeln!(writer, "{}", line).and_then(|_| writer.flush()).is_err()
        {
            warn!("Could not write conversation log {}", self.path.display());
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
