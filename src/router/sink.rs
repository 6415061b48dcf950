//! Configuration sinks.
//!
//! A sink receives one complete serialized document per reconciliation cycle.
//! Writes may block; the router runs them on the blocking pool and waits, so a
//! slow sink slows the loop down instead of queueing documents.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors returned by a sink write.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("document rejected: {0}")]
    Rejected(String),
}

/// Consumer of serialized configuration documents.
pub trait Sink: Send + Sync + std::fmt::Debug {
    /// Destination identifier, used in logs.
    fn output_filename(&self) -> &str;

    /// Write one complete document. Called repeatedly, from a single worker.
    fn write(&self, document: &[u8]) -> Result<usize, SinkError>;
}

/// Writes each document to a file, replacing it atomically.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    display: String,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        Self { path, display }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Sink for FileSink {
    fn output_filename(&self) -> &str {
        &self.display
    }

    fn write(&self, document: &[u8]) -> Result<usize, SinkError> {
        // Readers never observe a half-written document.
        let tmp = self.temp_path();
        fs::write(&tmp, document)?;
        fs::rename(&tmp, &self.path)?;
        Ok(document.len())
    }
}
