use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{DetectorError, Result};
use crate::prediction::PredictionResult;

/// Ordered log of single-image predictions, mirrored to a JSON file.
///
/// The file always holds the serialization of `entries` after a successful
/// `append` or `clear`. Writes overwrite the file in place, so a crash in the
/// middle of a write can leave it truncated.
#[derive(Debug)]
pub struct ResultsHistory {
    path: PathBuf,
    entries: Vec<PredictionResult>,
}

/// Counts over the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    pub total: usize,
    pub accidents: usize,
    pub safe: usize,
}

impl ResultsHistory {
    /// Reads the history at `path`. A missing or unreadable file yields an
    /// empty history.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = if path.exists() {
            match read_entries(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "history load failed");
                    println!("Could not load results history: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "history loaded");
        Self { path, entries }
    }

    pub fn entries(&self) -> &[PredictionResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `result` and rewrites the file. The entry stays in memory even
    /// when the write fails.
    pub fn append(&mut self, result: PredictionResult) -> Result<()> {
        self.entries.push(result);
        self.persist()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    /// Writes all entries as a pretty-printed JSON array.
    pub fn persist(&self) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| DetectorError::FileSystem {
            path: self.path.clone(),
            operation: "create history file".to_string(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.entries).map_err(|e| {
            DetectorError::Serialization {
                operation: format!("write {}", self.path.display()),
                source: e,
            }
        })?;
        writer.flush().map_err(|e| DetectorError::FileSystem {
            path: self.path.clone(),
            operation: "flush history file".to_string(),
            source: e,
        })?;
        Ok(())
    }

    pub fn summarize(&self) -> HistorySummary {
        let total = self.entries.len();
        let accidents = self
            .entries
            .iter()
            .filter(|entry| entry.accident_detected)
            .count();
        HistorySummary {
            total,
            accidents,
            safe: total - accidents,
        }
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[PredictionResult] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

fn read_entries(path: &Path) -> Result<Vec<PredictionResult>> {
    let file = File::open(path).map_err(|e| DetectorError::FileSystem {
        path: path.to_path_buf(),
        operation: "open history file".to_string(),
        source: e,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| DetectorError::Serialization {
        operation: format!("read {}", path.display()),
        source: e,
    })
}
