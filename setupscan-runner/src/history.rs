//! Signal history as JSONL append-only persistence.
//!
//! One signal per line in its camelCase wire form. Lines are independent,
//! so a torn final write loses at most one signal and never corrupts the
//! rest of the file.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

use setupscan_core::domain::Signal;
use setupscan_core::sink::SignalSink;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSONL signal history file.
///
/// Appends are serialised through a mutex so concurrent scan threads never
/// interleave partial lines.
#[derive(Debug)]
pub struct SignalHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SignalHistory {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Append one signal.
    pub fn append(&self, signal: &Signal) -> Result<(), HistoryError> {
        let json = serde_json::to_string(signal)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    /// Every signal in the file, in write order.
    ///
    /// Malformed lines are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<Signal>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut signals = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Signal>(&line) {
                Ok(signal) => signals.push(signal),
                Err(e) => {
                    warn!(path = %self.path.display(), line = index + 1, error = %e, "skipping malformed history line");
                }
            }
        }

        Ok(signals)
    }

    /// Up to `limit` signals, newest `created_at` first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Signal>, HistoryError> {
        let mut signals = self.read_all()?;
        signals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        signals.truncate(limit);
        Ok(signals)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SignalSink for SignalHistory {
    /// Write failures are logged; the scan pass keeps going.
    fn accept(&self, signal: Signal) {
        if let Err(e) = self.append(&signal) {
            warn!(path = %self.path.display(), signal = %signal.id, error = %e, "failed to persist signal");
        }
    }
}
