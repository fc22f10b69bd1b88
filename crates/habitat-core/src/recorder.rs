//! Recording of per-agent snapshot rows.
//!
//! The tick driver collects the facts each agent reports during its update
//! and, on recorded frames, turns them into one [`SnapshotRow`] per surviving
//! agent. A [`Recorder`] receives those rows. [`MemoryRecorder`] keeps them
//! for the run report and exports them as JSON lines, one row per line,
//! tagged with the run id.

use std::io::{BufRead, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use habitat_types::{RunId, SnapshotRow};
use serde::Serialize;
use tracing::info;

/// Errors raised while exporting or importing recorded rows.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// Reading or writing failed.
    #[error("recorder I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A row could not be encoded or decoded.
    #[error("recorder JSON failed on line {line}: {source}")]
    Json {
        /// One-based line number.
        line: usize,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Sink for recorded rows.
pub trait Recorder {
    /// Accept one row.
    fn record(&mut self, row: SnapshotRow);
}

/// Discards every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record(&mut self, _row: SnapshotRow) {}
}

/// Keeps every row in memory.
#[derive(Debug, Clone)]
pub struct MemoryRecorder {
    run_id: RunId,
    started_at: DateTime<Utc>,
    rows: Vec<SnapshotRow>,
}

#[derive(Serialize)]
struct ExportLine<'a> {
    run_id: RunId,
    #[serde(flatten)]
    row: &'a SnapshotRow,
}

impl MemoryRecorder {
    /// An empty recorder for a new run.
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            started_at: Utc::now(),
            rows: Vec::new(),
        }
    }

    /// The run these rows belong to.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// When the recorder was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Recorded rows, in recording order.
    pub fn rows(&self) -> &[SnapshotRow] {
        &self.rows
    }

    /// Number of recorded rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write every row as one JSON object per line.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError`] if encoding or writing fails.
    pub fn write_jsonl(&self, mut writer: impl Write) -> Result<(), RecorderError> {
        for (index, row) in self.rows.iter().enumerate() {
            let line = ExportLine {
                run_id: self.run_id,
                row,
            };
            serde_json::to_writer(&mut writer, &line).map_err(|source| RecorderError::Json {
                line: index.saturating_add(1),
                source,
            })?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write every row to a JSON lines file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError`] if the file cannot be created or written.
    pub fn save_jsonl(&self, path: &Path) -> Result<(), RecorderError> {
        let file = std::fs::File::create(path)?;
        self.write_jsonl(std::io::BufWriter::new(file))?;
        info!(
            run_id = %self.run_id,
            rows = self.rows.len(),
            path = %path.display(),
            "Snapshot rows exported"
        );
        Ok(())
    }
}

impl Default for MemoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for MemoryRecorder {
    fn record(&mut self, row: SnapshotRow) {
        self.rows.push(row);
    }
}

/// Read rows written by [`MemoryRecorder::write_jsonl`]. Blank lines are
/// skipped; the run id column is ignored.
///
/// # Errors
///
/// Returns [`RecorderError`] on the first unreadable or malformed line.
pub fn read_jsonl(reader: impl BufRead) -> Result<Vec<SnapshotRow>, RecorderError> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|source| RecorderError::Json {
            line: index.saturating_add(1),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}
