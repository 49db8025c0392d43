//! Progress records emitted by a load run

use super::WriteMode;
use serde::Serialize;

/// Progress record for one written batch.
#[derive(Clone, Debug, Serialize)]
pub struct BatchProgress {
    /// 1-based batch sequence number.
    pub batch: usize,
    /// Rows written in this batch.
    pub rows: usize,
    /// Destination table name.
    pub table: String,
    /// Mode the batch was written with.
    pub mode: WriteMode,
}

/// Summary of a completed load run: one [`BatchProgress`] per written batch.
#[derive(Clone, Debug, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub batches: Vec<BatchProgress>,
}

impl LoadReport {
    pub(super) fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            batches: Vec::new(),
        }
    }

    /// Number of batches written.
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Total rows written across all batches.
    pub fn total_rows(&self) -> usize {
        self.batches.iter().map(|b| b.rows).sum()
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Done! Loaded {} row(s) into '{}' in {} batch(es)",
            self.total_rows(),
            self.table,
            self.batch_count()
        )
    }
}
