//! Destination-table write capability

use crate::table::RowBatch;
use async_trait::async_trait;
use eyre::Result;
use serde::Serialize;

/// How a batch is written to the destination table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Destroy and recreate the table, deriving its schema from the batch.
    Replace,
    /// Add rows to the existing table, assuming schema compatibility.
    Append,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Append => write!(f, "append"),
        }
    }
}

/// A relational destination the loader can write batches to.
///
/// Implementors provide the existence predicate and the tri-argument write
/// (table, batch, mode). The loader depends on nothing else, so a sink can be
/// faked in tests without a database.
///
/// Each `write_batch` call is the unit of atomicity: the loader never retries
/// or rolls back a batch, it surfaces the error and halts.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Whether the destination table already exists.
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Write one batch to the destination table with the given mode.
    ///
    /// # Errors
    /// Returns an error if the destination rejects the batch.
    async fn write_batch(&self, table: &str, batch: &RowBatch, mode: WriteMode) -> Result<()>;
}

#[async_trait]
impl<T: TableSink + ?Sized> TableSink for &T {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        (**self).table_exists(table).await
    }

    async fn write_batch(&self, table: &str, batch: &RowBatch, mode: WriteMode) -> Result<()> {
        (**self).write_batch(table, batch, mode).await
    }
}
