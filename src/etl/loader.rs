//! Replace/append mode selection and batch sequencing

use super::{BatchProgress, LoadReport, TableSink, WriteMode};
use crate::table::RowBatch;
use eyre::Result;

type ProgressFn = Box<dyn Fn(&BatchProgress) + Send + Sync>;

/// Loads a sequence of row batches into a destination table.
///
/// A source is any `IntoIterator` of batch results: a fully materialized
/// batch is the one-element case, a lazy decoder iterator is the chunked
/// case. Both flow through the same write logic.
///
/// The destination schema is an emergent property of the first write: a
/// replace write derives column types from whatever the first batch contains.
/// Callers with heterogeneous batches must ensure the first batch is
/// representative.
///
/// Failure is fail-fast and partially applied: a write error on batch `k`
/// leaves batches `1..k-1` committed. Re-running from scratch (which replaces
/// the table) is the recovery path, not resuming mid-stream.
pub struct TableLoader<S> {
    sink: S,
    progress: Option<ProgressFn>,
}

impl<S: TableSink> TableLoader<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            progress: None,
        }
    }

    /// Observe each batch's progress record as it is produced.
    pub fn with_progress(mut self, f: impl Fn(&BatchProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Load `source` into `table`, creating the table if it does not exist.
    ///
    /// The existence check runs exactly once, before any batch is written.
    /// If the table is new, the first batch is written with
    /// [`WriteMode::Replace`] and every later batch with
    /// [`WriteMode::Append`]; if it already exists, every batch appends.
    pub async fn load<I>(&self, source: I, table: &str) -> Result<LoadReport>
    where
        I: IntoIterator<Item = Result<RowBatch>>,
    {
        let exists = self.sink.table_exists(table).await?;
        let first_mode = match exists {
            true => WriteMode::Append,
            false => WriteMode::Replace,
        };
        match exists {
            true => log::debug!("Appending to existing table '{}'", table),
            false => log::debug!("Creating new table '{}'", table),
        }
        self.run(source, table, first_mode).await
    }

    /// Rebuild `table` from `source` unconditionally.
    ///
    /// The first batch is written with [`WriteMode::Replace`] without
    /// consulting the existence predicate; later batches append. Used for
    /// reference tables that are refreshed wholesale on every run.
    pub async fn refresh<I>(&self, source: I, table: &str) -> Result<LoadReport>
    where
        I: IntoIterator<Item = Result<RowBatch>>,
    {
        log::debug!("Rebuilding table '{}'", table);
        self.run(source, table, WriteMode::Replace).await
    }

    async fn run<I>(&self, source: I, table: &str, first_mode: WriteMode) -> Result<LoadReport>
    where
        I: IntoIterator<Item = Result<RowBatch>>,
    {
        let mut report = LoadReport::new(table);

        for (index, batch) in source.into_iter().enumerate() {
            let mut batch = batch?;
            batch.normalize_columns();

            let mode = match index {
                0 => first_mode,
                _ => WriteMode::Append,
            };

            log::debug!(
                "Writing batch {} ({} rows) into '{}' [{}]",
                index + 1,
                batch.len(),
                table,
                mode
            );
            self.sink.write_batch(table, &batch, mode).await?;

            let progress = BatchProgress {
                batch: index + 1,
                rows: batch.len(),
                table: table.to_string(),
                mode,
            };
            if let Some(observer) = &self.progress {
                observer(&progress);
            }
            report.batches.push(progress);
        }

        log::debug!("{}", report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use async_trait::async_trait;
    use eyre::eyre;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct WriteCall {
        table: String,
        columns: Vec<String>,
        rows: usize,
        mode: WriteMode,
    }

    struct FakeSink {
        exists: bool,
        exists_calls: AtomicUsize,
        writes: Mutex<Vec<WriteCall>>,
        fail_on_batch: Option<usize>,
    }

    impl FakeSink {
        fn new(exists: bool) -> Self {
            Self {
                exists,
                exists_calls: AtomicUsize::new(0),
                writes: Mutex::new(Vec::new()),
                fail_on_batch: None,
            }
        }

        fn failing_on(exists: bool, batch: usize) -> Self {
            Self {
                fail_on_batch: Some(batch),
                ..Self::new(exists)
            }
        }
    }

    #[async_trait]
    impl TableSink for FakeSink {
        async fn table_exists(&self, _table: &str) -> Result<bool> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.exists)
        }

        async fn write_batch(&self, table: &str, batch: &RowBatch, mode: WriteMode) -> Result<()> {
            let mut writes = self.writes.lock().unwrap();
            writes.push(WriteCall {
                table: table.to_string(),
                columns: batch.columns().to_vec(),
                rows: batch.len(),
                mode,
            });
            if Some(writes.len()) == self.fail_on_batch {
                return Err(eyre!("destination rejected batch {}", writes.len()));
            }
            Ok(())
        }
    }

    fn batch(rows: usize) -> Result<RowBatch> {
        Ok(RowBatch::new(
            vec!["VendorID".into(), "fare_amount".into()],
            (0..rows)
                .map(|i| vec![Value::Int(i as i64), Value::Float(10.0)])
                .collect(),
        ))
    }

    #[tokio::test]
    async fn test_new_table_writes_replace_then_append() {
        let sink = FakeSink::new(false);
        let loader = TableLoader::new(&sink);

        let report = loader
            .load(vec![batch(2), batch(2), batch(1)], "trips")
            .await
            .unwrap();

        let writes = sink.writes.lock().unwrap();
        let modes: Vec<_> = writes.iter().map(|w| w.mode).collect();
        assert_eq!(
            modes,
            vec![WriteMode::Replace, WriteMode::Append, WriteMode::Append]
        );
        assert!(writes.iter().all(|w| w.table == "trips"));
        assert_eq!(report.batch_count(), 3);
        assert_eq!(report.total_rows(), 5);
    }

    #[tokio::test]
    async fn test_existing_table_appends_every_batch() {
        let sink = FakeSink::new(true);
        let loader = TableLoader::new(&sink);

        loader
            .load(vec![batch(1), batch(1), batch(1)], "trips")
            .await
            .unwrap();

        let writes = sink.writes.lock().unwrap();
        assert!(writes.iter().all(|w| w.mode == WriteMode::Append));
        assert_eq!(writes.len(), 3);
    }

    #[tokio::test]
    async fn test_existence_checked_exactly_once() {
        let sink = FakeSink::new(false);
        let loader = TableLoader::new(&sink);

        loader
            .load((0..5).map(|_| batch(1)), "trips")
            .await
            .unwrap();

        assert_eq!(sink.exists_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_progress_record_per_batch() {
        let sink = FakeSink::new(false);
        let seen = std::sync::Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let loader = TableLoader::new(&sink)
            .with_progress(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let report = loader
            .load(vec![batch(1), batch(2), batch(3)], "trips")
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(report.batch_count(), 3);
        assert_eq!(report.batches[0].batch, 1);
        assert_eq!(report.batches[2].batch, 3);
        assert_eq!(report.batches[1].table, "trips");
    }

    #[tokio::test]
    async fn test_write_failure_halts_run() {
        let sink = FakeSink::failing_on(false, 2);
        let seen = std::sync::Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let loader = TableLoader::new(&sink)
            .with_progress(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let result = loader
            .load(vec![batch(1), batch(1), batch(1)], "trips")
            .await;

        assert!(result.is_err());
        // Batch 2 was attempted and rejected; batch 3 was never written.
        assert_eq!(sink.writes.lock().unwrap().len(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_still_creates_table() {
        let sink = FakeSink::new(false);
        let loader = TableLoader::new(&sink);

        let report = loader
            .load(std::iter::once(batch(0)), "trips")
            .await
            .unwrap();

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].mode, WriteMode::Replace);
        assert_eq!(writes[0].rows, 0);
        assert_eq!(report.total_rows(), 0);
        assert!(report.to_string().contains("Done"));
    }

    #[tokio::test]
    async fn test_refresh_replaces_without_existence_check() {
        let sink = FakeSink::new(true);
        let loader = TableLoader::new(&sink);

        loader
            .refresh(vec![batch(2), batch(2)], "zones")
            .await
            .unwrap();

        assert_eq!(sink.exists_calls.load(Ordering::SeqCst), 0);
        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes[0].mode, WriteMode::Replace);
        assert_eq!(writes[1].mode, WriteMode::Append);
    }

    #[tokio::test]
    async fn test_columns_normalized_before_write() {
        let sink = FakeSink::new(false);
        let loader = TableLoader::new(&sink);

        let source = std::iter::once(Ok(RowBatch::new(
            vec!["VendorID".into(), "\"Zone\"".into()],
            vec![vec![Value::Int(1), Value::Text("Queens".into())]],
        )));
        loader.load(source, "zones").await.unwrap();

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes[0].columns, vec!["vendorid", "zone"]);
    }

    #[tokio::test]
    async fn test_decode_error_propagates_before_write() {
        let sink = FakeSink::new(false);
        let loader = TableLoader::new(&sink);

        let source = vec![batch(1), Err(eyre!("malformed row group"))];
        let result = loader.load(source, "trips").await;

        assert!(result.is_err());
        assert_eq!(sink.writes.lock().unwrap().len(), 1);
    }
}
