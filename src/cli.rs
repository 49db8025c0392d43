//! CLI helper functions

use crate::client::{Dataset, RemoteSource, trip_data_url};
use crate::db::{ConnectionOpts, Database};
use crate::decode::{CsvDecoder, ParquetSource};
use crate::etl::{BatchProgress, LoadReport, TableLoader};
use crate::table::ColumnType;
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use url::Url;

/// Request timeout for the public file hosts.
const FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// How a trips run acquires and walks the source file.
pub struct TripsOptions {
    /// Rows per batch on the chunked path.
    pub chunk_size: usize,
    /// Materialize the whole file as a single batch.
    pub whole_file: bool,
    /// Decode straight from the in-memory download instead of staging to disk.
    pub in_memory: bool,
    /// Leave the staged download on disk after the run.
    pub keep_download: bool,
}

/// Connect to the database using flags, `PG_*` environment variables and
/// defaults, in that order.
pub async fn connect_database(opts: &ConnectionOpts) -> Result<Database> {
    let config = opts.resolve()?;
    log::info!("Connecting to {}...", config.to_string().bright_black());
    Database::connect(&config).await
}

/// Ingest a month of trip records.
///
/// Pipeline: fetch (staged or in-memory) → parquet decode (chunked or whole)
/// → table load (replace on first batch of a new table, append otherwise).
pub async fn ingest_trips(
    db: &ConnectionOpts,
    dataset: Dataset,
    year: u16,
    month: u8,
    table: &str,
    options: &TripsOptions,
) -> Result<LoadReport> {
    let url = trip_data_url(dataset, year, month)?;
    let source = RemoteSource::try_new(FETCH_TIMEOUT)?;

    let database = connect_database(db).await?;
    let loader = TableLoader::new(database).with_progress(log_progress);

    let report = if options.in_memory {
        let bytes = source.fetch(&url).await?;
        log::info!("Reading parquet data...");
        let parquet = ParquetSource::from_bytes(bytes)?;
        log::info!("Read {} row(s)", parquet.row_count());
        load_parquet(&loader, parquet, table, options).await?
    } else {
        let staged = std::env::temp_dir().join(dataset.file_name(year, month));
        source.download(&url, &staged).await?;
        log::info!("Reading parquet file...");
        let parquet = ParquetSource::open(&staged)?;
        log::info!("Read {} row(s)", parquet.row_count());

        let report = load_parquet(&loader, parquet, table, options).await;

        if options.keep_download {
            log::info!("Keeping downloaded file: {}", staged.display());
        } else if let Err(e) = std::fs::remove_file(&staged) {
            log::warn!("Failed to remove {}: {}", staged.display(), e);
        }
        report?
    };

    log::info!(
        "✓ Loaded {} row(s) into '{}' in {} batch(es)",
        report.total_rows(),
        table.bright_black(),
        report.batch_count()
    );
    Ok(report)
}

async fn load_parquet(
    loader: &TableLoader<Database>,
    parquet: ParquetSource,
    table: &str,
    options: &TripsOptions,
) -> Result<LoadReport> {
    if options.whole_file {
        loader.load(std::iter::once(parquet.decode()), table).await
    } else {
        loader
            .load(parquet.batches(options.chunk_size), table)
            .await
    }
}

/// Refresh the taxi zone lookup table from its published CSV.
///
/// Pipeline: fetch → CSV decode (with the lookup's column types pinned) →
/// unconditional table rebuild.
pub async fn ingest_zones(db: &ConnectionOpts, url: &str, table: &str) -> Result<LoadReport> {
    let url = Url::parse(url).with_context(|| format!("Invalid zone lookup URL: {}", url))?;

    log::info!("Reading CSV from {}...", url);
    let source = RemoteSource::try_new(FETCH_TIMEOUT)?;
    let bytes = source.fetch(&url).await?;

    let decoder = CsvDecoder::new().with_types([
        ("LocationID", ColumnType::BigInt),
        ("Borough", ColumnType::Text),
        ("Zone", ColumnType::Text),
        ("service_zone", ColumnType::Text),
    ]);
    let batch = decoder.decode(bytes.as_ref())?;
    log::info!("Read {} row(s)", batch.len());

    let database = connect_database(db).await?;
    let loader = TableLoader::new(database).with_progress(log_progress);
    let report = loader.refresh(std::iter::once(Ok(batch)), table).await?;

    log::info!(
        "✓ Loaded {} row(s) into '{}'",
        report.total_rows(),
        table.bright_black()
    );
    Ok(report)
}

/// Verify the database connection.
pub async fn ping(db: &ConnectionOpts) -> Result<()> {
    let database = connect_database(db).await?;
    database.ping().await?;
    log::info!("✓ Database connection OK");
    Ok(())
}

fn log_progress(progress: &BatchProgress) {
    log::info!(
        "Inserted batch {} ({} rows) into '{}' [{}]",
        progress.batch,
        progress.rows.cyan(),
        progress.table.bright_black(),
        progress.mode
    );
}
