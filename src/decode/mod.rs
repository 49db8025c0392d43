//! Tabular decoders.
//!
//! Turns fetched bytes into [`RowBatch`](crate::table::RowBatch) values:
//! [`CsvDecoder`] for the zone lookup CSV, [`ParquetSource`] for the monthly
//! trip-record files. Decoders yield column names exactly as found in the
//! source; normalization happens at load time.

mod csv;
mod parquet;

pub use self::csv::CsvDecoder;
pub use self::parquet::{ParquetBatches, ParquetSource};
