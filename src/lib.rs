//! Trip Loader
//!
//! An ETL tool for loading NYC TLC trip records into PostgreSQL

pub mod cli;
pub mod client;
pub mod db;
pub mod decode;
pub mod etl;
pub mod table;

// Re-exports for convenience
pub use client::{Dataset, RemoteSource};
pub use db::{ConnectionConfig, ConnectionOpts, Database};
pub use decode::{CsvDecoder, ParquetSource};
pub use etl::{BatchProgress, LoadReport, TableLoader, TableSink, WriteMode};
pub use table::{ColumnType, RowBatch, Value, normalize_column_name};
