//! Parquet decoding
//!
//! Reads a staged file or an in-memory download and yields row batches. The
//! chunked path keeps at most `chunk_rows` rows resident at a time; a
//! zero-row file still yields exactly one empty batch so a load run always
//! has a first batch to define the destination schema with.

use crate::table::{RowBatch, Value};
use bytes::Bytes;
use chrono::DateTime;
use eyre::{Context, Result, eyre};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::reader::RowIter;
use parquet::record::{Field, Row};
use std::fs::File;
use std::path::Path;

/// A parquet document opened for decoding.
pub struct ParquetSource {
    reader: Box<dyn FileReader>,
}

impl ParquetSource {
    /// Open a staged parquet file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let reader = SerializedFileReader::new(file)
            .map_err(|e| eyre!("Failed to read parquet file {}: {}", path.display(), e))?;
        Ok(Self {
            reader: Box::new(reader),
        })
    }

    /// Decode an in-memory download.
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        let reader = SerializedFileReader::new(bytes)
            .map_err(|e| eyre!("Failed to read parquet data: {}", e))?;
        Ok(Self {
            reader: Box::new(reader),
        })
    }

    /// Total rows in the file, from the footer metadata.
    pub fn row_count(&self) -> usize {
        self.reader.metadata().file_metadata().num_rows().max(0) as usize
    }

    /// Column names in schema order, exactly as stored in the file.
    pub fn columns(&self) -> Vec<String> {
        self.reader
            .metadata()
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    /// Decode the whole file into a single materialized batch.
    pub fn decode(self) -> Result<RowBatch> {
        self.batches(usize::MAX)
            .next()
            .unwrap_or_else(|| Ok(RowBatch::default()))
    }

    /// Decode lazily in batches of at most `chunk_rows` rows.
    ///
    /// The returned iterator is finite and non-restartable; it always yields
    /// at least one batch, even for an empty file.
    pub fn batches(self, chunk_rows: usize) -> ParquetBatches {
        ParquetBatches {
            columns: self.columns(),
            rows: RowIter::from_file_into(self.reader),
            chunk_rows: chunk_rows.max(1),
            yielded: false,
            done: false,
        }
    }
}

/// Lazy batch iterator over a parquet document.
pub struct ParquetBatches {
    columns: Vec<String>,
    rows: RowIter<'static>,
    chunk_rows: usize,
    yielded: bool,
    done: bool,
}

impl Iterator for ParquetBatches {
    type Item = Result<RowBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut rows = Vec::new();
        while rows.len() < self.chunk_rows {
            match self.rows.next() {
                Some(Ok(row)) => match row_values(&row) {
                    Ok(values) => rows.push(values),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(eyre!("Failed to read parquet row: {}", e)));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if rows.is_empty() && self.yielded {
            return None;
        }
        self.yielded = true;
        Some(Ok(RowBatch::new(self.columns.clone(), rows)))
    }
}

fn row_values(row: &Row) -> Result<Vec<Value>> {
    row.get_column_iter()
        .map(|(name, field)| value_from_field(name, field))
        .collect()
}

fn value_from_field(column: &str, field: &Field) -> Result<Value> {
    let value = match field {
        Field::Null => Value::Null,
        Field::Bool(v) => Value::Bool(*v),
        Field::Byte(v) => Value::Int(i64::from(*v)),
        Field::Short(v) => Value::Int(i64::from(*v)),
        Field::Int(v) => Value::Int(i64::from(*v)),
        Field::Long(v) => Value::Int(*v),
        Field::UByte(v) => Value::Int(i64::from(*v)),
        Field::UShort(v) => Value::Int(i64::from(*v)),
        Field::UInt(v) => Value::Int(i64::from(*v)),
        Field::ULong(v) => Value::Int(
            i64::try_from(*v)
                .map_err(|_| eyre!("Integer out of range in column '{}'", column))?,
        ),
        Field::Float(v) => Value::Float(f64::from(*v)),
        Field::Double(v) => Value::Float(*v),
        Field::Str(v) => Value::Text(v.clone()),
        Field::Date(days) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0)
            .map(|t| Value::Date(t.date_naive()))
            .ok_or_else(|| eyre!("Invalid date in column '{}'", column))?,
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms)
            .map(|t| Value::Timestamp(t.naive_utc()))
            .ok_or_else(|| eyre!("Invalid timestamp in column '{}'", column))?,
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us)
            .map(|t| Value::Timestamp(t.naive_utc()))
            .ok_or_else(|| eyre!("Invalid timestamp in column '{}'", column))?,
        _ => eyre::bail!("Unsupported parquet value in column '{}'", column),
    };
    Ok(value)
}
