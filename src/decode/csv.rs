//! CSV decoding with per-value type inference

use crate::table::{ColumnType, RowBatch, Value};
use chrono::{NaiveDate, NaiveDateTime};
use eyre::{Context, Result};
use std::collections::HashMap;
use std::io::Read;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Decoder for headered CSV documents.
///
/// Values are inferred per cell (int, float, timestamp, date, bool, text;
/// empty cells become null) unless a column has an explicit type override,
/// in which case the cell must parse as that type.
#[derive(Default)]
pub struct CsvDecoder {
    types: HashMap<String, ColumnType>,
}

impl CsvDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override inference for specific columns. Keys match the raw
    /// (un-normalized) header names.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        self.types
            .extend(types.into_iter().map(|(name, ty)| (name.into(), ty)));
        self
    }

    /// Decode an entire CSV document into a single batch.
    pub fn decode(&self, input: impl Read) -> Result<RowBatch> {
        let mut reader = csv::Reader::from_reader(input);
        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read CSV record")?;
            let row = headers
                .iter()
                .zip(record.iter())
                .map(|(column, field)| self.parse_field(column, field))
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        Ok(RowBatch::new(headers, rows))
    }

    fn parse_field(&self, column: &str, field: &str) -> Result<Value> {
        if field.is_empty() {
            return Ok(Value::Null);
        }
        match self.types.get(column) {
            Some(column_type) => parse_as(field, *column_type)
                .with_context(|| format!("Column '{}' rejected value '{}'", column, field)),
            None => Ok(infer(field)),
        }
    }
}

fn parse_timestamp(field: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(field, format).ok())
}

fn parse_bool(field: &str) -> Option<bool> {
    match field {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn infer(field: &str) -> Value {
    if let Ok(v) = field.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = field.parse::<f64>() {
        return Value::Float(v);
    }
    if let Some(v) = parse_timestamp(field) {
        return Value::Timestamp(v);
    }
    if let Ok(v) = NaiveDate::parse_from_str(field, "%Y-%m-%d") {
        return Value::Date(v);
    }
    if let Some(v) = parse_bool(field) {
        return Value::Bool(v);
    }
    Value::Text(field.to_string())
}

fn parse_as(field: &str, column_type: ColumnType) -> Result<Value> {
    let value = match column_type {
        ColumnType::Bool => Value::Bool(
            parse_bool(field).ok_or_else(|| eyre::eyre!("not a boolean: '{}'", field))?,
        ),
        ColumnType::BigInt => Value::Int(field.parse().context("not an integer")?),
        ColumnType::Double => Value::Float(field.parse().context("not a number")?),
        ColumnType::Text => Value::Text(field.to_string()),
        ColumnType::Timestamp => Value::Timestamp(
            parse_timestamp(field).ok_or_else(|| eyre::eyre!("not a timestamp: '{}'", field))?,
        ),
        ColumnType::Date => Value::Date(
            NaiveDate::parse_from_str(field, "%Y-%m-%d").context("not a date")?,
        ),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_decode_infers_types() {
        let input = "\
VendorID,tpep_pickup_datetime,trip_distance,store_and_fwd_flag,Zone
1,2025-11-01 00:05:44,1.5,true,Newark Airport
2,2025-11-02 13:10:00,2.25,false,Jamaica Bay
";
        let batch = CsvDecoder::new().decode(input.as_bytes()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.columns()[0], "VendorID");
        assert_eq!(batch.rows()[0][0], Value::Int(1));
        assert_eq!(
            batch.rows()[0][1],
            Value::Timestamp(
                NaiveDate::from_ymd_opt(2025, 11, 1)
                    .unwrap()
                    .and_hms_opt(0, 5, 44)
                    .unwrap()
            )
        );
        assert_eq!(batch.rows()[0][2], Value::Float(1.5));
        assert_eq!(batch.rows()[0][3], Value::Bool(true));
        assert_eq!(batch.rows()[1][4], Value::Text("Jamaica Bay".into()));
    }

    #[test]
    fn test_decode_empty_fields_are_null() {
        let input = "a,b\n1,\n,2\n";
        let batch = CsvDecoder::new().decode(input.as_bytes()).unwrap();

        assert_eq!(batch.rows()[0][1], Value::Null);
        assert_eq!(batch.rows()[1][0], Value::Null);
    }

    #[test]
    fn test_decode_header_only_yields_empty_batch() {
        let input = "LocationID,Borough,Zone,service_zone\n";
        let batch = CsvDecoder::new().decode(input.as_bytes()).unwrap();

        assert!(batch.is_empty());
        assert_eq!(batch.columns().len(), 4);
    }

    #[test]
    fn test_type_override_forces_text() {
        let input = "LocationID,Borough\n1,Queens\n";
        let batch = CsvDecoder::new()
            .with_types([
                ("LocationID", ColumnType::BigInt),
                ("Borough", ColumnType::Text),
            ])
            .decode(input.as_bytes())
            .unwrap();

        assert_eq!(batch.rows()[0][0], Value::Int(1));
        assert_eq!(batch.rows()[0][1], Value::Text("Queens".into()));
    }

    #[test]
    fn test_type_override_rejects_bad_value() {
        let input = "LocationID\nnot-a-number\n";
        let result = CsvDecoder::new()
            .with_types([("LocationID", ColumnType::BigInt)])
            .decode(input.as_bytes());

        let error = result.unwrap_err();
        assert!(error.to_string().contains("LocationID"));
    }

    #[test]
    fn test_date_inference() {
        let input = "day\n2025-11-01\n";
        let batch = CsvDecoder::new().decode(input.as_bytes()).unwrap();
        assert_eq!(
            batch.rows()[0][0],
            Value::Date(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap())
        );
    }
}
