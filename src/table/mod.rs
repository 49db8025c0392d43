//! Tabular data model.
//!
//! This module provides the typed value and row-batch types that decoders
//! produce and the load protocol consumes, along with column-name
//! normalization.

mod batch;

pub use batch::{ColumnType, RowBatch, Value, normalize_column_name};
