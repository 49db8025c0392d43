//! The table-load protocol.
//!
//! [`TableLoader`] maps a sequence of row batches onto a destination table
//! through a [`TableSink`], choosing between replace and append writes based
//! on a single up-front existence check.

mod loader;
mod report;
mod sink;

pub use loader::TableLoader;
pub use report::{BatchProgress, LoadReport};
pub use sink::{TableSink, WriteMode};
