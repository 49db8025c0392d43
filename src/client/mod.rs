//! Remote file retrieval.
//!
//! This module provides the [`RemoteSource`] HTTP fetcher for the published
//! TLC trip-record files, along with the [`Dataset`] selector and URL
//! construction helpers.

mod source;

pub use source::{Dataset, RemoteSource, TRIP_DATA_BASE, ZONE_LOOKUP_URL, trip_data_url};
