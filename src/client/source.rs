//! HTTP source for published trip-record files
//!
//! The TLC publishes one Parquet file per dataset per month on CloudFront;
//! the zone lookup is a small CSV. Files are public, so the fetcher carries
//! no credentials, only a timeout.

use bytes::Bytes;
use clap::ValueEnum;
use eyre::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Base URL for the monthly TLC trip-record Parquet files.
pub const TRIP_DATA_BASE: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data/";

/// Taxi zone lookup CSV.
pub const ZONE_LOOKUP_URL: &str =
    "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/misc/taxi_zone_lookup.csv";

/// Monthly trip-record datasets published by the TLC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    Yellow,
    Green,
}

impl Dataset {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
        }
    }

    /// File name of the monthly Parquet file, e.g.
    /// `yellow_tripdata_2025-11.parquet`.
    pub fn file_name(&self, year: u16, month: u8) -> String {
        format!("{}_tripdata_{}-{:02}.parquet", self.prefix(), year, month)
    }

    /// Default destination table for this dataset.
    pub fn default_table(&self) -> &'static str {
        match self {
            Self::Yellow => "yellow_taxi_data",
            Self::Green => "green_taxi_data",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// URL of the monthly Parquet file for a dataset.
pub fn trip_data_url(dataset: Dataset, year: u16, month: u8) -> Result<Url> {
    let base = Url::parse(TRIP_DATA_BASE).context("Invalid trip-data base URL")?;
    base.join(&dataset.file_name(year, month))
        .context("Failed to build trip-data URL")
}

/// HTTP fetcher for remote source files.
pub struct RemoteSource {
    client: reqwest::Client,
}

impl RemoteSource {
    /// Build a fetcher with the given request timeout.
    pub fn try_new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch a file into memory.
    pub async fn fetch(&self, url: &Url) -> Result<Bytes> {
        log::info!("Downloading {}...", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .with_context(|| format!("Server rejected request for {}", url))?;

        response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }

    /// Stage a file to disk, streaming it chunk by chunk so the download is
    /// never fully resident in memory.
    pub async fn download(&self, url: &Url, dest: &Path) -> Result<()> {
        log::info!("Downloading {}...", url);
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .with_context(|| format!("Server rejected request for {}", url))?;

        let mut file = std::fs::File::create(dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed while streaming {}", url))?
        {
            file.write_all(&chunk)
                .with_context(|| format!("Failed to write {}", dest.display()))?;
        }

        log::debug!("Staged {} to {}", url, dest.display());
        Ok(())
    }
}
