//! CSV export source.
//!
//! Each marketplace crawler writes one CSV file with a shared header
//! (`id,title,description,price,location,seller,post_url,image,crawl_time`).
//! This source reads one such file, either from disk or over HTTP, and turns
//! every data row into a [`Listing`].

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use super::normalize::{normalize, RawRow};
use super::{DataSource, Listing, SourceKey};
use crate::error::SourceError;

/// A CSV export, located by file path or `http(s)://` URL.
pub struct CsvSource {
    pub key: SourceKey,
    /// A human-readable label shown in the UI next to each listing.
    pub label: String,
    /// File path or URL of the export.
    pub location: String,
}

impl CsvSource {
    pub fn new(key: SourceKey, label: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            location: location.into(),
        }
    }

    /// Parse an already-fetched CSV body into [`Listing`]s.
    ///
    /// Pure (no I/O) so tests can exercise the parsing without files.  Only a
    /// broken header row fails the whole body; undecodable records are
    /// skipped and logged.
    pub fn parse_rows(body: &[u8], key: SourceKey, label: &str) -> Result<Vec<Listing>, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body);

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(SourceError::Header)?
            .iter()
            .map(|h| normalize_header(&String::from_utf8_lossy(h)))
            .collect();

        let mut items = Vec::new();
        for (index, record) in reader.byte_records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(source = %key, row = index + 1, error = %e, "skipping malformed row");
                    continue;
                }
            };

            // A repeated header keeps its first column.
            let mut row = RawRow::new();
            for (name, value) in headers.iter().zip(record.iter()) {
                if !name.is_empty() {
                    row.entry(name.clone())
                        .or_insert_with(|| String::from_utf8_lossy(value).into_owned());
                }
            }

            items.push(normalize(&row, key, label));
        }

        Ok(items)
    }

    async fn read_body(&self) -> Result<Vec<u8>, SourceError> {
        if is_remote(&self.location) {
            let url = self.location.clone();
            let response = reqwest::get(&url)
                .await
                .map_err(|source| SourceError::Fetch { url: url.clone(), source })?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status { url, status });
            }

            let body = response
                .bytes()
                .await
                .map_err(|source| SourceError::Fetch { url, source })?;
            Ok(body.to_vec())
        } else {
            tokio::fs::read(&self.location)
                .await
                .map_err(|source| SourceError::Read {
                    path: PathBuf::from(&self.location),
                    source,
                })
        }
    }
}

#[async_trait]
impl DataSource for CsvSource {
    fn key(&self) -> SourceKey {
        self.key
    }

    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<Listing>> {
        let body = self.read_body().await?;
        let items = Self::parse_rows(&body, self.key, &self.label)?;
        debug!(source = %self.key, location = %self.location, rows = items.len(), "parsed export");
        Ok(items)
    }
}

/// Header cells are matched case-insensitively and may carry a BOM.
fn normalize_header(raw: &str) -> String {
    raw.replace('\u{FEFF}', "").trim().to_lowercase()
}

fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
