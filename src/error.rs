//! Typed errors for source fetching and configuration loading.
//!
//! Both surface to the user as plain strings (status bar or startup message),
//! so the `Display` text carries the useful detail.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceKey;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV header")]
    Header(#[source] csv::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("source `{0}` is configured more than once")]
    DuplicateSource(SourceKey),
}
