//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait and the common [`Listing`]
//! type.  Concrete source implementations live in sub-modules (currently only
//! [`CsvSource`]).
//!
//! ## Adding a new source
//!
//! 1. Create a new file in this directory (e.g. `json_source.rs`).
//! 2. Define a struct and implement [`DataSource`] for it, converting rows
//!    through [`normalize::normalize`] so null handling stays uniform.
//! 3. Add the module below and re-export your struct in the `pub use` block.
//! 4. Build it from the registry in `config.rs`.
//!
//! The loader, filters, and UI are all source-agnostic.

mod csv_source;
mod listing;
pub mod normalize;

pub use csv_source::CsvSource;
pub use listing::{format_price, Listing, SourceKey};

use anyhow::Result;
use async_trait::async_trait;

/// Trait that every data source must implement.
///
/// The loader calls [`fetch()`](DataSource::fetch) for all sources
/// concurrently on the tokio runtime, so implementations must be
/// [`Send`] + [`Sync`].
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Registry key stamped onto every listing this source yields.
    fn key(&self) -> SourceKey;

    /// Human-readable label shown next to listings and in error messages.
    fn name(&self) -> &str;

    /// Fetch and normalise the whole export.
    ///
    /// Errors fail this source only; the loader keeps the other sources'
    /// listings and reports the message in the status bar.
    async fn fetch(&self) -> Result<Vec<Listing>>;
}
