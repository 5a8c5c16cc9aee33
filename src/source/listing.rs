//! The core data type shared across all listing sources.
//!
//! `Listing` represents a single classified ad from any marketplace export.
//! Every source implementation converts its native rows into `Listing`s (via
//! [`super::normalize`]) so the rest of the application stays source-agnostic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of marketplaces a listing can come from.
///
/// Serialized in snake case (`chotot`, `fb_group`, `fb_market`) so that the
/// config file can name them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKey {
    Chotot,
    FbGroup,
    FbMarket,
}

impl SourceKey {
    /// Every key, in registry order.
    pub const ALL: [SourceKey; 3] = [SourceKey::Chotot, SourceKey::FbGroup, SourceKey::FbMarket];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKey::Chotot => "chotot",
            SourceKey::FbGroup => "fb_group",
            SourceKey::FbMarket => "fb_market",
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single listing, normalised from any source.
///
/// Listings are never mutated after normalisation; a reload replaces the
/// whole set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Identifier taken verbatim from the export.
    ///
    /// Not guaranteed unique across sources: two sources emitting the same id
    /// share one viewed flag.
    pub id: String,

    pub title: String,
    pub description: String,
    pub location: String,

    /// Asking price in whole currency units, if the row had any digits.
    pub price: Option<u64>,

    pub seller: Option<String>,
    /// Link to the original post (`post_url` column).
    pub url: Option<String>,
    pub image: Option<String>,
    /// When the crawler saw the post, as written in the export.
    pub crawl_time: Option<String>,

    /// Which source this came from. Set by the loader, never by the row.
    pub source_key: SourceKey,
    /// Display name of the source (e.g. "Chợ Tốt").
    pub source_label: String,
}

/// Render a price the way VND amounts are usually written: dot-separated
/// thousands and a trailing `₫`.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out.push_str(" ₫");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
