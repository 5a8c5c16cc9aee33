//! Row normalisation: untyped export rows into [`Listing`]s.
//!
//! Exports come from scrapers of varying quality, so nothing here fails.
//! Every field degrades on its own: a bad price becomes `None`, a `"null"`
//! seller becomes `None`, a missing column reads as empty.

use std::collections::HashMap;

use super::{Listing, SourceKey};

/// One data row keyed by normalised (lowercase, trimmed) column name.
pub type RawRow = HashMap<String, String>;

/// Placeholder words scrapers write instead of leaving a cell empty.
const NULL_WORDS: [&str; 3] = ["null", "undefined", "none"];

/// Build a [`Listing`] from one raw row.
///
/// `key` and `label` come from the source registry; the row cannot override
/// them.
pub fn normalize(row: &RawRow, key: SourceKey, label: &str) -> Listing {
    let field = |name: &str| row.get(name).map(String::as_str).unwrap_or("");

    Listing {
        id: clean_str(field("id")),
        title: clean_str(field("title")),
        description: clean_str(field("description")),
        location: clean_str(field("location")),
        price: parse_price(field("price")),
        seller: opt_str(field("seller")),
        url: opt_str(field("post_url")),
        image: opt_str(field("image")),
        crawl_time: opt_str(field("crawl_time")),
        source_key: key,
        source_label: label.to_string(),
    }
}

/// Strip byte-order marks and surrounding whitespace.
pub fn clean_str(raw: &str) -> String {
    raw.replace('\u{FEFF}', "").trim().to_string()
}

/// Like [`clean_str`], but empty cells and null-like words become `None`.
pub fn opt_str(raw: &str) -> Option<String> {
    let s = clean_str(raw);
    if s.is_empty() || NULL_WORDS.iter().any(|w| s.eq_ignore_ascii_case(w)) {
        return None;
    }
    Some(s)
}

/// Parse a free-form price by keeping only its digits.
///
/// `"₫1.234.000"`, `"1,234,000 đ"` and `"1234000"` all read as 1234000.
/// Fractions cannot be represented; listings in this domain never use them.
pub fn parse_price(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -- price ---------------------------------------------------------------

    #[test]
    fn price_strips_currency_and_separators() {
        assert_eq!(parse_price("₫1.234.000"), Some(1_234_000));
        assert_eq!(parse_price("1,500,000 đ"), Some(1_500_000));
    }

    #[test]
    fn price_without_digits_is_none() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price("Liên hệ"), None);
    }

    #[test]
    fn price_zero_is_kept() {
        assert_eq!(parse_price("0"), Some(0));
    }

    #[test]
    fn price_too_long_for_u64_is_none() {
        assert_eq!(parse_price("123456789012345678901234567890"), None);
    }

    // -- optional strings ----------------------------------------------------

    #[test]
    fn null_like_values_are_absent() {
        for raw in ["None", "null", "NULL", "undefined", "", "   "] {
            assert_eq!(opt_str(raw), None, "{raw:?} should be absent");
        }
    }

    #[test]
    fn real_values_are_trimmed_and_kept() {
        assert_eq!(opt_str("Hanoi"), Some("Hanoi".to_string()));
        assert_eq!(opt_str("  Hanoi \n"), Some("Hanoi".to_string()));
    }

    #[test]
    fn clean_str_removes_bom() {
        assert_eq!(clean_str("\u{FEFF}abc "), "abc");
    }

    // -- normalize -----------------------------------------------------------

    #[test]
    fn normalize_maps_all_columns() {
        let r = row(&[
            ("id", " 42 "),
            ("title", "Sony A7 III"),
            ("description", "Body only"),
            ("location", "Hà Nội"),
            ("seller", "Minh"),
            ("price", "25.000.000 đ"),
            ("post_url", "https://example.com/42"),
            ("image", "null"),
            ("crawl_time", "2025-11-03T23:02:04"),
        ]);

        let item = normalize(&r, SourceKey::Chotot, "Chợ Tốt");

        assert_eq!(item.id, "42");
        assert_eq!(item.title, "Sony A7 III");
        assert_eq!(item.description, "Body only");
        assert_eq!(item.location, "Hà Nội");
        assert_eq!(item.seller.as_deref(), Some("Minh"));
        assert_eq!(item.price, Some(25_000_000));
        assert_eq!(item.url.as_deref(), Some("https://example.com/42"));
        assert!(item.image.is_none());
        assert_eq!(item.crawl_time.as_deref(), Some("2025-11-03T23:02:04"));
        assert_eq!(item.source_key, SourceKey::Chotot);
        assert_eq!(item.source_label, "Chợ Tốt");
    }

    #[test]
    fn normalize_missing_columns_degrade() {
        let item = normalize(&row(&[("title", "Only a title")]), SourceKey::FbGroup, "FB");

        assert_eq!(item.id, "");
        assert_eq!(item.description, "");
        assert_eq!(item.location, "");
        assert!(item.price.is_none());
        assert!(item.seller.is_none());
        assert!(item.url.is_none());
        assert!(item.crawl_time.is_none());
    }

    #[test]
    fn normalize_ignores_url_column_name() {
        // Only `post_url` feeds the link.
        let item = normalize(&row(&[("url", "https://x")]), SourceKey::FbMarket, "M");
        assert!(item.url.is_none());
    }
}
