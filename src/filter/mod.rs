//! Listing filters.
//!
//! Everything here is a pure function of its inputs: the app re-runs
//! [`apply`] after every keystroke, toggle, or reload and keeps no derived
//! state of its own between calls.

mod highlight;

pub use highlight::highlight;

use std::collections::{BTreeMap, BTreeSet};

use crate::source::{Listing, SourceKey};

/// Which slice of the viewed state the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewTab {
    #[default]
    All,
    Unviewed,
    Viewed,
}

impl ViewTab {
    pub const ALL: [ViewTab; 3] = [ViewTab::All, ViewTab::Unviewed, ViewTab::Viewed];

    /// Cycle All → Unviewed → Viewed → All.
    pub fn next(self) -> Self {
        match self {
            ViewTab::All => ViewTab::Unviewed,
            ViewTab::Unviewed => ViewTab::Viewed,
            ViewTab::Viewed => ViewTab::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewTab::All => "All",
            ViewTab::Unviewed => "Unviewed",
            ViewTab::Viewed => "Viewed",
        }
    }

    fn admits(self, viewed: bool) -> bool {
        match self {
            ViewTab::All => true,
            ViewTab::Unviewed => !viewed,
            ViewTab::Viewed => viewed,
        }
    }
}

/// Everything the user can change about what is shown.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    /// Free text; split on whitespace and commas.
    pub query: String,
    /// Selected suggested tags, in selection order.
    pub tags: Vec<String>,
    /// Sources whose listings may appear. Empty means nothing is shown.
    pub sources: BTreeSet<SourceKey>,
    pub tab: ViewTab,
}

/// Per-source listing counts. Every [`SourceKey`] has an entry.
pub type SourceCounts = BTreeMap<SourceKey, usize>;

/// The derived view for one set of criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterView {
    /// Search terms in effect (tags plus query tokens).
    pub terms: Vec<String>,
    /// Indices into the item slice, in original order.
    pub visible: Vec<usize>,
    /// How many listings each source would contribute under the current text
    /// and tab filters, regardless of which sources are selected.
    pub counts: SourceCounts,
}

/// Derive the visible listings and per-source counts.
pub fn apply(items: &[Listing], criteria: &Criteria, is_viewed: impl Fn(&str) -> bool) -> FilterView {
    let terms = derive_terms(&criteria.query, &criteria.tags);

    let visible = if criteria.sources.is_empty() {
        Vec::new()
    } else {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| criteria.sources.contains(&item.source_key))
            .filter(|(_, item)| matches_terms(item, &terms))
            .filter(|(_, item)| criteria.tab.admits(is_viewed(&item.id)))
            .map(|(i, _)| i)
            .collect()
    };

    let counts = source_counts(items, &terms, criteria.tab, &is_viewed);

    FilterView {
        terms,
        visible,
        counts,
    }
}

/// Lowercase query tokens unioned with the selected tags, deduplicated.
///
/// Tags come first so that their order is stable while the user types.
pub fn derive_terms<S: AsRef<str>>(query: &str, tags: &[S]) -> Vec<String> {
    let query = query.to_lowercase();
    let tokens = query
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(str::to_string);
    let tags = tags.iter().map(|t| t.as_ref().trim().to_lowercase());

    let mut terms: Vec<String> = Vec::new();
    for term in tags.chain(tokens) {
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// True if there are no terms, or any term occurs in the title or
/// description (case-insensitive).
pub fn matches_terms(item: &Listing, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", item.title, item.description).to_lowercase();
    terms.iter().any(|term| haystack.contains(term.as_str()))
}

/// Count listings per source after the text and tab filters, ignoring the
/// source selection.
pub fn source_counts(
    items: &[Listing],
    terms: &[String],
    tab: ViewTab,
    is_viewed: impl Fn(&str) -> bool,
) -> SourceCounts {
    let mut counts: SourceCounts = SourceKey::ALL.iter().map(|&k| (k, 0)).collect();
    for item in items {
        if !matches_terms(item, terms) || !tab.admits(is_viewed(&item.id)) {
            continue;
        }
        *counts.entry(item.source_key).or_default() += 1;
    }
    counts
}

/// Totals shown on the tab bar, over every loaded listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabCounts {
    pub all: usize,
    pub unviewed: usize,
    pub viewed: usize,
}

impl TabCounts {
    pub fn tally(items: &[Listing], is_viewed: impl Fn(&str) -> bool) -> Self {
        let viewed = items.iter().filter(|i| is_viewed(&i.id)).count();
        Self {
            all: items.len(),
            unviewed: items.len() - viewed,
            viewed,
        }
    }

    pub fn get(&self, tab: ViewTab) -> usize {
        match tab {
            ViewTab::All => self.all,
            ViewTab::Unviewed => self.unviewed,
            ViewTab::Viewed => self.viewed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
