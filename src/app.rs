use ratatui::widgets::ListState;

use crate::config::SourceSpec;
use crate::filter::{self, Criteria, FilterView, TabCounts, ViewTab};
use crate::load::LoadOutcome;
use crate::source::{Listing, SourceKey};
use crate::viewed::{Storage, ViewedStore};

/// What keystrokes currently do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing edits the search query.
    Search,
}

pub struct App<S: Storage> {
    /// Every listing from the last load, in source order.
    pub items: Vec<Listing>,
    /// Source registry, in checkbox order.
    pub sources: Vec<SourceSpec>,
    /// Suggested tags, in toggle-key order.
    pub tags: Vec<String>,
    pub criteria: Criteria,
    pub viewed: ViewedStore<S>,
    /// Derived from the fields above by [`App::refresh`].
    pub view: FilterView,
    pub tab_counts: TabCounts,
    /// Selection within `view.visible`.
    pub list_state: ListState,
    pub mode: InputMode,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Set by the reload key; the main loop starts a load and clears it.
    pub reload_requested: bool,
    pub loading: bool,
    /// Last status message.
    pub status: String,
    /// Failed sources from the last load.
    pub error: Option<String>,
}

impl<S: Storage> App<S> {
    pub fn new(sources: Vec<SourceSpec>, tags: Vec<String>, viewed: ViewedStore<S>) -> Self {
        let criteria = Criteria {
            sources: sources.iter().map(|s| s.key).collect(),
            ..Criteria::default()
        };
        let mut app = Self {
            items: Vec::new(),
            sources,
            tags,
            criteria,
            viewed,
            view: FilterView {
                terms: Vec::new(),
                visible: Vec::new(),
                counts: Default::default(),
            },
            tab_counts: TabCounts::default(),
            list_state: ListState::default(),
            mode: InputMode::Normal,
            quit: false,
            reload_requested: false,
            loading: false,
            status: "Starting…".into(),
            error: None,
        };
        app.refresh();
        app
    }

    /// Re-derive the visible list and counts, and keep the selection in range.
    pub fn refresh(&mut self) {
        let viewed = &self.viewed;
        self.view = filter::apply(&self.items, &self.criteria, |id| viewed.is_viewed(id));
        self.tab_counts = TabCounts::tally(&self.items, |id| viewed.is_viewed(id));

        let len = self.view.visible.len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    // -- loading -------------------------------------------------------------

    /// Mark a load as running. The previous status stays until it lands.
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Replace all listings with a finished load.
    pub fn apply_load(&mut self, outcome: LoadOutcome) {
        self.viewed.seed(outcome.items.iter().map(|i| i.id.as_str()));
        self.items = outcome.items;
        self.error = outcome.error;
        self.loading = false;
        self.status = format!(
            "Loaded {} listings at {}",
            self.items.len(),
            chrono::Local::now().format("%H:%M:%S")
        );
        self.refresh();
    }

    // -- lookups -------------------------------------------------------------

    pub fn visible_len(&self) -> usize {
        self.view.visible.len()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Listing> {
        self.view.visible.iter().map(|&i| &self.items[i])
    }

    pub fn selected_listing(&self) -> Option<&Listing> {
        let pos = self.list_state.selected()?;
        let &index = self.view.visible.get(pos)?;
        self.items.get(index)
    }

    pub fn source_count(&self, key: SourceKey) -> usize {
        self.view.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn is_source_selected(&self, key: SourceKey) -> bool {
        self.criteria.sources.contains(&key)
    }

    pub fn is_tag_selected(&self, tag: &str) -> bool {
        self.criteria.tags.iter().any(|t| t == tag)
    }

    // -- criteria ------------------------------------------------------------

    pub fn enter_search(&mut self) {
        self.mode = InputMode::Search;
    }

    pub fn leave_search(&mut self) {
        self.mode = InputMode::Normal;
    }

    pub fn push_query_char(&mut self, c: char) {
        self.criteria.query.push(c);
        self.refresh();
    }

    pub fn pop_query_char(&mut self) {
        if self.criteria.query.pop().is_some() {
            self.refresh();
        }
    }

    pub fn clear_query(&mut self) {
        if !self.criteria.query.is_empty() {
            self.criteria.query.clear();
            self.refresh();
        }
    }

    /// Toggle the suggested tag at `index`. Out-of-range indices are ignored.
    pub fn toggle_tag(&mut self, index: usize) {
        let Some(tag) = self.tags.get(index) else {
            return;
        };
        if let Some(pos) = self.criteria.tags.iter().position(|t| t == tag) {
            self.criteria.tags.remove(pos);
        } else {
            self.criteria.tags.push(tag.clone());
        }
        self.refresh();
    }

    /// Toggle the registry source at `index`. Out-of-range indices are ignored.
    pub fn toggle_source(&mut self, index: usize) {
        let Some(key) = self.sources.get(index).map(|s| s.key) else {
            return;
        };
        if !self.criteria.sources.remove(&key) {
            self.criteria.sources.insert(key);
        }
        self.refresh();
    }

    pub fn set_tab(&mut self, tab: ViewTab) {
        self.criteria.tab = tab;
        self.refresh();
    }

    pub fn next_tab(&mut self) {
        self.set_tab(self.criteria.tab.next());
    }

    // -- viewed state --------------------------------------------------------

    pub fn toggle_selected_viewed(&mut self) {
        let Some(id) = self.selected_listing().map(|l| l.id.clone()) else {
            return;
        };
        self.viewed.toggle(&id);
        self.refresh();
    }

    /// Mark or unmark every visible listing in one write.
    pub fn mark_all_visible(&mut self, value: bool) {
        let ids: Vec<String> = self.visible().map(|l| l.id.clone()).collect();
        let count = ids.len();
        self.viewed.set_viewed_many(ids, value);
        self.status = if value {
            format!("Marked {count} listings viewed")
        } else {
            format!("Unmarked {count} listings")
        };
        self.refresh();
    }

    pub fn clear_viewed(&mut self) {
        self.viewed.clear();
        self.status = "Cleared viewed state".into();
        self.refresh();
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.visible_len() == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if self.visible_len() > 0 {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let len = self.visible_len();
        if len > 0 {
            self.list_state.select(Some(len - 1));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::default_sources;
    use crate::viewed::MemoryStorage;

    pub(crate) fn make_listing(id: &str, title: &str, key: SourceKey) -> Listing {
        Listing {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            location: "Hà Nội".to_string(),
            price: Some(1_000_000),
            seller: None,
            url: None,
            image: None,
            crawl_time: None,
            source_key: key,
            source_label: key.to_string(),
        }
    }

    pub(crate) fn sample_outcome() -> LoadOutcome {
        LoadOutcome {
            items: vec![
                make_listing("c1", "Sony A7 III", SourceKey::Chotot),
                make_listing("c2", "Canon 80D", SourceKey::Chotot),
                make_listing("g1", "DJI Mini 3", SourceKey::FbGroup),
                make_listing("m1", "Sony 50mm lens", SourceKey::FbMarket),
            ],
            error: None,
        }
    }

    pub(crate) fn new_app() -> App<MemoryStorage> {
        App::new(
            default_sources(std::path::Path::new("data")),
            vec!["sony".into(), "dji".into()],
            ViewedStore::open(MemoryStorage::new()),
        )
    }

    fn loaded_app() -> App<MemoryStorage> {
        let mut app = new_app();
        app.apply_load(sample_outcome());
        app
    }

    fn visible_ids<S: Storage>(app: &App<S>) -> Vec<&str> {
        app.visible().map(|l| l.id.as_str()).collect()
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty_with_all_sources_selected() {
        let app = new_app();
        assert!(app.items.is_empty());
        assert!(!app.quit);
        assert!(app.list_state.selected().is_none());
        assert!(SourceKey::ALL.iter().all(|&k| app.is_source_selected(k)));
    }

    // -- loading -------------------------------------------------------------

    #[test]
    fn apply_load_replaces_items_and_selects_first() {
        let mut app = new_app();
        app.begin_load();
        assert!(app.loading);

        app.apply_load(sample_outcome());

        assert!(!app.loading);
        assert_eq!(app.items.len(), 4);
        assert_eq!(app.list_state.selected(), Some(0));
        assert!(app.status.contains("4 listings"));
    }

    #[test]
    fn apply_load_keeps_partial_error() {
        let mut app = new_app();
        let mut outcome = sample_outcome();
        outcome.error = Some("Facebook Group: boom".into());
        app.apply_load(outcome);

        assert_eq!(app.error.as_deref(), Some("Facebook Group: boom"));
        assert_eq!(app.items.len(), 4);
    }

    #[test]
    fn reload_replaces_rather_than_merges() {
        let mut app = loaded_app();
        app.apply_load(LoadOutcome {
            items: vec![make_listing("x", "Only", SourceKey::Chotot)],
            error: None,
        });
        assert_eq!(visible_ids(&app), ["x"]);
    }

    // -- criteria ------------------------------------------------------------

    #[test]
    fn typing_a_query_filters() {
        let mut app = loaded_app();
        for c in "sony".chars() {
            app.push_query_char(c);
        }
        assert_eq!(visible_ids(&app), ["c1", "m1"]);

        app.pop_query_char();
        app.clear_query();
        assert_eq!(app.visible_len(), 4);
    }

    #[test]
    fn tags_or_with_query() {
        let mut app = loaded_app();
        app.toggle_tag(1); // dji
        for c in "canon".chars() {
            app.push_query_char(c);
        }
        assert_eq!(visible_ids(&app), ["c2", "g1"]);
        assert!(app.is_tag_selected("dji"));

        app.toggle_tag(1);
        assert!(!app.is_tag_selected("dji"));
        assert_eq!(visible_ids(&app), ["c2"]);
    }

    #[test]
    fn out_of_range_toggles_are_ignored() {
        let mut app = loaded_app();
        app.toggle_tag(9);
        app.toggle_source(9);
        assert_eq!(app.visible_len(), 4);
    }

    #[test]
    fn deselecting_a_source_keeps_its_count() {
        let mut app = loaded_app();
        app.toggle_source(0); // Chợ Tốt off

        assert_eq!(visible_ids(&app), ["g1", "m1"]);
        assert_eq!(app.source_count(SourceKey::Chotot), 2);
    }

    #[test]
    fn deselecting_every_source_empties_the_list() {
        let mut app = loaded_app();
        for i in 0..3 {
            app.toggle_source(i);
        }
        assert_eq!(app.visible_len(), 0);
        assert!(app.list_state.selected().is_none());
        assert_eq!(app.source_count(SourceKey::FbMarket), 1);
    }

    // -- viewed --------------------------------------------------------------

    #[test]
    fn toggling_viewed_moves_listing_between_tabs() {
        let mut app = loaded_app();
        app.toggle_selected_viewed(); // c1

        assert!(app.viewed.is_viewed("c1"));
        assert_eq!(app.tab_counts.viewed, 1);

        app.set_tab(ViewTab::Unviewed);
        assert_eq!(visible_ids(&app), ["c2", "g1", "m1"]);

        app.next_tab();
        assert_eq!(app.criteria.tab, ViewTab::Viewed);
        assert_eq!(visible_ids(&app), ["c1"]);
    }

    #[test]
    fn mark_all_visible_writes_once() {
        let mut app = loaded_app();
        for c in "sony".chars() {
            app.push_query_char(c);
        }
        app.mark_all_visible(true);

        assert!(app.viewed.is_viewed("c1"));
        assert!(app.viewed.is_viewed("m1"));
        assert!(!app.viewed.is_viewed("c2"));
        assert_eq!(app.viewed.storage().write_count(), 1);

        app.mark_all_visible(false);
        assert!(!app.viewed.is_viewed("c1"));
    }

    #[test]
    fn clear_viewed_resets_tab_counts() {
        let mut app = loaded_app();
        app.mark_all_visible(true);
        assert_eq!(app.tab_counts.viewed, 4);

        app.clear_viewed();
        assert_eq!(app.tab_counts.viewed, 0);
        assert_eq!(app.tab_counts.unviewed, 4);
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_on_empty_is_noop() {
        let mut app = new_app();
        app.select_next();
        app.select_previous();
        app.select_first();
        app.select_last();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn navigation_clamps_to_visible_range() {
        let mut app = loaded_app();

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(1));

        app.select_last();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(3));

        app.select_first();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn selection_is_clamped_when_list_shrinks() {
        let mut app = loaded_app();
        app.select_last();
        for c in "canon".chars() {
            app.push_query_char(c);
        }
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.selected_listing().map(|l| l.id.as_str()), Some("c2"));
    }
}
