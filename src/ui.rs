//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! Layout, top to bottom:
//!
//! ```text
//! ┌ Search ───────────────────────────────────────────┐
//! │ / sony, a7                                          │
//! │ [x] 1 Chợ Tốt (12)  [x] 2 Facebook Group (3)  ...   │
//! │ F1 #sony  F2 #dji  F3 #canon  F4 #nikon             │
//! └─────────────────────────────────────────────────────┘
//!  All (40) │ Unviewed (31) │ Viewed (9)
//! ┌ Listings ──────────────────┐┌ Details ──────────────┐
//! │ ○ Sony A7 III  25.000.000 ₫ ││ ...                   │
//! └─────────────────────────────┘└───────────────────────┘
//!  status · error · counts · key help
//! ```

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::filter::{highlight, ViewTab};
use crate::source::{format_price, Listing};
use crate::viewed::Storage;

fn match_style() -> Style {
    Style::default().fg(Color::Black).bg(Color::Yellow)
}

/// Draw the complete UI for one frame.
pub fn draw<S: Storage>(app: &mut App<S>, frame: &mut Frame) {
    let [filter_area, tabs_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(main_area);

    draw_filter_bar(app, frame, filter_area);
    draw_tabs(app, frame, tabs_area);
    draw_listing_list(app, frame, list_area);
    draw_details(app, frame, detail_area);
    draw_status_bar(app, frame, status_area);
}

/// Split `text` into spans, marking search-term matches.
fn highlighted<'a>(text: &'a str, terms: &[String], base: Style) -> Vec<Span<'a>> {
    highlight(text, terms)
        .into_iter()
        .map(|seg| {
            if seg.matched {
                Span::styled(seg.text, match_style())
            } else {
                Span::styled(seg.text, base)
            }
        })
        .collect()
}

fn draw_filter_bar<S: Storage>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let searching = app.mode == InputMode::Search;
    let mut query = vec![
        Span::styled("/ ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.criteria.query.as_str()),
    ];
    if searching {
        query.push(Span::styled("█", Style::default().fg(Color::Gray)));
    } else if app.criteria.query.is_empty() {
        query.push(Span::styled(
            "press / to search title and description (comma or space separated)",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut sources = Vec::new();
    for (i, spec) in app.sources.iter().enumerate() {
        let selected = app.is_source_selected(spec.key);
        let mark = if selected { "[x]" } else { "[ ]" };
        let style = if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        sources.push(Span::styled(
            format!("{mark} {} {} ({})", i + 1, spec.label, app.source_count(spec.key)),
            style,
        ));
        sources.push(Span::raw("  "));
    }

    let mut tags = Vec::new();
    for (i, tag) in app.tags.iter().enumerate() {
        let style = if app.is_tag_selected(tag) {
            Style::default().fg(Color::Black).bg(Color::Magenta)
        } else {
            Style::default().fg(Color::Magenta)
        };
        tags.push(Span::styled(format!("F{} #{tag}", i + 1), style));
        tags.push(Span::raw("  "));
    }

    let border = if searching { Color::Yellow } else { Color::Gray };
    let bar = Paragraph::new(vec![Line::from(query), Line::from(sources), Line::from(tags)]).block(
        Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(bar, area);
}

fn draw_tabs<S: Storage>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let titles: Vec<String> = ViewTab::ALL
        .iter()
        .map(|&tab| format!("{} ({})", tab.label(), app.tab_counts.get(tab)))
        .collect();
    let selected = ViewTab::ALL
        .iter()
        .position(|&tab| tab == app.criteria.tab)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

/// Render the scrollable listing list.
fn draw_listing_list<S: Storage>(app: &mut App<S>, frame: &mut Frame, area: Rect) {
    let terms = &app.view.terms;
    let list_items: Vec<ListItem> = app
        .view
        .visible
        .iter()
        .map(|&i| {
            let item = &app.items[i];
            let viewed = app.viewed.is_viewed(&item.id);
            let title_style = if viewed {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![
                Span::styled(
                    if viewed { "● " } else { "○ " },
                    Style::default().fg(if viewed { Color::Green } else { Color::DarkGray }),
                ),
            ];
            if item.title.is_empty() {
                spans.push(Span::styled("(untitled)", title_style));
            } else {
                spans.extend(highlighted(&item.title, terms, title_style));
            }
            if let Some(price) = item.price {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(format_price(price), Style::default().fg(Color::LightBlue)));
            }
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("[{}]", item.source_label),
                Style::default().fg(Color::Cyan),
            ));

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(format!(" Listings ({}) ", app.visible_len()))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn detail_lines<'a>(item: &'a Listing, terms: &[String]) -> Vec<Line<'a>> {
    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![Line::from(highlighted(
        &item.title,
        terms,
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    if let Some(price) = item.price {
        lines.push(Line::from(Span::styled(
            format_price(price),
            Style::default().fg(Color::LightBlue),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("Source   ", label),
        Span::raw(item.source_label.as_str()),
    ]));

    let optional = [
        ("Location ", (!item.location.is_empty()).then_some(item.location.as_str())),
        ("Seller   ", item.seller.as_deref()),
        ("Link     ", item.url.as_deref()),
        ("Image    ", item.image.as_deref()),
        ("Crawled  ", item.crawl_time.as_deref()),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            lines.push(Line::from(vec![Span::styled(name, label), Span::raw(value)]));
        }
    }

    if !item.description.is_empty() {
        lines.push(Line::default());
        for text in item.description.lines() {
            lines.push(Line::from(highlighted(text, terms, Style::default())));
        }
    }
    lines
}

fn draw_details<S: Storage>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let block = Block::default().title(" Details ").borders(Borders::ALL);
    let body = match app.selected_listing() {
        Some(item) => Paragraph::new(detail_lines(item, &app.view.terms)),
        None => Paragraph::new(Line::from(Span::styled(
            "No matching listings.",
            Style::default().fg(Color::DarkGray),
        ))),
    };
    frame.render_widget(body.block(block).wrap(Wrap { trim: false }), area);
}

/// Render the bottom status bar.
fn draw_status_bar<S: Storage>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    if app.loading {
        spans.push(Span::styled(
            "Loading… ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)));
    if let Some(error) = &app.error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("Error: {error}"), Style::default().fg(Color::Red)));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("{} of {} shown", app.visible_len(), app.items.len()),
        Style::default().fg(Color::Green),
    ));

    let help = match app.mode {
        InputMode::Search => "  Enter/Esc: done  Ctrl-U: clear",
        InputMode::Normal => {
            "  q: quit  /: search  Tab: tab  1-9: source  F1-F12: tag  Space: viewed  m/u: mark/unmark all  C: clear  r: reload"
        }
    };
    spans.push(Span::raw(help));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
