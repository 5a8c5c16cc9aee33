//! san-do-cu: a terminal browser for second-hand marketplace listings.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ LoadOutcome ┌──────────┐  draw()  ┌──────────┐
//! │  load.rs │ ──────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tokio)  │  (channel)  │ (state)  │          │ (render) │
//! └──────────┘             └──────────┘          └──────────┘
//!      ▲                     ▲      │
//!      │ fetch()             │      │ filter::apply()
//! ┌──────────┐          ┌──────────┐ ┌──────────┐
//! │ source/  │          │ input.rs │ │ viewed.rs│
//! └──────────┘          └──────────┘ └──────────┘
//! ```
//!
//! * **`source/`**: the `DataSource` trait, the CSV export source, and row
//!   normalisation into `Listing`s.
//! * **`load`**: fetches every source concurrently and hands one merged
//!   result to the UI, dropping superseded loads.
//! * **`filter`**: pure derivation of the visible list, per-source counts,
//!   and match highlighting.
//! * **`viewed`**: the persisted viewed-flag map.
//! * **`app`**: owns all application state.
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`config`** / **`logging`**: startup plumbing.
//! * **`main`**: wires everything together: parse args, set up the terminal,
//!   and run the event loop.

mod app;
mod config;
mod error;
mod filter;
mod input;
mod load;
mod logging;
mod source;
mod ui;
mod viewed;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use app::App;
use config::{Cli, Config};
use load::Loader;
use viewed::{FileStorage, ViewedStore};

// ---------------------------------------------------------------------------
// RAII terminal guard, restored even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // -- configuration -------------------------------------------------------
    let cli = Cli::parse();
    let config = Config::load(&cli).context("failed to load configuration")?;

    let log_path = logging::init_or_warn(&config.logs_dir());
    info!(
        log = ?log_path,
        data_dir = %config.data_dir.display(),
        sources = config.sources.len(),
        "starting"
    );

    // -- loading runs on tokio; the UI loop stays on this thread ---------------
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let mut loader = Loader::new(runtime.handle().clone(), Vec::new());

    let storage = FileStorage::new(&config.data_dir);
    let viewed = ViewedStore::open(storage);
    info!(
        dir = %viewed.storage().dir().display(),
        viewed = viewed.viewed_count(),
        "viewed state opened"
    );

    let mut app = App::new(config.sources.clone(), config.tags.clone(), viewed);
    loader.set_sources(config.build_sources());
    app.begin_load();

    // -- terminal setup (Drop restores on exit or panic) --------------
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // ~10 fps.  Each iteration:
    //   1. Apply a finished load, or start one if the user asked.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Loads
        if let Some(outcome) = loader.poll() {
            app.apply_load(outcome);
        }
        if std::mem::take(&mut app.reload_requested) {
            loader.start();
            app.begin_load();
        }

        // 2. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 3. Handle input
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    info!(loading = loader.is_loading(), "exiting");
    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
