//! Background source loading.
//!
//! A load fetches every configured source concurrently on the tokio runtime,
//! waits until all of them have settled, and sends one merged
//! [`LoadOutcome`] to the UI thread over an [`mpsc`] channel.  The UI thread
//! drains the channel on every tick with [`Loader::poll`].
//!
//! Starting a new load supersedes the one in flight: the old task sees its
//! stale flag and drops its result, and anything that still slips through is
//! rejected by generation number on the receiving side.
//!
//! There are no retries or timeouts.  A failed source stays failed until the
//! user reloads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use futures::future::join_all;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::source::{DataSource, Listing};

/// The merged result of one load.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Listings from every source that succeeded, in source order.
    pub items: Vec<Listing>,
    /// `"<label>: <cause>"` for each failed source, joined with `"; "`.
    pub error: Option<String>,
}

/// Fetch all sources concurrently and merge whatever succeeded.
///
/// Never short-circuits: every source is awaited, and a failure only removes
/// that source's listings from the result.
pub async fn load_all(sources: &[Arc<dyn DataSource>]) -> LoadOutcome {
    let fetches = sources.iter().map(|src| async move { (src, src.fetch().await) });

    let mut items = Vec::new();
    let mut errors = Vec::new();
    for (src, result) in join_all(fetches).await {
        match result {
            Ok(batch) => {
                debug!(source = %src.key(), rows = batch.len(), "source loaded");
                items.extend(batch);
            }
            Err(e) => {
                warn!(source = %src.key(), error = %format!("{e:#}"), "source failed");
                errors.push(format!("{}: {e:#}", src.name()));
            }
        }
    }

    LoadOutcome {
        items,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}

struct LoadMsg {
    generation: u64,
    outcome: LoadOutcome,
}

/// Owns the source registry and the channel loads report back on.
pub struct Loader {
    runtime: Handle,
    sources: Arc<Vec<Arc<dyn DataSource>>>,
    tx: mpsc::Sender<LoadMsg>,
    rx: mpsc::Receiver<LoadMsg>,
    generation: u64,
    stale: Arc<AtomicBool>,
    in_flight: bool,
}

impl Loader {
    pub fn new(runtime: Handle, sources: Vec<Arc<dyn DataSource>>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            runtime,
            sources: Arc::new(sources),
            tx,
            rx,
            generation: 0,
            stale: Arc::new(AtomicBool::new(false)),
            in_flight: false,
        }
    }

    /// Start a load, superseding any load still in flight.
    ///
    /// Returns the generation number of the new load.
    pub fn start(&mut self) -> u64 {
        self.stale.store(true, Ordering::SeqCst);
        let stale = Arc::new(AtomicBool::new(false));
        self.stale = Arc::clone(&stale);

        self.generation += 1;
        self.in_flight = true;
        let generation = self.generation;
        let sources = Arc::clone(&self.sources);
        let tx = self.tx.clone();

        info!(generation, sources = sources.len(), "starting load");
        self.runtime.spawn(async move {
            let outcome = load_all(&sources).await;
            if stale.load(Ordering::SeqCst) {
                debug!(generation, "dropping superseded load");
                return;
            }
            // The receiver lives as long as the loader; a send error means
            // the app is shutting down.
            let _ = tx.send(LoadMsg { generation, outcome });
        });

        generation
    }

    /// Swap the source registry and reload from it.
    pub fn set_sources(&mut self, sources: Vec<Arc<dyn DataSource>>) -> u64 {
        self.sources = Arc::new(sources);
        self.start()
    }

    /// Whether the latest load has not reported back yet.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Non-blocking: the latest load's outcome if it has arrived.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        while let Ok(msg) = self.rx.try_recv() {
            if let Some(outcome) = self.accept(msg) {
                return Some(outcome);
            }
        }
        None
    }

    fn accept(&mut self, msg: LoadMsg) -> Option<LoadOutcome> {
        if msg.generation != self.generation {
            debug!(generation = msg.generation, current = self.generation, "ignoring stale load");
            return None;
        }
        self.in_flight = false;
        info!(
            generation = msg.generation,
            items = msg.outcome.items.len(),
            failed = msg.outcome.error.is_some(),
            "load finished"
        );
        Some(msg.outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
