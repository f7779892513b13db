//! The scan engine: shared context and one full scan cycle.
//!
//! [`Engine`] owns everything a cycle touches (feed list, destinations,
//! collaborators, scan state and stats) and is shared behind an `Arc` by the
//! scheduler and the lifecycle.  At most one cycle runs at a time; entry is
//! controlled by the [`ScanGate`].
//!
//! ```text
//!  for each feed (configured order)
//!    fetch ─► detect_new ─► store marker ─► deliver oldest-first ─► pause
//!  save state
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::{Mutex, Notify};
use tracing::{error, info, warn};

use crate::dedup::detect_new;
use crate::dispatch::Dispatcher;
use crate::error::FetchError;
use crate::source::FeedSource;
use crate::state::{ScanState, StateStore};
use crate::stats::Stats;

/// Fixed delays that bound request rates.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// After each feed, whatever its outcome.
    pub feed_delay: Duration,
    /// Between two consecutive article deliveries.
    pub article_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            feed_delay: Duration::from_secs(2),
            article_delay: Duration::from_millis(1500),
        }
    }
}

/// Static inputs of every cycle.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scanned in this order.
    pub feeds: Vec<String>,
    pub destinations: Vec<String>,
    pub pacing: Pacing,
}

/// Single-entry guard: `Idle` when closed, `Scanning` while a permit lives.
#[derive(Debug, Default)]
pub struct ScanGate {
    scanning: AtomicBool,
    idle: Notify,
}

impl ScanGate {
    /// Atomically move from `Idle` to `Scanning`.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ScanPermit> {
        self.scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanPermit {
                gate: Arc::clone(self),
            })
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Resolve once no cycle is running.
    pub async fn wait_idle(&self) {
        loop {
            // Registered before the check so a release in between is not lost.
            let released = self.idle.notified();
            if !self.is_scanning() {
                return;
            }
            released.await;
        }
    }
}

/// Proof that the holder runs the only active cycle.  Dropping it returns
/// the gate to `Idle`, on success and failure alike.
#[derive(Debug)]
pub struct ScanPermit {
    gate: Arc<ScanGate>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.gate.scanning.store(false, Ordering::Release);
        self.gate.idle.notify_waiters();
    }
}

/// Totals for one finished cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub new_articles: usize,
    pub failed_feeds: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(CycleSummary),
    /// Another cycle was already running; nothing was done.
    Skipped,
}

/// Mutable state, only touched while a cycle (or the final save) holds it.
#[derive(Debug, Default)]
struct Ledger {
    scan: ScanState,
    stats: Stats,
}

pub struct Engine {
    feeds: Vec<String>,
    destinations: Vec<String>,
    source: Arc<dyn FeedSource>,
    dispatcher: Dispatcher,
    store: StateStore,
    pacing: Pacing,
    gate: Arc<ScanGate>,
    ledger: Mutex<Ledger>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn FeedSource>,
        dispatcher: Dispatcher,
        store: StateStore,
        scan: ScanState,
        stats: Stats,
    ) -> Self {
        let EngineConfig {
            feeds,
            destinations,
            pacing,
        } = config;
        Self {
            feeds,
            destinations,
            source,
            dispatcher,
            store,
            pacing,
            gate: Arc::new(ScanGate::default()),
            ledger: Mutex::new(Ledger { scan, stats }),
        }
    }

    pub fn gate(&self) -> &Arc<ScanGate> {
        &self.gate
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn try_begin_scan(&self) -> Option<ScanPermit> {
        self.gate.try_acquire()
    }

    /// Run a cycle now unless one is already in progress.
    pub async fn trigger_scan(&self) -> ScanOutcome {
        match self.try_begin_scan() {
            Some(permit) => ScanOutcome::Completed(self.run_cycle(permit).await),
            None => {
                info!("previous scan still in progress, skipping this one");
                ScanOutcome::Skipped
            }
        }
    }

    /// One sequential pass over every configured feed, then a save.
    pub async fn run_cycle(&self, permit: ScanPermit) -> CycleSummary {
        let mut ledger = self.ledger.lock().await;
        info!(feeds = self.feeds.len(), "starting feed scan");
        ledger.stats.begin_scan(Utc::now());

        let mut summary = CycleSummary::default();
        for url in &self.feeds {
            match self.process_feed(url, &mut ledger).await {
                Ok(count) => summary.new_articles += count,
                Err(e) => {
                    error!(url = %url, error = %e, "failed to process feed");
                    ledger.stats.record_error(url, e.to_string(), Utc::now());
                    summary.failed_feeds += 1;
                }
            }
            tokio::time::sleep(self.pacing.feed_delay).await;
        }

        self.store.save(&ledger.scan, &ledger.stats).await;
        info!(
            new_articles = summary.new_articles,
            failed_feeds = summary.failed_feeds,
            "[{}] feed scan finished",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        drop(ledger);
        drop(permit);
        summary
    }

    /// Fetch one feed and deliver whatever is new.  Returns the new count.
    async fn process_feed(&self, url: &str, ledger: &mut Ledger) -> Result<usize, FetchError> {
        info!(url = %url, "fetching feed");
        let feed = self.source.fetch(url).await?;
        let detection = detect_new(&feed.items, ledger.scan.marker(url));

        if detection.new_articles.is_empty() {
            info!(feed = %feed.title, "no new articles");
            return Ok(0);
        }
        info!(feed = %feed.title, count = detection.new_articles.len(), "found new articles");

        // Committed before delivery: a crash mid-batch drops the rest.
        if let Some(marker) = detection.marker {
            ledger.scan.set_marker(url, marker);
        }

        for (i, article) in detection.new_articles.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing.article_delay).await;
            }
            let report = self
                .dispatcher
                .deliver(article, &feed.title, &self.destinations)
                .await;
            if report.all_failed() {
                warn!(feed = %feed.title, "article reached no destination");
            }
            ledger.stats.record_sent();
        }

        Ok(detection.new_articles.len())
    }

    /// Wait out any running cycle, then write the final state.
    pub async fn drain_and_save(&self) {
        if self.gate.is_scanning() {
            info!("waiting for the current scan to finish");
        }
        self.gate.wait_idle().await;
        let ledger = self.ledger.lock().await;
        self.store.save(&ledger.scan, &ledger.stats).await;
    }

    /// Copy of the in-memory state.
    pub async fn snapshot(&self) -> (ScanState, Stats) {
        let ledger = self.ledger.lock().await;
        (ledger.scan.clone(), ledger.stats.clone())
    }
}
