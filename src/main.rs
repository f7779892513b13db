//! rss-relay: forwards newly published RSS items to Telegram chats.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────┐ tick ┌──────────────┐ fetch ┌───────────┐
//! │ scheduler.rs │ ───► │  engine.rs   │ ────► │ source/   │
//! │ (timers)     │      │ (one cycle)  │       └───────────┘
//! └──────────────┘      │  dedup.rs    │ send  ┌─────────────┐
//!        ▲              │  stats.rs    │ ────► │ dispatch.rs │──► telegram.rs
//!        │ start/stop   └──────────────┘       └─────────────┘
//! ┌──────────────┐             │ load/save
//! │ lifecycle.rs │      ┌──────────────┐
//! │ (signals)    │      │   state.rs   │
//! └──────────────┘      └──────────────┘
//! ```
//!
//! * **`source/`**: the `FeedSource` trait, `Article`/`Marker`, and the RSS
//!   implementation.
//! * **`dedup`**: decides which fetched items are new for a feed.
//! * **`stats`** / **`state`**: counters, error log, and the JSON state file.
//! * **`dispatch`** / **`telegram`**: message layout and delivery.
//! * **`engine`**: the scan cycle and its single-entry gate.
//! * **`scheduler`**: interval timer plus the deferred first scan.
//! * **`lifecycle`**: startup wiring and drain-on-shutdown.
//! * **`main`**: parse config, set up logging, run until signalled.

mod config;
mod dedup;
mod dispatch;
mod engine;
mod error;
mod lifecycle;
mod probe;
mod scheduler;
mod source;
mod state;
mod stats;
mod telegram;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Cli, INITIAL_SCAN_DELAY};
use engine::Pacing;
use lifecycle::{Lifecycle, LifecycleConfig};
use source::RssSource;
use state::StateStore;
use telegram::TelegramClient;

const DEFAULT_LOG_FILTER: &str = "rss_relay=info";

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // -- smoke-test mode -----------------------------------------------------
    if cli.check {
        let feeds = cli.feeds().context("invalid configuration")?;
        let source = RssSource::new(
            std::time::Duration::from_secs(cli.fetch_timeout_secs),
            &cli.user_agent,
        )
        .context("failed to build HTTP client")?;
        let failures = probe::probe_feeds(&source, &feeds).await;
        if failures > 0 {
            anyhow::bail!("{failures} of {} feeds failed", feeds.len());
        }
        return Ok(());
    }

    // -- configuration (fatal on error) --------------------------------------
    let settings = cli.into_settings().context("invalid configuration")?;
    info!(
        feeds = settings.feeds.len(),
        destinations = settings.destinations.len(),
        interval_mins = settings.scan_interval.as_secs() / 60,
        "configuration ok"
    );

    // -- collaborators --------------------------------------------------------
    let source = RssSource::new(settings.fetch_timeout, &settings.user_agent)
        .context("failed to build HTTP client")?;
    let delivery = TelegramClient::with_timeout(
        settings.telegram_api_url.clone(),
        settings.bot_token.clone(),
        settings.delivery_timeout,
    )
    .context("failed to build Bot API client")?;

    // -- run until signalled --------------------------------------------------
    let lifecycle = Lifecycle::start(
        LifecycleConfig {
            feeds: settings.feeds,
            destinations: settings.destinations,
            scan_interval: settings.scan_interval,
            initial_delay: INITIAL_SCAN_DELAY,
            pacing: Pacing::default(),
            store: StateStore::new(settings.data_file),
        },
        Arc::new(source),
        Arc::new(delivery),
    )
    .await;

    let signal = lifecycle::wait_for_signal()
        .await
        .context("failed to install signal handlers")?;
    info!(signal, "received termination signal");
    lifecycle.shutdown().await;

    Ok(())
}
