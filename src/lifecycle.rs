//! Startup wiring and graceful shutdown.
//!
//! Shutdown order matters: stop the timers, let any running cycle finish on
//! its own, save the final state, and only then release the delivery
//! session.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::dispatch::{Delivery, Dispatcher, SendOptions};
use crate::engine::{Engine, EngineConfig, Pacing};
use crate::scheduler::ScanScheduler;
use crate::source::FeedSource;
use crate::state::StateStore;

/// Everything [`Lifecycle::start`] needs besides the collaborators.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub feeds: Vec<String>,
    pub destinations: Vec<String>,
    pub scan_interval: Duration,
    pub initial_delay: Duration,
    pub pacing: Pacing,
    pub store: StateStore,
}

pub struct Lifecycle {
    engine: Arc<Engine>,
    scheduler: ScanScheduler,
}

impl Lifecycle {
    /// Load saved state, build the engine, and start scheduling.
    pub async fn start(
        config: LifecycleConfig,
        source: Arc<dyn FeedSource>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        let (scan, stats) = config.store.load().await;
        let dispatcher = Dispatcher::new(delivery, SendOptions::default());
        let engine_config = EngineConfig {
            feeds: config.feeds,
            destinations: config.destinations,
            pacing: config.pacing,
        };
        let engine = Arc::new(Engine::new(
            engine_config,
            source,
            dispatcher,
            config.store,
            scan,
            stats,
        ));
        let scheduler =
            ScanScheduler::start(engine.clone(), config.scan_interval, config.initial_delay);
        info!("relay started");
        Self { engine, scheduler }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Drain and persist.  Never interrupts an in-flight cycle.
    pub async fn shutdown(self) {
        info!("shutting down");
        self.scheduler.stop().await;
        self.engine.drain_and_save().await;
        self.engine.dispatcher().close().await;
        info!("shutdown complete");
    }
}

/// Resolve on the first of SIGINT or SIGTERM.  Both mean the same thing.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    };
    Ok(name)
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
