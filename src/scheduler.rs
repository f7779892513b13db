//! Timer-driven scan scheduling.
//!
//! Two tasks feed the engine: a fixed-interval ticker and a one-shot
//! deferred initial scan.  Both go through the same [`ScanGate`], so a tick
//! that lands while a cycle is running is dropped rather than queued.
//!
//! Cycles are spawned as their own tasks.  Stopping the scheduler ends the
//! two trigger tasks only; a cycle already under way is never cancelled.
//!
//! [`ScanGate`]: crate::engine::ScanGate

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::engine::Engine;

pub struct ScanScheduler {
    stop: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl ScanScheduler {
    /// Start the interval ticker and schedule the initial scan after
    /// `initial_delay`.
    pub fn start(engine: Arc<Engine>, interval: Duration, initial_delay: Duration) -> Self {
        let (stop, stop_rx) = watch::channel(false);

        let ticker = {
            let engine = engine.clone();
            let mut stop_rx = stop_rx.clone();
            tokio::spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        biased;
                        _ = stop_rx.changed() => break,
                        _ = ticker.tick() => {
                            info!("scheduled scan starting");
                            spawn_cycle(&engine);
                        }
                    }
                }
            })
        };

        let initial = {
            let mut stop_rx = stop_rx;
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => {}
                    _ = time::sleep(initial_delay) => spawn_cycle(&engine),
                }
            })
        };

        info!(
            interval_mins = interval.as_secs() / 60,
            "scheduler started"
        );
        Self {
            stop,
            tasks: vec![ticker, initial],
        }
    }

    /// Stop issuing new cycles.  Returns once both trigger tasks have exited.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "scheduler task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}

/// Claim the gate synchronously, then run the cycle on its own task.
fn spawn_cycle(engine: &Arc<Engine>) {
    match engine.try_begin_scan() {
        Some(permit) => {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine.run_cycle(permit).await;
            });
        }
        None => info!("previous scan still in progress, skipping this tick"),
    }
}
