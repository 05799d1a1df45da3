//! Background Runner
//!
//! Drives the two scheduled sweeps on independent timers. Campaigns are
//! processed sequentially inside each sweep; a campaign that fails is
//! reported in the sweep report and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;
use tracing::info;

use governor_core::Governor;

use crate::config::ServiceConfig;

/// Background sweep runner
pub struct BackgroundRunner {
    governor: Arc<RwLock<Governor>>,
    config: ServiceConfig,
}

impl BackgroundRunner {
    pub fn new(governor: Arc<RwLock<Governor>>, config: ServiceConfig) -> Self {
        Self { governor, config }
    }

    /// Start the runner; the returned handle stops or pauses it
    pub async fn start(self) -> RunnerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let running = Arc::new(RwLock::new(true));
        let running_clone = running.clone();

        let check_interval = Duration::from_secs(self.config.landing_check_interval_secs);
        let update_interval = Duration::from_secs(self.config.landing_update_interval_secs);
        let enable_updates = self.config.enable_landing_updates;
        let governor = self.governor;

        tokio::spawn(async move {
            let mut check_timer = interval(check_interval);
            let mut update_timer = interval(update_interval);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Background runner received shutdown signal");
                        break;
                    }
                    _ = check_timer.tick() => {
                        if *running_clone.read().await {
                            let report = governor
                                .write()
                                .await
                                .switch_low_budget_campaigns_to_landing_mode(Utc::now());
                            info!(
                                count = report.processed,
                                changed = report.changed,
                                skipped = report.skipped.len(),
                                operation = "sweep_low_budget",
                                "Landing-entry sweep complete"
                            );
                        }
                    }
                    _ = update_timer.tick() => {
                        if enable_updates && *running_clone.read().await {
                            let report = governor
                                .write()
                                .await
                                .update_campaigns_in_landing(Utc::now());
                            info!(
                                count = report.processed,
                                changed = report.changed,
                                skipped = report.skipped.len(),
                                operation = "sweep_landing_update",
                                "Landing-update sweep complete"
                            );
                        }
                    }
                }
            }

            info!("Background runner stopped");
        });

        RunnerHandle {
            shutdown_tx,
            running,
        }
    }
}

/// Handle to a running background runner
pub struct RunnerHandle {
    shutdown_tx: mpsc::Sender<()>,
    running: Arc<RwLock<bool>>,
}

impl RunnerHandle {
    /// Stop the runner for good
    pub async fn stop(self) {
        *self.running.write().await = false;
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Pause sweeps without tearing the runner down
    pub async fn pause(&self) {
        *self.running.write().await = false;
    }

    /// Resume sweeps
    pub async fn resume(&self) {
        *self.running.write().await = true;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
