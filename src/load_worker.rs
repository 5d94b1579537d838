// Load cycle: read one sample, alert when it is strictly above the threshold.
// A read failure ends the cycle without an alert; nothing is carried between cycles.

use crate::alert::{self, Notifier, load_message};
use crate::diff::check_load;
use crate::loadavg_repo::{LoadavgRepo, ProbeReadError};
use crate::models::Alert;
use crate::schedule;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadCycleReport {
    Normal { load: f64 },
    Alerted { load: f64, delivered: bool },
}

pub struct LoadWorker<N> {
    repo: LoadavgRepo,
    threshold: f64,
    notifier: Arc<N>,
}

impl<N: Notifier> LoadWorker<N> {
    pub fn new(repo: LoadavgRepo, threshold: f64, notifier: Arc<N>) -> Self {
        Self {
            repo,
            threshold,
            notifier,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[instrument(skip(self), fields(watcher = "load", threshold = self.threshold))]
    pub async fn run_cycle(&self) -> Result<LoadCycleReport, ProbeReadError> {
        let sample = self.repo.read_sample().await?;
        info!(load = %format!("{:.2}", sample.value()), "current load");

        let Some(over) = check_load(sample, self.threshold) else {
            return Ok(LoadCycleReport::Normal {
                load: sample.value(),
            });
        };
        let alert = Alert::new(load_message(&over));
        let delivered = alert::deliver(self.notifier.as_ref(), &alert, "load").await;
        Ok(LoadCycleReport::Alerted {
            load: over.load,
            delivered,
        })
    }
}

/// Spawns the scheduled load watcher.
pub fn spawn<N>(
    worker: Arc<LoadWorker<N>>,
    schedule: cron::Schedule,
    run_on_start: bool,
    shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()>
where
    N: Notifier + 'static,
{
    tokio::spawn(async move {
        schedule::run_scheduled("load", schedule, run_on_start, shutdown_rx, || {
            let worker = worker.clone();
            async move {
                if let Err(e) = worker.run_cycle().await {
                    warn!(
                        error = %e,
                        operation = "read_load",
                        "failed to read system load; skipping cycle"
                    );
                }
            }
        })
        .await;
    })
}
