// Port exposure cycle: scan, diff against the baseline, alert on changes, persist.
// The baseline is owned here; it is restored from the state file at startup and
// replaced in memory at the end of every completed cycle.

use crate::alert::{self, Notifier, port_change_message};
use crate::diff::compare_ports;
use crate::models::{Alert, PortDelta, PortSnapshot};
use crate::scanner::PortSource;
use crate::schedule;
use crate::state_repo::StateRepo;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("port scan did not finish within {0:?}; baseline left unchanged")]
    TimedOut(Duration),
}

/// What one completed cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct PortCycleReport {
    pub open_ports: usize,
    /// `None` when there was no baseline to compare against.
    pub delta: Option<PortDelta>,
    pub alerted: bool,
    pub delivered: bool,
    pub persisted: bool,
}

pub struct PortWorker<S, N> {
    source: S,
    state_repo: StateRepo,
    notifier: Arc<N>,
    baseline: Mutex<PortSnapshot>,
    cycle_timeout: Option<Duration>,
}

impl<S: PortSource, N: Notifier> PortWorker<S, N> {
    /// Builds the worker, seeding the baseline from the state file. A missing or unreadable
    /// file means no baseline (the first cycle only records).
    pub async fn restore(source: S, state_repo: StateRepo, notifier: Arc<N>) -> Self {
        let baseline = match state_repo.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    path = %state_repo.path().display(),
                    ports = snapshot.len(),
                    "restored port baseline"
                );
                snapshot
            }
            Ok(None) => {
                info!(
                    path = %state_repo.path().display(),
                    "no saved port baseline; first cycle will only record"
                );
                PortSnapshot::new()
            }
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "load_ports",
                    "failed to restore port baseline; starting without one"
                );
                PortSnapshot::new()
            }
        };
        Self {
            source,
            state_repo,
            notifier,
            baseline: Mutex::new(baseline),
            cycle_timeout: None,
        }
    }

    /// Bound the scan of each cycle.
    pub fn with_cycle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    pub async fn baseline(&self) -> PortSnapshot {
        self.baseline.lock().await.clone()
    }

    /// One full cycle. Holding the baseline lock for the whole cycle serializes cycles.
    #[instrument(skip(self), fields(watcher = "ports"))]
    pub async fn run_cycle(&self) -> Result<PortCycleReport, CycleError> {
        let mut baseline = self.baseline.lock().await;

        let current = match self.cycle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.snapshot())
                .await
                .map_err(|_| CycleError::TimedOut(limit))?,
            None => self.source.snapshot().await,
        };

        let delta = if baseline.is_empty() {
            debug!("no baseline yet; skipping comparison");
            None
        } else {
            Some(compare_ports(&baseline, &current))
        };

        let mut alerted = false;
        let mut delivered = false;
        if let Some(delta) = delta.as_ref().filter(|d| !d.is_empty()) {
            info!(
                opened = delta.opened().count(),
                closed = delta.closed().count(),
                "port exposure changed"
            );
            let alert = Alert::new(port_change_message(delta));
            alerted = true;
            delivered = alert::deliver(self.notifier.as_ref(), &alert, "ports").await;
        }

        let persisted = match self.state_repo.save(&current).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, operation = "save_ports", "failed to persist port baseline");
                false
            }
        };

        let report = PortCycleReport {
            open_ports: current.len(),
            delta,
            alerted,
            delivered,
            persisted,
        };
        *baseline = current;
        Ok(report)
    }
}

/// Spawns the scheduled port watcher.
pub fn spawn<S, N>(
    worker: Arc<PortWorker<S, N>>,
    schedule: cron::Schedule,
    run_on_start: bool,
    shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()>
where
    S: PortSource + 'static,
    N: Notifier + 'static,
{
    tokio::spawn(async move {
        schedule::run_scheduled("ports", schedule, run_on_start, shutdown_rx, || {
            let worker = worker.clone();
            async move {
                match worker.run_cycle().await {
                    Ok(report) => info!(
                        open_ports = report.open_ports,
                        changes = report.delta.as_ref().map(PortDelta::len),
                        alerted = report.alerted,
                        persisted = report.persisted,
                        "port cycle complete"
                    ),
                    Err(e) => warn!(error = %e, "port cycle aborted"),
                }
            }
        })
        .await;
    })
}
