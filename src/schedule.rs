// Cron-driven trigger shared by both watchers. Each cycle is awaited before the next fire
// time is computed, so cycles of one watcher never overlap; fire times that pass while a
// cycle is running are skipped.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Parse a 6/7-field cron expression (seconds first).
pub fn parse(expr: &str) -> anyhow::Result<cron::Schedule> {
    cron::Schedule::from_str(expr).map_err(|e| anyhow::anyhow!("invalid cron {:?}: {}", expr, e))
}

/// Runs `cycle` at each fire time of `schedule` (local time) until `shutdown` flips to true
/// or its sender is dropped. An in-flight cycle always runs to completion.
pub async fn run_scheduled<F, Fut>(
    name: &'static str,
    schedule: cron::Schedule,
    run_on_start: bool,
    mut shutdown: watch::Receiver<bool>,
    mut cycle: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    if run_on_start && !*shutdown.borrow() {
        debug!(watcher = name, "running startup cycle");
        cycle().await;
    }

    loop {
        if *shutdown.borrow() {
            break;
        }
        let now = chrono::Local::now();
        let Some(next) = schedule.after(&now).next() else {
            warn!(watcher = name, "schedule has no upcoming fire time; stopping");
            break;
        };
        let delay = (next - now).to_std().unwrap_or(Duration::from_millis(1));
        debug!(watcher = name, next = %next.to_rfc3339(), "next cycle scheduled");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                cycle().await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!(watcher = name, "scheduler shutting down");
}
