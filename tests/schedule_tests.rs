// Scheduler tests: startup cycle, shutdown, cron parsing

use hostwatch::schedule::{parse, run_scheduled};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

#[test]
fn test_parse_accepts_seconds_field() {
    assert!(parse("0 0 * * * *").is_ok());
    assert!(parse("0 * * * * *").is_ok());
}

#[test]
fn test_parse_rejects_garbage() {
    let err = parse("every hour").unwrap_err();
    assert!(err.to_string().contains("every hour"));
}

#[tokio::test]
async fn test_run_on_start_fires_before_first_tick_and_shutdown_stops() {
    let runs = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    // Once a year: only the startup cycle can run during the test.
    let schedule = parse("0 0 0 1 1 *").unwrap();

    let counter = runs.clone();
    let handle = tokio::spawn(async move {
        run_scheduled("test", schedule, true, shutdown_rx, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler should stop on shutdown")
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropped_shutdown_sender_stops_scheduler() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let schedule = parse("0 0 0 1 1 *").unwrap();
    let handle = tokio::spawn(run_scheduled(
        "test",
        schedule,
        false,
        shutdown_rx,
        || async {},
    ));
    drop(shutdown_tx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler should stop when sender is dropped")
        .unwrap();
}

#[tokio::test]
async fn test_cycles_fire_on_schedule_without_overlap() {
    let runs = Arc::new(AtomicUsize::new(0));
    let active = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let schedule = parse("* * * * * *").unwrap();

    let (r, a, o) = (runs.clone(), active.clone(), overlapped.clone());
    let handle = tokio::spawn(async move {
        run_scheduled("test", schedule, false, shutdown_rx, || {
            let (r, a, o) = (r.clone(), a.clone(), o.clone());
            async move {
                if a.fetch_add(1, Ordering::SeqCst) > 0 {
                    o.fetch_add(1, Ordering::SeqCst);
                }
                // Longer than the 1s cadence.
                tokio::time::sleep(Duration::from_millis(1500)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                r.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;
    });

    tokio::time::sleep(Duration::from_millis(4200)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(runs.load(Ordering::SeqCst) >= 1);
    assert_eq!(overlapped.load(Ordering::SeqCst), 0);
}
