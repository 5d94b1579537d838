// Scanner tests: per-attempt timeouts, pool bound, real loopback listeners

use hostwatch::config::PortsConfig;
use hostwatch::scanner::{PortScanner, PortSource, ScannerConfig};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn scanner(range: std::ops::RangeInclusive<u16>, timeout_ms: u64, concurrency: usize) -> PortScanner {
    PortScanner::new(ScannerConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        range,
        connect_timeout: Duration::from_millis(timeout_ms),
        concurrency,
    })
}

#[tokio::test]
async fn test_scan_with_hung_odd_ports_still_completes() {
    let s = scanner(1..=10, 50, 4);
    let snapshot = s
        .scan_with(|port| async move {
            if port % 2 == 1 {
                std::future::pending::<()>().await;
            }
            true
        })
        .await;
    let ports: Vec<u16> = snapshot.iter().collect();
    assert_eq!(ports, vec![2, 4, 6, 8, 10]);
}

#[tokio::test]
async fn test_scan_with_refused_ports_are_absent() {
    let s = scanner(1..=20, 100, 8);
    let snapshot = s.scan_with(|port| async move { port == 7 || port == 13 }).await;
    assert_eq!(snapshot.iter().collect::<Vec<_>>(), vec![7, 13]);
}

#[tokio::test]
async fn test_scan_with_respects_concurrency_limit() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let s = scanner(1..=100, 1000, 5);
    let snapshot = s
        .scan_with(|_port| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                false
            }
        })
        .await;
    assert!(snapshot.is_empty());
    assert!(peak.load(Ordering::SeqCst) <= 5);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_scan_with_zero_concurrency_still_runs_every_attempt() {
    let s = scanner(1..=5, 100, 0);
    let snapshot = s.scan_with(|port| async move { port == 3 }).await;
    assert_eq!(snapshot.iter().collect::<Vec<_>>(), vec![3]);
}

#[tokio::test]
async fn test_scan_finds_loopback_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let s = scanner(port..=port, 1000, 1);
    let snapshot = s.snapshot().await;
    assert!(snapshot.contains(port));
    assert_eq!(snapshot.len(), 1);
}

#[tokio::test]
async fn test_scan_skips_closed_loopback_port() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let s = scanner(port..=port, 500, 1);
    let snapshot = s.scan().await;
    assert!(!snapshot.contains(port));
}

#[test]
fn test_scanner_config_from_ports_config() {
    let ports = PortsConfig {
        host: "::1".into(),
        range_start: 1000,
        range_end: 2000,
        connect_timeout_ms: 250,
        concurrency: 64,
        ..PortsConfig::default()
    };
    let config = ScannerConfig::from_ports_config(&ports).unwrap();
    assert_eq!(config.host, "::1".parse::<IpAddr>().unwrap());
    assert_eq!(config.range, 1000..=2000);
    assert_eq!(config.connect_timeout, Duration::from_millis(250));
    assert_eq!(config.concurrency, 64);
}

#[test]
fn test_scanner_config_default_covers_full_range() {
    let config = ScannerConfig::from_ports_config(&PortsConfig::default()).unwrap();
    assert_eq!(config.range, 1..=65535);
    assert_eq!(config.connect_timeout, Duration::from_secs(1));
}

#[test]
fn test_scanner_config_rejects_hostname() {
    let ports = PortsConfig {
        host: "localhost".into(),
        ..PortsConfig::default()
    };
    assert!(ScannerConfig::from_ports_config(&ports).is_err());
}
