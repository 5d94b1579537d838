// TCP connect scan of the local host.
// Attempts run through a bounded pool; each one is individually timeout-bounded and a
// failed attempt only means the port is absent. The snapshot is built once every attempt
// has resolved.

use crate::config::PortsConfig;
use crate::models::PortSnapshot;
use futures_util::StreamExt;
use futures_util::stream;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument};

/// Produces the current port snapshot for one cycle.
pub trait PortSource: Send + Sync {
    fn snapshot(&self) -> impl Future<Output = PortSnapshot> + Send;
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub host: IpAddr,
    pub range: RangeInclusive<u16>,
    pub connect_timeout: Duration,
    pub concurrency: usize,
}

impl ScannerConfig {
    pub fn from_ports_config(config: &PortsConfig) -> anyhow::Result<Self> {
        let host: IpAddr = config
            .host
            .parse()
            .map_err(|e| anyhow::anyhow!("ports.host {:?}: {}", config.host, e))?;
        Ok(Self {
            host,
            range: config.range_start..=config.range_end,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            concurrency: config.concurrency,
        })
    }
}

pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Connect scan of every port in the configured range.
    #[instrument(skip(self), fields(host = %self.config.host, concurrency = self.config.concurrency))]
    pub async fn scan(&self) -> PortSnapshot {
        let host = self.config.host;
        self.scan_with(move |port| connect(SocketAddr::new(host, port)))
            .await
    }

    /// Runs `check` for every port in range through the pool. `check` resolving to `true`
    /// marks the port open; `false`, or not resolving within the connect timeout, leaves it out.
    pub async fn scan_with<F, Fut>(&self, check: F) -> PortSnapshot
    where
        F: Fn(u16) -> Fut,
        Fut: Future<Output = bool>,
    {
        let started = Instant::now();
        let timeout = self.config.connect_timeout;
        let range = self.config.range.clone();
        let attempts = range.len();

        let open: Vec<u16> = stream::iter(range)
            .map(move |port| {
                let attempt = check(port);
                async move {
                    match tokio::time::timeout(timeout, attempt).await {
                        Ok(true) => Some(port),
                        Ok(false) => None,
                        Err(_) => {
                            debug!(port, "connect attempt timed out");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .filter_map(std::future::ready)
            .collect()
            .await;

        let snapshot: PortSnapshot = open.into_iter().collect();
        info!(
            operation = "scan_ports",
            attempts,
            open_ports = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "port scan complete"
        );
        snapshot
    }
}

impl PortSource for PortScanner {
    async fn snapshot(&self) -> PortSnapshot {
        self.scan().await
    }
}

/// The stream is dropped (closed) right away; nothing is exchanged.
/// A loopback connect whose kernel-chosen source port equals the target port ends up
/// connected to itself; nothing listens there, so the port counts as closed.
async fn connect(addr: SocketAddr) -> bool {
    let Ok(stream) = TcpStream::connect(addr).await else {
        return false;
    };
    match (stream.local_addr(), stream.peer_addr()) {
        (Ok(local), Ok(peer)) if local == peer => {
            debug!(port = addr.port(), "self-connect; port not open");
            false
        }
        (Ok(_), Ok(_)) => true,
        _ => false,
    }
}
