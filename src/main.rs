use anyhow::Result;
use hostwatch::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "{} starting",
        env!("CARGO_PKG_NAME")
    );

    let app_config = config::AppConfig::load()?;
    let notifier = Arc::new(alert::Dispatcher::from_config(&app_config.alert)?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scanner = scanner::PortScanner::new(scanner::ScannerConfig::from_ports_config(
        &app_config.ports,
    )?);
    let port_worker = Arc::new(
        port_worker::PortWorker::restore(
            scanner,
            state_repo::StateRepo::new(&app_config.ports.state_path),
            notifier.clone(),
        )
        .await
        .with_cycle_timeout(app_config.ports.cycle_timeout_secs.map(Duration::from_secs)),
    );
    let port_handle = port_worker::spawn(
        port_worker,
        schedule::parse(&app_config.ports.schedule)?,
        app_config.ports.run_on_start,
        shutdown_rx.clone(),
    );

    let load_worker = Arc::new(load_worker::LoadWorker::new(
        loadavg_repo::LoadavgRepo::new(&app_config.load.source_path),
        app_config.load.threshold,
        notifier,
    ));
    let load_handle = load_worker::spawn(
        load_worker,
        schedule::parse(&app_config.load.schedule)?,
        app_config.load.run_on_start,
        shutdown_rx,
    );

    tracing::info!(
        ports_schedule = %app_config.ports.schedule,
        load_schedule = %app_config.load.schedule,
        "watchers started"
    );

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    tracing::info!("Received shutdown signal; waiting for in-flight cycles");
    let _ = shutdown_tx.send(true);
    let _ = port_handle.await;
    let _ = load_handle.await;
    Ok(())
}
