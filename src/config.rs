use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ports: PortsConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub alert: AlertConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortsConfig {
    /// Cron expression (seconds first, local time). Default: top of every hour.
    #[serde(default = "default_ports_schedule")]
    pub schedule: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_range_start")]
    pub range_start: u16,
    #[serde(default = "default_range_end")]
    pub range_end: u16,
    /// Per-attempt connect timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Max connection attempts in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_state_path")]
    pub state_path: String,
    #[serde(default)]
    pub run_on_start: bool,
    /// Abandon a cycle (baseline untouched) when the scan takes longer than this.
    #[serde(default)]
    pub cycle_timeout_secs: Option<u64>,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            schedule: default_ports_schedule(),
            host: default_host(),
            range_start: default_range_start(),
            range_end: default_range_end(),
            connect_timeout_ms: default_connect_timeout_ms(),
            concurrency: default_concurrency(),
            state_path: default_state_path(),
            run_on_start: false,
            cycle_timeout_secs: None,
        }
    }
}

fn default_ports_schedule() -> String {
    "0 0 * * * *".into()
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_range_start() -> u16 {
    1
}

fn default_range_end() -> u16 {
    u16::MAX
}

fn default_connect_timeout_ms() -> u64 {
    1000
}

fn default_concurrency() -> usize {
    512
}

fn default_state_path() -> String {
    "ports.txt".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Cron expression (seconds first, local time). Default: every minute.
    #[serde(default = "default_load_schedule")]
    pub schedule: String,
    #[serde(default = "default_source_path")]
    pub source_path: String,
    /// Alert when the 1-minute load average is strictly above this.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub run_on_start: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            schedule: default_load_schedule(),
            source_path: default_source_path(),
            threshold: default_threshold(),
            run_on_start: false,
        }
    }
}

fn default_load_schedule() -> String {
    "0 * * * * *".into()
}

fn default_source_path() -> String {
    "/proc/loadavg".into()
}

fn default_threshold() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// DingTalk robot webhook. Alerts only go to the log when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Robot signing secret; requests are sent unsigned when unset.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_alert_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            secret: None,
            timeout_secs: default_alert_timeout_secs(),
        }
    }
}

fn default_alert_timeout_secs() -> u64 {
    5
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            cron::Schedule::from_str(&self.ports.schedule).is_ok(),
            "ports.schedule is not a valid cron expression: {:?}",
            self.ports.schedule
        );
        anyhow::ensure!(
            self.ports.host.parse::<std::net::IpAddr>().is_ok(),
            "ports.host must be an IP address, got {:?}",
            self.ports.host
        );
        anyhow::ensure!(
            self.ports.range_start > 0,
            "ports.range_start must be between 1 and 65535, got {}",
            self.ports.range_start
        );
        anyhow::ensure!(
            self.ports.range_start <= self.ports.range_end,
            "ports.range_start ({}) must not exceed ports.range_end ({})",
            self.ports.range_start,
            self.ports.range_end
        );
        anyhow::ensure!(
            self.ports.connect_timeout_ms > 0,
            "ports.connect_timeout_ms must be > 0, got {}",
            self.ports.connect_timeout_ms
        );
        anyhow::ensure!(
            self.ports.concurrency > 0,
            "ports.concurrency must be > 0, got {}",
            self.ports.concurrency
        );
        anyhow::ensure!(
            !self.ports.state_path.is_empty(),
            "ports.state_path must be non-empty"
        );
        if let Some(secs) = self.ports.cycle_timeout_secs {
            anyhow::ensure!(
                secs > 0,
                "ports.cycle_timeout_secs must be > 0 when set, got {}",
                secs
            );
        }
        anyhow::ensure!(
            cron::Schedule::from_str(&self.load.schedule).is_ok(),
            "load.schedule is not a valid cron expression: {:?}",
            self.load.schedule
        );
        anyhow::ensure!(
            !self.load.source_path.is_empty(),
            "load.source_path must be non-empty"
        );
        anyhow::ensure!(
            self.load.threshold.is_finite() && self.load.threshold >= 0.0,
            "load.threshold must be a finite value >= 0, got {}",
            self.load.threshold
        );
        if let Some(url) = &self.alert.webhook_url {
            anyhow::ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "alert.webhook_url must start with http:// or https://, got {:?}",
                url
            );
        }
        anyhow::ensure!(
            self.alert.timeout_secs > 0,
            "alert.timeout_secs must be > 0, got {}",
            self.alert.timeout_secs
        );
        Ok(())
    }
}
