// Alert delivery. The watchers only see the Notifier trait; delivery failures are
// reported back for logging and never retried.

mod dingtalk;
mod message;

pub use dingtalk::{DingTalkNotifier, sign};
pub use message::{load_message, port_change_message};

use crate::config::AlertConfig;
use crate::models::Alert;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("webhook returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("webhook rejected message (errcode {code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("failed to sign webhook request: {0}")]
    Signing(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &Alert) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Writes alerts to the log only; used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError> {
        warn!(
            timestamp = %alert.timestamp.to_rfc3339(),
            message = %alert.message,
            "alert"
        );
        Ok(())
    }
}

/// Notifier selected from [alert] config.
pub enum Dispatcher {
    DingTalk(DingTalkNotifier),
    Log(LogNotifier),
}

impl Dispatcher {
    pub fn from_config(config: &AlertConfig) -> anyhow::Result<Self> {
        match &config.webhook_url {
            Some(url) => {
                let notifier = DingTalkNotifier::new(
                    url.clone(),
                    config.secret.clone(),
                    Duration::from_secs(config.timeout_secs),
                )?;
                Ok(Dispatcher::DingTalk(notifier))
            }
            None => {
                info!("alert.webhook_url not set; alerts go to the log only");
                Ok(Dispatcher::Log(LogNotifier))
            }
        }
    }
}

impl Notifier for Dispatcher {
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError> {
        match self {
            Dispatcher::DingTalk(n) => n.notify(alert).await,
            Dispatcher::Log(n) => n.notify(alert).await,
        }
    }
}

/// Sends `alert` and logs the outcome. Returns whether delivery succeeded.
pub async fn deliver<N: Notifier>(notifier: &N, alert: &Alert, kind: &'static str) -> bool {
    match notifier.notify(alert).await {
        Ok(()) => {
            info!(operation = "send_alert", kind, "alert delivered");
            true
        }
        Err(e) => {
            warn!(error = %e, operation = "send_alert", kind, "alert delivery failed");
            false
        }
    }
}
