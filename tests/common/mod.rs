// Shared test helpers: scripted port source and recording notifiers

#![allow(dead_code)]

use hostwatch::alert::{DeliveryError, Notifier};
use hostwatch::models::{Alert, PortSnapshot};
use hostwatch::scanner::PortSource;
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn snapshot(ports: &[u16]) -> PortSnapshot {
    ports.iter().copied().collect()
}

/// Returns queued snapshots in order, then empty snapshots.
pub struct ScriptedSource {
    snapshots: Mutex<VecDeque<PortSnapshot>>,
}

impl ScriptedSource {
    pub fn new(snapshots: Vec<PortSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
        }
    }
}

impl PortSource for ScriptedSource {
    async fn snapshot(&self) -> PortSnapshot {
        self.snapshots
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
    }
}

/// Never resolves; for cycle timeout tests.
pub struct HangingSource;

impl PortSource for HangingSource {
    async fn snapshot(&self) -> PortSnapshot {
        std::future::pending().await
    }
}

/// Records every alert; optionally fails delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.fail {
            return Err(DeliveryError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }
}
