// Alert text for port changes and load threshold breaches

use crate::diff::LoadAlert;
use crate::models::PortDelta;
use std::fmt::Write;

/// One header line, then `port N: opened|closed` per change, ascending.
pub fn port_change_message(delta: &PortDelta) -> String {
    let mut msg = String::from("Port change alert:\n");
    for (port, status) in delta.iter() {
        let _ = writeln!(msg, "port {}: {}", port, status);
    }
    msg
}

pub fn load_message(alert: &LoadAlert) -> String {
    format!(
        "System load alert: current load is {:.2} (threshold {:.2})",
        alert.load, alert.threshold
    )
}
