// Snapshot comparison: port set difference and load threshold check

use crate::models::{LoadSample, PortDelta, PortSnapshot, PortStatus};

/// Default 1-minute load threshold.
pub const DEFAULT_LOAD_THRESHOLD: f64 = 2.0;

/// Ports in `current` but not `previous` are opened; the reverse are closed.
/// Neither input is modified.
pub fn compare_ports(previous: &PortSnapshot, current: &PortSnapshot) -> PortDelta {
    let prev = previous.as_set();
    let curr = current.as_set();
    curr.difference(prev)
        .map(|&port| (port, PortStatus::Opened))
        .chain(prev.difference(curr).map(|&port| (port, PortStatus::Closed)))
        .collect()
}

/// Over-threshold load condition, carrying the sampled value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAlert {
    pub load: f64,
    pub threshold: f64,
}

/// `Some` only when the sample is strictly above `threshold`.
pub fn check_load(sample: LoadSample, threshold: f64) -> Option<LoadAlert> {
    (sample.value() > threshold).then_some(LoadAlert {
        load: sample.value(),
        threshold,
    })
}
