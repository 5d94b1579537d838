// Open-port snapshot and the per-port delta between two snapshots

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

/// Ports observed accepting a TCP connection at one instant.
/// Kept ordered so persistence and alert text come out sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSnapshot {
    ports: BTreeSet<u16>,
}

impl PortSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Ascending iteration.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    pub(crate) fn as_set(&self) -> &BTreeSet<u16> {
        &self.ports
    }
}

impl FromIterator<u16> for PortSnapshot {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self {
            ports: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    /// Present now, absent from the baseline.
    Opened,
    /// Present in the baseline, absent now.
    Closed,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortStatus::Opened => f.write_str("opened"),
            PortStatus::Closed => f.write_str("closed"),
        }
    }
}

/// Ports whose state changed between two snapshots. Unchanged ports are never present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortDelta {
    changes: BTreeMap<u16, PortStatus>,
}

impl PortDelta {
    pub fn get(&self, port: u16) -> Option<PortStatus> {
        self.changes.get(&port).copied()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Ascending by port.
    pub fn iter(&self) -> impl Iterator<Item = (u16, PortStatus)> + '_ {
        self.changes.iter().map(|(port, status)| (*port, *status))
    }

    pub fn opened(&self) -> impl Iterator<Item = u16> + '_ {
        self.iter()
            .filter(|(_, s)| *s == PortStatus::Opened)
            .map(|(p, _)| p)
    }

    pub fn closed(&self) -> impl Iterator<Item = u16> + '_ {
        self.iter()
            .filter(|(_, s)| *s == PortStatus::Closed)
            .map(|(p, _)| p)
    }
}

impl FromIterator<(u16, PortStatus)> for PortDelta {
    fn from_iter<I: IntoIterator<Item = (u16, PortStatus)>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}
