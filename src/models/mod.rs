// Domain models: port snapshots, deltas, load samples, alerts

mod alert;
mod load;
mod ports;

pub use alert::Alert;
pub use load::LoadSample;
pub use ports::{PortDelta, PortSnapshot, PortStatus};
