// 1-minute load average sample

/// Non-negative, finite 1-minute load average read at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LoadSample(f64);

impl LoadSample {
    /// Returns `None` for negative or non-finite values.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}
