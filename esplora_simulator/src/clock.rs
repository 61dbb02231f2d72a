//! Virtual simulation clock

use std::time::Duration;

use crate::pin_bank::PinBank;

/// Monotonic microsecond counter. Moves only when asked to; never reads wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    elapsed_us: u64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `delta_us` and age the pins' countdowns by the same amount.
    ///
    /// Returns the number of countdowns that expired during this tick.
    pub fn advance(&mut self, delta_us: u64, pins: &mut PinBank) -> usize {
        self.elapsed_us = self.elapsed_us.saturating_add(delta_us);
        let expired = pins.sweep_countdowns(delta_us);
        tracing::trace!(delta_us, elapsed_us = self.elapsed_us, expired, "clock advanced");
        expired
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_us)
    }
}
