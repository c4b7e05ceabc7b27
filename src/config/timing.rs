//! Probe timing and its normalization policy.
//!
//! Out-of-range values are never an error. The policy is:
//! - `timeout` in `10..=65535` ms is used as-is, anything else becomes 1000 ms.
//! - `tick` in `10..=65535` ms is used as-is, anything else becomes 100 ms.
//! - A tick longer than the timeout is cut down to the timeout.

use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Validated connect timeout and polling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeTiming {
    timeout_ms: u64,
    tick_ms: u64,
}

impl ProbeTiming {
    /// Smallest accepted timeout or tick.
    pub const MIN_MS: u64 = 10;
    /// Largest accepted timeout or tick.
    pub const MAX_MS: u64 = 65535;
    /// Timeout substituted for an out-of-range value.
    pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
    /// Tick substituted for an out-of-range value.
    pub const DEFAULT_TICK_MS: u64 = 100;

    /// Apply the normalization policy to caller-supplied values.
    pub fn normalize(timeout_ms: u64, tick_ms: u64) -> Self {
        let timeout_ms = if Self::in_range(timeout_ms) {
            timeout_ms
        } else {
            warn!(
                "timeout {} ms outside {}..={}, using {} ms",
                timeout_ms,
                Self::MIN_MS,
                Self::MAX_MS,
                Self::DEFAULT_TIMEOUT_MS
            );
            Self::DEFAULT_TIMEOUT_MS
        };

        let tick_ms = if Self::in_range(tick_ms) {
            tick_ms
        } else {
            warn!(
                "tick {} ms outside {}..={}, using {} ms",
                tick_ms,
                Self::MIN_MS,
                Self::MAX_MS,
                Self::DEFAULT_TICK_MS
            );
            Self::DEFAULT_TICK_MS
        };

        Self {
            timeout_ms,
            tick_ms: tick_ms.min(timeout_ms),
        }
    }

    fn in_range(ms: u64) -> bool {
        (Self::MIN_MS..=Self::MAX_MS).contains(&ms)
    }

    /// Per-probe deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval while a connection attempt is pending.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Gap between two successive dispatches: a tenth of a tick.
    pub fn dispatch_gap(&self) -> Duration {
        Duration::from_millis(self.tick_ms / 10)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }
}

impl Default for ProbeTiming {
    fn default() -> Self {
        Self {
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            tick_ms: Self::DEFAULT_TICK_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_values_are_kept() {
        let timing = ProbeTiming::normalize(250, 25);
        assert_eq!(timing.timeout_ms(), 250);
        assert_eq!(timing.tick_ms(), 25);
        assert_eq!(timing.dispatch_gap(), Duration::from_millis(2));
    }

    #[test]
    fn test_out_of_range_values_use_defaults() {
        let timing = ProbeTiming::normalize(0, 70000);
        assert_eq!(timing, ProbeTiming::default());

        let timing = ProbeTiming::normalize(5, 9);
        assert_eq!(timing.timeout_ms(), 1000);
        assert_eq!(timing.tick_ms(), 100);
    }

    #[test]
    fn test_tick_never_exceeds_timeout() {
        let timing = ProbeTiming::normalize(50, 100);
        assert_eq!(timing.tick_ms(), 50);
        assert!(timing.tick() <= timing.timeout());
    }
}
