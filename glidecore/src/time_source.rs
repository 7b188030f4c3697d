//! Monotonic clock sources.
//!
//! Every [`Snapshot`](crate::snapshot::Snapshot) stamps its fields with a
//! monotonic clock reading in seconds. The reading comes from a
//! [`TimeSource`] so that the blackboard can run on the wall clock in
//! production and on a hand-driven clock in tests and offline replay.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

/// A monotonic clock in seconds with an undefined reference point.
pub trait TimeSource: Send + Sync {
    /// Current reading in seconds. Never decreases.
    fn now(&self) -> f64;
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicTimeSource {
    epoch: Instant,
}

impl MonotonicTimeSource {
    /// Create a clock whose zero is "now".
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Hand-driven time source.
///
/// Cloning shares the underlying clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Arc<Mutex<f64>>,
}

impl ManualTimeSource {
    /// Create a clock starting at `start` seconds.
    pub fn new(start: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock. Negative steps are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            *self.now.lock() += seconds;
        }
    }

    /// Jump to an absolute reading, if it is not in the past.
    pub fn set(&self, seconds: f64) {
        let mut now = self.now.lock();
        if seconds > *now {
            *now = seconds;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_source_advances() {
        let clock = ManualTimeSource::new(100.0);
        clock.advance(2.5);
        assert_eq!(clock.now(), 102.5);
    }

    #[test]
    fn test_manual_time_source_never_goes_back() {
        let clock = ManualTimeSource::new(100.0);
        clock.advance(-5.0);
        clock.set(50.0);
        assert_eq!(clock.now(), 100.0);
    }

    #[test]
    fn test_manual_time_source_clones_share_state() {
        let clock = ManualTimeSource::new(0.0);
        let other = clock.clone();
        other.advance(1.0);
        assert_eq!(clock.now(), 1.0);
    }

    #[test]
    fn test_monotonic_time_source_is_monotonic() {
        let clock = MonotonicTimeSource::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
