//! Hysteresis timers.

/// A saturating timer.
///
/// [`add`](Self::add) and [`subtract`](Self::subtract) move the value by at
/// most `max_delta` per call, and the value stays within `0..=max`. The
/// clock is "defined" while its value is positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateClock {
    value: f64,
    max: f64,
    max_delta: f64,
}

impl StateClock {
    pub const fn new(max: f64, max_delta: f64) -> Self {
        Self {
            value: 0.0,
            max,
            max_delta,
        }
    }

    pub fn clear(&mut self) {
        self.value = 0.0;
    }

    pub fn is_defined(&self) -> bool {
        self.value > 0.0
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn add(&mut self, dt: f64) {
        self.value = (self.value + dt.clamp(0.0, self.max_delta)).min(self.max);
    }

    pub fn subtract(&mut self, dt: f64) {
        self.value = (self.value - dt.clamp(0.0, self.max_delta)).max(0.0);
    }
}

/// Outcome of [`DeltaTime::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeStep {
    /// First sample, or too little time passed. Nothing to do yet.
    Skip,
    /// Seconds since the last accepted sample.
    Delta(f64),
    /// Time went backwards or jumped too far ahead.
    Warp,
}

/// Measures time between accepted samples.
///
/// Steps shorter than `min_delta` are not accepted and keep accumulating
/// until they are. A step backwards or longer than `warp_tolerance` is a
/// warp; the reference is dropped and the next sample seeds a new one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeltaTime {
    last: Option<f64>,
}

impl DeltaTime {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Time of the last accepted sample.
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn update(&mut self, now: f64, min_delta: f64, warp_tolerance: f64) -> TimeStep {
        let Some(last) = self.last else {
            self.last = Some(now);
            return TimeStep::Skip;
        };

        if now < last {
            self.last = None;
            return TimeStep::Warp;
        }

        let delta = now - last;
        if delta < min_delta {
            return TimeStep::Skip;
        }

        if delta > warp_tolerance {
            self.last = None;
            TimeStep::Warp
        } else {
            self.last = Some(now);
            TimeStep::Delta(delta)
        }
    }
}
