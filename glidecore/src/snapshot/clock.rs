//! GPS time normalization.

use super::info::Snapshot;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A regression larger than this is treated as a midnight rollover.
const MIDNIGHT_ROLLOVER_THRESHOLD: f64 = SECONDS_PER_DAY / 2.0;

/// Keeps the GPS time of a merged stream monotonic and moving.
///
/// A source whose time of day wraps at midnight gets a day added to its
/// offset. Any other backwards step (receiver restart, device swap, replay
/// rewind) is folded into the offset as well: the time continues from the
/// last value handed downstream, advanced by the monotonic clock time that
/// passed since then.
#[derive(Debug, Clone, Default)]
pub struct ClockNormalizer {
    last_time: Option<f64>,
    last_stamp: f64,
    offset: f64,
}

impl ClockNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all history, e.g. when a new replay starts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Normalize the time field of `snapshot` in place.
    ///
    /// Returns `true` if a regression was absorbed.
    pub fn normalize(&mut self, snapshot: &mut Snapshot) -> bool {
        let Some(stamp) = snapshot.time.stamp() else {
            return false;
        };
        let raw = *snapshot.time.raw();
        let mut time = raw + self.offset;

        let mut absorbed = false;
        if let Some(last) = self.last_time {
            if last - time > MIDNIGHT_ROLLOVER_THRESHOLD {
                self.offset += SECONDS_PER_DAY;
                time += SECONDS_PER_DAY;
                tracing::debug!(offset = self.offset, "GPS time rolled over midnight");
            }
            if time < last {
                let elapsed = (stamp - self.last_stamp).max(0.0);
                self.offset += last + elapsed - time;
                time = raw + self.offset;
                absorbed = true;
                tracing::debug!(raw, time, offset = self.offset, "Absorbed GPS time regression");
            }
        }

        self.last_time = Some(time);
        self.last_stamp = stamp;
        snapshot.time.set(time, stamp);
        absorbed
    }

    /// Last time handed downstream.
    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }
}
