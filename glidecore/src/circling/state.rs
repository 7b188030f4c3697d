//! Circling state.

use super::mode::{Capture, CirclingMode, PhaseMark};

/// Turn rates, mode and climb statistics.
///
/// Mutated only by the [`CirclingDetector`](super::CirclingDetector),
/// once per tick. Turn rates, mode and the time and height statistics
/// only move while the aircraft is flying; on the ground the turn rates
/// read zero and the statistics hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CirclingState {
    /// Turn rate from ground track (deg/s).
    pub turn_rate: f64,
    /// Turn rate from heading (deg/s).
    pub turn_rate_heading: f64,
    /// Clamped and low-pass filtered track turn rate (deg/s).
    pub turn_rate_smoothed: f64,

    pub mode: CirclingMode,
    /// Smoothed turn rate above the circling threshold.
    pub turning: bool,
    /// Climb mode confirmed.
    pub circling: bool,

    /// Start of the current turn, or end of the last one.
    pub turn_start: Option<PhaseMark>,
    /// Start of the current or last climb; altitude includes energy height.
    pub climb_start: Option<PhaseMark>,
    /// Start of the current or last cruise.
    pub cruise_start: Option<PhaseMark>,

    /// Seconds spent circling while turning.
    pub time_climb: f64,
    /// Seconds spent otherwise.
    pub time_cruise: f64,
    /// `time_climb` as a percentage of the total.
    pub circling_percentage: f64,

    /// Height climbed while circling (m).
    pub total_height_gain: f64,
    /// Lowest navigation altitude while flying (m).
    pub min_altitude: Option<f64>,
    /// Largest height above `min_altitude` reached (m).
    pub max_height_gain: f64,
}

impl CirclingState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn turning_left(&self) -> bool {
        self.turn_rate_smoothed < 0.0
    }

    /// Record a capture from the mode machine.
    pub(crate) fn apply(&mut self, capture: &Capture) {
        match capture {
            Capture::TurnStart(mark) => self.turn_start = Some(*mark),
            Capture::ClimbConfirmed => {
                self.circling = true;
                self.climb_start = self.turn_start.map(|start| PhaseMark {
                    altitude: start.altitude.map(|altitude| altitude + start.energy_height),
                    ..start
                });
            }
            Capture::CruiseConfirmed => {
                self.circling = false;
                self.cruise_start = self.turn_start;
            }
        }
    }
}
