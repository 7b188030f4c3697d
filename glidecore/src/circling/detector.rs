//! Turn rate and circling detection.

use crate::flight::FlyingState;
use crate::geo::delta_degrees;
use crate::snapshot::Snapshot;

use super::mode::{transition, Capture, ForcedMode, PhaseMark, SwitchDelays};
use super::state::CirclingState;

/// Largest plausible turn rate (deg/s); anything beyond is a GPS glitch.
const MAX_TURN_RATE: f64 = 50.0;

/// Weight of a new turn rate sample in the low-pass filter.
const TURN_RATE_FILTER: f64 = 0.3;

/// Tuning of the circling detector.
#[derive(Debug, Clone, PartialEq)]
pub struct CirclingConfig {
    /// Let a connected switch box force circling or cruise mode.
    pub external_trigger_cruise: bool,
    /// Smoothed turn rate that counts as turning (deg/s).
    pub min_turn_rate: f64,
    /// Turning time needed to confirm a climb (s).
    pub cruise_climb_switch_secs: f64,
    /// Straight flight needed to confirm cruise (s).
    pub climb_cruise_switch_secs: f64,
}

impl Default for CirclingConfig {
    fn default() -> Self {
        Self {
            external_trigger_cruise: false,
            min_turn_rate: 4.0,
            cruise_climb_switch_secs: 15.0,
            climb_cruise_switch_secs: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LastSample {
    time: f64,
    track: Option<f64>,
    heading: Option<f64>,
}

/// Detects circling from the ground track.
#[derive(Debug, Clone, Default)]
pub struct CirclingDetector {
    config: CirclingConfig,
    last: Option<LastSample>,
}

impl CirclingDetector {
    pub fn new(config: CirclingConfig) -> Self {
        Self { config, last: None }
    }

    pub fn config(&self) -> &CirclingConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Process one tick.
    ///
    /// `energy_height` is the kinetic energy expressed as height and `vario`
    /// the brutto climb rate, both from the per-tick derived values.
    pub fn compute(
        &mut self,
        basic: &Snapshot,
        energy_height: f64,
        vario: Option<f64>,
        flying: &FlyingState,
        state: &mut CirclingState,
    ) {
        let Some(time) = basic.time.value() else {
            self.clear_turn_rate(state);
            self.last = None;
            return;
        };

        let track = basic.track.value();
        let heading = basic.heading_or_track();
        let dt = self
            .last
            .map(|last| time - last.time)
            .filter(|dt| *dt > 0.0);

        match (self.last, dt) {
            _ if !flying.flying => self.clear_turn_rate(state),
            (Some(last), Some(dt)) => {
                self.update_turn_rate(state, &last, track, heading, dt);
                self.update_mode(basic, time, energy_height, state);
                self.update_statistics(state, dt, vario);
            }
            (None, _) => self.clear_turn_rate(state),
            (Some(_), None) => {}
        }

        if flying.flying {
            if let Some(altitude) = basic.nav_altitude() {
                self.update_height_gain(state, altitude);
            }
        }

        self.last = Some(LastSample { time, track, heading });
    }

    fn clear_turn_rate(&self, state: &mut CirclingState) {
        state.turn_rate = 0.0;
        state.turn_rate_heading = 0.0;
        state.turn_rate_smoothed = 0.0;
    }

    fn update_turn_rate(
        &self,
        state: &mut CirclingState,
        last: &LastSample,
        track: Option<f64>,
        heading: Option<f64>,
        dt: f64,
    ) {
        let rate = |from: Option<f64>, to: Option<f64>| match (from, to) {
            (Some(from), Some(to)) => delta_degrees(from, to) / dt,
            _ => 0.0,
        };

        state.turn_rate = rate(last.track, track);
        state.turn_rate_heading = rate(last.heading, heading);

        let clamped = state.turn_rate.clamp(-MAX_TURN_RATE, MAX_TURN_RATE);
        state.turn_rate_smoothed =
            state.turn_rate_smoothed + TURN_RATE_FILTER * (clamped - state.turn_rate_smoothed);
    }

    fn update_mode(&self, basic: &Snapshot, time: f64, energy_height: f64, state: &mut CirclingState) {
        state.turning = state.turn_rate_smoothed.abs() >= self.config.min_turn_rate;

        let force = match basic.switch_state.value() {
            Some(switches) if self.config.external_trigger_cruise && !basic.replay => {
                ForcedMode::from_switch(switches.flight_mode)
            }
            _ => ForcedMode::None,
        };

        let now = PhaseMark {
            time,
            location: basic.location.value(),
            altitude: basic.nav_altitude(),
            energy_height,
        };
        let delays = SwitchDelays {
            cruise_climb: self.config.cruise_climb_switch_secs,
            climb_cruise: self.config.climb_cruise_switch_secs,
        };

        let step = transition(
            state.mode,
            state.turning,
            force,
            &now,
            state.turn_start.map(|start| start.time),
            delays,
        );

        for capture in &step.captures {
            state.apply(capture);
            match capture {
                Capture::ClimbConfirmed => {
                    tracing::info!(time, turn_rate = state.turn_rate_smoothed, "Circling started");
                }
                Capture::CruiseConfirmed => {
                    tracing::info!(time, "Circling ended");
                }
                Capture::TurnStart(_) => {}
            }
        }

        if step.mode != state.mode {
            tracing::debug!(from = %state.mode, to = %step.mode, "Circling mode changed");
        }
        state.mode = step.mode;
    }

    fn update_statistics(&self, state: &mut CirclingState, dt: f64, vario: Option<f64>) {
        if state.circling && state.turning {
            state.time_climb += dt;
            if let Some(vario) = vario {
                state.total_height_gain += vario * dt;
            }
        } else {
            state.time_cruise += dt;
        }

        let total = state.time_climb + state.time_cruise;
        state.circling_percentage = if total > 1.0 {
            100.0 * state.time_climb / total
        } else {
            0.0
        };
    }

    fn update_height_gain(&self, state: &mut CirclingState, altitude: f64) {
        match state.min_altitude {
            Some(min) => {
                state.max_height_gain = state.max_height_gain.max(altitude - min);
                state.min_altitude = Some(min.min(altitude));
            }
            None => state.min_altitude = Some(altitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circling::CirclingMode;
    use crate::snapshot::{FlightModeSwitch, SwitchState};

    fn flying() -> FlyingState {
        FlyingState {
            flying: true,
            ..Default::default()
        }
    }

    fn sample(time: f64, track: f64, altitude: f64) -> Snapshot {
        let mut snapshot = Snapshot::new(time);
        snapshot.mark_alive();
        snapshot.provide_time(time);
        snapshot.provide_track_and_speed(track, 25.0);
        snapshot.provide_gps_altitude(altitude);
        snapshot
    }

    /// Circle at `rate` deg/s for `seconds`, starting at `start`.
    fn circle(
        detector: &mut CirclingDetector,
        state: &mut CirclingState,
        flying: &FlyingState,
        start: u32,
        seconds: u32,
        rate: f64,
    ) {
        for t in start..start + seconds {
            let snapshot = sample(t as f64, rate * t as f64, 1000.0 + t as f64);
            detector.compute(&snapshot, 0.0, Some(1.0), flying, state);
        }
    }

    #[test]
    fn test_turn_rate_from_track() {
        let mut detector = CirclingDetector::default();
        let mut state = CirclingState::default();
        let flying = flying();

        detector.compute(&sample(0.0, 350.0, 1000.0), 0.0, None, &flying, &mut state);
        detector.compute(&sample(2.0, 10.0, 1000.0), 0.0, None, &flying, &mut state);

        assert_eq!(state.turn_rate, 10.0);
        assert!((state.turn_rate_smoothed - 3.0).abs() < 1e-9);
        assert!(!state.turning);
    }

    #[test]
    fn test_turn_rate_spike_is_clamped() {
        let mut detector = CirclingDetector::default();
        let mut state = CirclingState::default();
        let flying = flying();

        detector.compute(&sample(0.0, 0.0, 1000.0), 0.0, None, &flying, &mut state);
        detector.compute(&sample(1.0, 170.0, 1000.0), 0.0, None, &flying, &mut state);

        assert_eq!(state.turn_rate, 170.0);
        assert!((state.turn_rate_smoothed - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_not_flying_zeroes_turn_rate() {
        let mut detector = CirclingDetector::default();
        let mut state = CirclingState {
            turn_rate_smoothed: 12.0,
            ..Default::default()
        };
        let grounded = FlyingState::default();
        detector.compute(&sample(0.0, 0.0, 1000.0), 0.0, None, &grounded, &mut state);
        detector.compute(&sample(1.0, 20.0, 1000.0), 0.0, None, &grounded, &mut state);
        assert_eq!(state.turn_rate_smoothed, 0.0);
        assert_eq!(state.mode, CirclingMode::Cruise);
    }

    #[test]
    fn test_circling_confirmed_after_fifteen_seconds() {
        let mut detector = CirclingDetector::default();
        let mut state = CirclingState::default();
        let flying = flying();

        // t=0 primes the last sample, t=1 is the first turning tick
        circle(&mut detector, &mut state, &flying, 0, 2, 20.0);
        assert_eq!(state.mode, CirclingMode::PossibleClimb);
        assert_eq!(state.turn_start.map(|s| s.time), Some(1.0));

        circle(&mut detector, &mut state, &flying, 2, 14, 20.0);
        assert!(!state.circling);

        circle(&mut detector, &mut state, &flying, 16, 1, 20.0);
        assert!(state.circling);
        assert_eq!(state.mode, CirclingMode::Climb);
        assert_eq!(state.climb_start.map(|s| s.time), Some(1.0));
    }

    #[test]
    fn test_statistics_count_only_turning_climb() {
        let mut detector = CirclingDetector::default();
        let mut state = CirclingState::default();
        let flying = flying();

        circle(&mut detector, &mut state, &flying, 0, 40, 20.0);
        assert!(state.time_climb > 0.0);
        assert!(state.time_cruise > 0.0);
        assert!((state.time_climb + state.time_cruise - 39.0).abs() < 1e-9);
        assert!(state.circling_percentage > 50.0);
        assert!((state.total_height_gain - state.time_climb).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_hold_on_ground() {
        let mut detector = CirclingDetector::default();
        let mut state = CirclingState::default();

        circle(&mut detector, &mut state, &FlyingState::default(), 0, 40, 20.0);
        assert_eq!(state.time_climb, 0.0);
        assert_eq!(state.time_cruise, 0.0);
        assert_eq!(state.circling_percentage, 0.0);
        assert_eq!(state.min_altitude, None);
    }

    #[test]
    fn test_max_height_gain_from_minimum() {
        let mut detector = CirclingDetector::default();
        let mut state = CirclingState::default();
        let flying = flying();

        for (t, altitude) in [(0.0, 1000.0), (1.0, 900.0), (2.0, 1150.0), (3.0, 1100.0)] {
            detector.compute(&sample(t, 0.0, altitude), 0.0, None, &flying, &mut state);
        }
        assert_eq!(state.min_altitude, Some(900.0));
        assert_eq!(state.max_height_gain, 250.0);
    }

    #[test]
    fn test_external_switch_forces_circling() {
        let config = CirclingConfig {
            external_trigger_cruise: true,
            ..Default::default()
        };
        let mut detector = CirclingDetector::new(config);
        let mut state = CirclingState::default();
        let flying = flying();

        detector.compute(&sample(0.0, 0.0, 1000.0), 0.0, None, &flying, &mut state);
        let mut snapshot = sample(1.0, 0.0, 1000.0);
        snapshot.provide_switch_state(SwitchState {
            flight_mode: FlightModeSwitch::Circling,
            ..Default::default()
        });
        detector.compute(&snapshot, 0.0, None, &flying, &mut state);

        assert!(state.circling);
        assert_eq!(state.mode, CirclingMode::Climb);
    }

    #[test]
    fn test_external_switch_ignored_in_replay() {
        let config = CirclingConfig {
            external_trigger_cruise: true,
            ..Default::default()
        };
        let mut detector = CirclingDetector::new(config);
        let mut state = CirclingState::default();
        let flying = flying();

        detector.compute(&sample(0.0, 0.0, 1000.0), 0.0, None, &flying, &mut state);
        let mut snapshot = sample(1.0, 0.0, 1000.0);
        snapshot.replay = true;
        snapshot.provide_switch_state(SwitchState {
            flight_mode: FlightModeSwitch::Circling,
            ..Default::default()
        });
        detector.compute(&snapshot, 0.0, None, &flying, &mut state);

        assert!(!state.circling);
    }
}
