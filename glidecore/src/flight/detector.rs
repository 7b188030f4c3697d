//! Takeoff, landing, release and engine detection.

use crate::geo::GeoPoint;
use crate::snapshot::Snapshot;

use super::clock::{DeltaTime, StateClock, TimeStep};
use super::state::{FlightEvent, FlyingState};

/// Shortest accepted step between two samples (seconds).
const MIN_DELTA_TIME: f64 = 0.5;

/// Longest accepted step; anything longer is a clock discontinuity.
const WARP_TOLERANCE: f64 = 20.0;

/// Height above ground that counts as flying regardless of speed (m).
const MIN_FLYING_AGL: f64 = 300.0;

/// Climbing detection window (s) and the gain that counts as climbing (m).
const CLIMB_INTERVAL: f64 = 4.0;
const CLIMB_MIN_GAIN: f64 = 2.0;

/// Height above the last ground altitude that relaxes the landing speed
/// when there is no airspeed probe (m).
const RELAXED_SPEED_MIN_HEIGHT: f64 = 250.0;

/// Stationary time that forces a landing at the end of a replay (s).
const FINISH_STATIONARY_SECS: f64 = 5.0;

/// Tuning of the flying detector.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyingConfig {
    /// Ground speed that counts as moving (m/s).
    pub takeoff_speed: f64,
    /// Continuous movement needed to confirm a takeoff (s).
    pub takeoff_confirm_secs: f64,
    /// Stationary time before `on_ground` is set (s).
    pub on_ground_secs: f64,
    /// Continuous sink needed to detect release from tow (s).
    pub release_sink_secs: f64,
    /// Engine noise level above which the engine counts as running.
    pub engine_noise_on: u32,
    /// Engine noise level at or below which the engine counts as stopped.
    pub engine_noise_off: u32,
    /// How long a noise level must persist to switch power state (s).
    pub engine_hysteresis_secs: f64,
    /// Stationary time after which task resume state is invalidated (s).
    pub task_resume_timeout_secs: f64,
}

impl Default for FlyingConfig {
    fn default() -> Self {
        Self {
            takeoff_speed: 10.0,
            takeoff_confirm_secs: 10.0,
            on_ground_secs: 10.0,
            release_sink_secs: 10.0,
            engine_noise_on: 500,
            engine_noise_off: 350,
            engine_hysteresis_secs: 30.0,
            task_resume_timeout_secs: 120.0,
        }
    }
}

/// Minimal aircraft state for replaying scenarios without sensors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AircraftState {
    /// GPS time in seconds.
    pub time: f64,
    pub location: GeoPoint,
    /// Ground speed in m/s.
    pub ground_speed: f64,
    /// Altitude in meters.
    pub altitude: f64,
}

/// A place and time where something started.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mark {
    time: f64,
    location: Option<GeoPoint>,
    altitude: Option<f64>,
}

/// Detects flight phases from the canonical snapshot.
///
/// Two saturating clocks do the work: `moving` fills while the aircraft is
/// fast (or high above ground) and drains otherwise; `stationary` fills
/// while it is slow. A takeoff is confirmed when `moving` reaches
/// [`FlyingConfig::takeoff_confirm_secs`], a landing when it is drained.
#[derive(Debug, Clone)]
pub struct FlyingDetector {
    config: FlyingConfig,

    delta_time: DeltaTime,

    moving_clock: StateClock,
    stationary_clock: StateClock,
    climbing_clock: StateClock,

    moving_since: Option<Mark>,
    stationary_since: Option<Mark>,

    climbing_altitude: f64,
    climbing_dt_since_update: f64,

    sinking_since: Option<Mark>,

    powered_since: Option<Mark>,
    unpowered_since: Option<Mark>,

    last_ground_altitude: Option<f64>,

    task_resume_invalidated: bool,
}

impl Default for FlyingDetector {
    fn default() -> Self {
        Self::new(FlyingConfig::default())
    }
}

impl FlyingDetector {
    pub fn new(config: FlyingConfig) -> Self {
        Self {
            config,
            delta_time: DeltaTime::new(),
            moving_clock: StateClock::new(30.0, 5.0),
            stationary_clock: StateClock::new(60.0, 5.0),
            climbing_clock: StateClock::new(20.0, 5.0),
            moving_since: None,
            stationary_since: None,
            climbing_altitude: 0.0,
            climbing_dt_since_update: 0.0,
            sinking_since: None,
            powered_since: None,
            unpowered_since: None,
            last_ground_altitude: None,
            task_resume_invalidated: false,
        }
    }

    pub fn config(&self) -> &FlyingConfig {
        &self.config
    }

    /// Forget all hysteresis history.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Process one canonical snapshot.
    ///
    /// `height_above_ground` is the terrain clearance if a terrain model
    /// knows it. Returns the transitions detected in this step.
    pub fn compute(
        &mut self,
        basic: &Snapshot,
        height_above_ground: Option<f64>,
        state: &mut FlyingState,
    ) -> Vec<FlightEvent> {
        let mut events = Vec::new();

        let (Some(time), Some(location)) = (basic.time.value(), basic.location.value()) else {
            return events;
        };

        let dt = match self.delta_time.update(time, MIN_DELTA_TIME, WARP_TOLERANCE) {
            TimeStep::Delta(dt) => dt,
            TimeStep::Skip => return events,
            TimeStep::Warp => {
                tracing::debug!(time, "Clock discontinuity, flying detector reset");
                self.reset();
                state.reset();
                return events;
            }
        };

        let altitude = basic.any_altitude();
        let takeoff_speed = self.effective_takeoff_speed(basic, height_above_ground, altitude);
        let ground_speed = basic.ground_speed.value().unwrap_or(0.0);

        let fast = ground_speed >= takeoff_speed;
        let high = height_above_ground.is_some_and(|agl| agl >= MIN_FLYING_AGL);

        if fast || high {
            // takeoff altitude is recorded from GPS when there is a fix
            let takeoff_altitude = basic.gps_altitude.value().or(altitude);
            self.moving(state, time, dt, location, takeoff_altitude, &mut events);
        } else if !state.flying
            || (ground_speed < takeoff_speed / 2.0
                && altitude.map_or(true, |altitude| !self.check_climbing(dt, altitude)))
        {
            self.stationary(state, time, dt, location, &mut events);
        }

        if let Some(since) = self.stationary_since {
            if time - since.time > self.config.task_resume_timeout_secs && !self.task_resume_invalidated {
                self.task_resume_invalidated = true;
                tracing::info!(stationary_secs = time - since.time, "Task resume state invalidated");
                events.push(FlightEvent::TaskResumeInvalidated);
            }
        }

        if let Some(noise) = basic.engine_noise_level.value() {
            self.check_powered(state, time, location, noise, &mut events);
        }

        match altitude {
            Some(altitude) => {
                if state.on_ground {
                    self.last_ground_altitude = Some(altitude);
                }
                self.check_release(state, time, location, altitude, &mut events);
            }
            None => self.sinking_since = None,
        }

        if state.flying {
            if let Some(release) = state.release_location {
                let distance = location.distance(&release);
                if state.far_distance.map_or(true, |far| distance > far) {
                    state.far_location = Some(location);
                    state.far_distance = Some(distance);
                }
            }
        }

        events
    }

    /// Process one step of a simulated or replayed aircraft with an
    /// explicit `dt`. No sensor availability checks are made.
    pub fn compute_simulated(
        &mut self,
        aircraft: &AircraftState,
        dt: f64,
        state: &mut FlyingState,
    ) -> Vec<FlightEvent> {
        let mut events = Vec::new();
        if aircraft.time < 0.0 {
            return events;
        }

        if aircraft.ground_speed > self.config.takeoff_speed {
            self.moving(
                state,
                aircraft.time,
                dt,
                aircraft.location,
                Some(aircraft.altitude),
                &mut events,
            );
        } else {
            self.stationary(state, aircraft.time, dt, aircraft.location, &mut events);
        }
        events
    }

    /// Close the flight at the end of a replay.
    ///
    /// An aircraft that has been stationary for a few seconds is treated as
    /// landed even though the moving clock has not drained yet.
    pub fn finish(&mut self, state: &mut FlyingState, time: f64) -> Vec<FlightEvent> {
        let mut events = Vec::new();
        if state.flying && self.stationary_clock.value() >= FINISH_STATIONARY_SECS {
            self.moving_clock.clear();
        }
        self.check(state, time, &mut events);
        events
    }

    /// Takeoff speed, lowered when gliding high above the departure
    /// altitude without an airspeed probe, so a strong headwind on a ridge
    /// is not mistaken for a landing.
    fn effective_takeoff_speed(
        &self,
        basic: &Snapshot,
        height_above_ground: Option<f64>,
        altitude: Option<f64>,
    ) -> f64 {
        let takeoff_speed = self.config.takeoff_speed;
        if basic.true_airspeed.is_valid() || height_above_ground.is_some() {
            return takeoff_speed;
        }

        let (Some(altitude), Some(ground)) = (altitude, self.last_ground_altitude) else {
            return takeoff_speed;
        };
        if altitude <= ground + RELAXED_SPEED_MIN_HEIGHT {
            return takeoff_speed;
        }

        let dh = altitude - ground;
        if dh > 1000.0 {
            takeoff_speed / 4.0
        } else if dh > 500.0 {
            takeoff_speed / 2.0
        } else {
            takeoff_speed * 2.0 / 3.0
        }
    }

    fn moving(
        &mut self,
        state: &mut FlyingState,
        time: f64,
        dt: f64,
        location: GeoPoint,
        altitude: Option<f64>,
        events: &mut Vec<FlightEvent>,
    ) {
        self.moving_clock.add(dt);

        if self.moving_since.is_none() {
            self.moving_since = Some(Mark {
                time,
                location: Some(location),
                altitude,
            });
        }

        self.stationary_clock.clear();
        self.stationary_since = None;
        self.task_resume_invalidated = false;

        self.check(state, time, events);
    }

    fn stationary(
        &mut self,
        state: &mut FlyingState,
        time: f64,
        dt: f64,
        location: GeoPoint,
        events: &mut Vec<FlightEvent>,
    ) {
        if self.moving_clock.is_defined() {
            self.moving_clock.subtract(dt);
            if !self.moving_clock.is_defined() {
                self.moving_since = None;
            }
        }

        self.stationary_clock.add(dt);

        if self.stationary_since.is_none() {
            self.stationary_since = Some(Mark {
                time,
                location: Some(location),
                altitude: None,
            });
        }

        self.check(state, time, events);
    }

    /// Apply the clocks to the flying state.
    fn check(&mut self, state: &mut FlyingState, time: f64, events: &mut Vec<FlightEvent>) {
        if !state.flying {
            if self.moving_clock.value() >= self.config.takeoff_confirm_secs {
                if let Some(since) = self.moving_since {
                    state.flying = true;
                    state.takeoff_time = Some(since.time);
                    state.takeoff_location = since.location;
                    state.takeoff_altitude = since.altitude;
                    state.flight_time = 0.0;

                    // a new flight forgets the previous one's release and engine runs
                    state.release_time = None;
                    state.release_location = None;
                    state.power_on_time = None;
                    state.power_on_location = None;
                    state.power_off_time = None;
                    state.power_off_location = None;
                    state.far_location = None;
                    state.far_distance = None;

                    tracing::info!(takeoff_time = since.time, "Takeoff detected");
                    events.push(FlightEvent::Takeoff {
                        time: since.time,
                        location: since.location,
                    });
                }
            }
        } else {
            let takeoff_time = state.takeoff_time.unwrap_or(time);
            state.flight_time = time - takeoff_time;

            if !self.moving_clock.is_defined() {
                let since = self.stationary_since.unwrap_or(Mark {
                    time,
                    location: None,
                    altitude: None,
                });

                state.flying = false;
                state.flight_time = since.time - takeoff_time;
                state.landing_time = Some(since.time);
                state.landing_location = since.location;

                tracing::info!(
                    landing_time = since.time,
                    flight_time = state.flight_time,
                    "Landing detected"
                );
                events.push(FlightEvent::Landing {
                    time: since.time,
                    location: since.location,
                });
            }
        }

        state.on_ground = !state.flying && self.stationary_clock.value() >= self.config.on_ground_secs;
    }

    /// Whether the aircraft gained height over the last few seconds.
    fn check_climbing(&mut self, dt: f64, altitude: f64) -> bool {
        let mut dt = dt;
        self.climbing_dt_since_update += dt;

        if self.climbing_dt_since_update > CLIMB_INTERVAL {
            dt = self.climbing_dt_since_update;
            self.climbing_dt_since_update = 0.0;

            if altitude > self.climbing_altitude + CLIMB_MIN_GAIN {
                self.climbing_clock.add(dt);
            } else {
                self.climbing_clock.subtract(dt);
            }

            self.climbing_altitude = altitude;
        } else {
            self.climbing_altitude = self.climbing_altitude.min(altitude);
        }

        self.climbing_clock.value() >= dt + 1.0
    }

    fn check_release(
        &mut self,
        state: &mut FlyingState,
        time: f64,
        location: GeoPoint,
        altitude: f64,
        events: &mut Vec<FlightEvent>,
    ) {
        if !state.flying || state.release_time.is_some() || self.stationary_clock.is_defined() {
            return;
        }

        let Some(since) = self.sinking_since else {
            self.sinking_since = Some(Mark {
                time,
                location: Some(location),
                altitude: Some(altitude),
            });
            return;
        };

        if time < since.time || since.altitude.map_or(true, |start| altitude >= start) {
            // climbed back above where the sink started
            self.sinking_since = None;
            return;
        }

        if time - since.time >= self.config.release_sink_secs {
            state.release_time = Some(since.time);
            state.release_location = since.location;
            state.far_location = None;
            state.far_distance = None;

            tracing::info!(release_time = since.time, "Release detected");
            events.push(FlightEvent::Release {
                time: since.time,
                location: since.location,
            });
        }
    }

    fn check_powered(
        &mut self,
        state: &mut FlyingState,
        time: f64,
        location: GeoPoint,
        noise: u32,
        events: &mut Vec<FlightEvent>,
    ) {
        let mark = Mark {
            time,
            location: Some(location),
            altitude: None,
        };

        if noise > self.config.engine_noise_on && self.powered_since.is_none() {
            self.powered_since = Some(mark);
            self.unpowered_since = None;
        } else if noise <= self.config.engine_noise_off && self.unpowered_since.is_none() {
            self.unpowered_since = Some(mark);
            self.powered_since = None;
        }

        let hysteresis = self.config.engine_hysteresis_secs;
        match (self.powered_since, self.unpowered_since) {
            (Some(on), None) if time - on.time >= hysteresis => {
                if !state.powered {
                    tracing::info!(power_on_time = on.time, "Engine on");
                    events.push(FlightEvent::PowerOn { time: on.time });
                }
                state.powered = true;
                state.power_on_time = Some(on.time);
                state.power_on_location = on.location;
            }
            (_, Some(off)) if time - off.time >= hysteresis => {
                if state.powered {
                    tracing::info!(power_off_time = off.time, "Engine off");
                    events.push(FlightEvent::PowerOff { time: off.time });
                }
                state.powered = false;
                state.power_off_time = Some(off.time);
                state.power_off_location = off.location;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, ground_speed: f64, altitude: Option<f64>) -> Snapshot {
        let mut snapshot = Snapshot::new(time);
        snapshot.mark_alive();
        snapshot.provide_time(time);
        snapshot.provide_location(GeoPoint::new(47.0, 8.0));
        snapshot.provide_track_and_speed(90.0, ground_speed);
        if let Some(altitude) = altitude {
            snapshot.provide_gps_altitude(altitude);
        }
        snapshot
    }

    fn run(
        detector: &mut FlyingDetector,
        state: &mut FlyingState,
        start: f64,
        speeds: &[f64],
    ) -> Vec<FlightEvent> {
        let mut events = Vec::new();
        for (i, &speed) in speeds.iter().enumerate() {
            let snapshot = sample(start + i as f64, speed, Some(500.0));
            events.extend(detector.compute(&snapshot, None, state));
        }
        events
    }

    #[test]
    fn test_takeoff_after_ten_seconds_of_movement() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();

        let speeds = [0.0, 0.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0];
        let mut flying_from = None;
        for (i, &speed) in speeds.iter().enumerate() {
            detector.compute(&sample(i as f64, speed, Some(500.0)), None, &mut state);
            if state.flying && flying_from.is_none() {
                flying_from = Some(i);
            }
        }

        // ten accumulated seconds of qualifying speed, the last sample
        assert_eq!(flying_from, Some(11));
        assert_eq!(state.takeoff_time, Some(2.0));
        assert_eq!(state.takeoff_altitude, Some(500.0));
    }

    #[test]
    fn test_takeoff_altitude_prefers_gps() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();

        for i in 0..12 {
            let mut snapshot = sample(i as f64, 25.0, Some(500.0));
            snapshot.provide_baro_altitude(430.0);
            detector.compute(&snapshot, None, &mut state);
        }
        assert!(state.flying);
        assert_eq!(state.takeoff_altitude, Some(500.0));
    }

    #[test]
    fn test_time_warp_reseeds_on_next_sample() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        run(&mut detector, &mut state, 0.0, &[25.0; 15]);

        detector.compute(&sample(500.0, 25.0, Some(500.0)), None, &mut state);
        assert_eq!(detector.delta_time.last(), None);

        // the sample after the warp only seeds the reference
        detector.compute(&sample(501.0, 25.0, Some(500.0)), None, &mut state);
        assert_eq!(detector.delta_time.last(), Some(501.0));
        assert_eq!(detector.moving_clock.value(), 0.0);

        detector.compute(&sample(502.0, 25.0, Some(500.0)), None, &mut state);
        assert_eq!(detector.moving_clock.value(), 1.0);
    }

    #[test]
    fn test_takeoff_not_confirmed_early() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        run(&mut detector, &mut state, 0.0, &[0.0, 12.0, 12.0, 12.0, 12.0, 12.0]);
        assert!(!state.flying);
    }

    #[test]
    fn test_stays_on_ground_when_slow() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        run(&mut detector, &mut state, 0.0, &[1.0; 40]);
        assert!(!state.flying);
        assert!(state.on_ground);
    }

    #[test]
    fn test_landing_after_moving_clock_drains() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();

        let mut events = run(&mut detector, &mut state, 0.0, &[25.0; 60]);
        assert!(state.flying);
        assert!(matches!(events[0], FlightEvent::Takeoff { time, .. } if time == 1.0));

        // the moving clock is saturated at 30 s and drains one second per sample
        events = run(&mut detector, &mut state, 60.0, &[0.0; 45]);
        assert!(!state.flying);
        assert!(events.iter().any(|e| matches!(e, FlightEvent::Landing { time, .. } if *time == 60.0)));
        assert_eq!(state.landing_time, Some(60.0));

        // stationary for a long time: stays landed
        run(&mut detector, &mut state, 105.0, &[0.0; 40]);
        assert!(!state.flying);
        assert!(state.on_ground);
    }

    #[test]
    fn test_high_above_ground_counts_as_moving() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        for i in 0..12 {
            let snapshot = sample(i as f64, 0.0, Some(2000.0));
            detector.compute(&snapshot, Some(400.0), &mut state);
        }
        assert!(state.flying);
    }

    #[test]
    fn test_time_warp_resets_state() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        run(&mut detector, &mut state, 0.0, &[25.0; 15]);
        assert!(state.flying);

        // 100 s gap
        detector.compute(&sample(114.0 + 100.0, 25.0, Some(500.0)), None, &mut state);
        assert!(!state.flying);
        assert_eq!(state, FlyingState::default());
    }

    #[test]
    fn test_backwards_time_resets_state() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        run(&mut detector, &mut state, 100.0, &[25.0; 15]);
        assert!(state.flying);

        detector.compute(&sample(50.0, 25.0, Some(500.0)), None, &mut state);
        assert!(!state.flying);
    }

    #[test]
    fn test_stalled_time_is_ignored() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        run(&mut detector, &mut state, 0.0, &[25.0; 15]);
        let before = state.clone();

        // same GPS time delivered again
        detector.compute(&sample(14.0, 0.0, Some(500.0)), None, &mut state);
        assert_eq!(state, before);
    }

    #[test]
    fn test_missing_time_or_location_is_skipped() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        let mut snapshot = Snapshot::new(0.0);
        snapshot.provide_track_and_speed(0.0, 30.0);
        for _ in 0..20 {
            assert!(detector.compute(&snapshot, None, &mut state).is_empty());
        }
        assert!(!state.flying);
    }

    #[test]
    fn test_release_after_continuous_sink() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();

        // climbing on tow
        for i in 0..30 {
            let snapshot = sample(i as f64, 30.0, Some(500.0 + 3.0 * i as f64));
            detector.compute(&snapshot, None, &mut state);
        }
        assert!(state.flying);
        assert!(!state.is_released());

        // gliding down after release at t=30
        let mut events = Vec::new();
        for i in 30..45 {
            let altitude = 587.0 - (i - 30) as f64;
            let snapshot = sample(i as f64, 25.0, Some(altitude));
            events.extend(detector.compute(&snapshot, None, &mut state));
        }
        assert!(state.is_released());
        assert!(events.iter().any(|e| matches!(e, FlightEvent::Release { .. })));
        let release_time = state.release_time.unwrap();
        assert!((29.0..=31.0).contains(&release_time), "release at {}", release_time);
    }

    #[test]
    fn test_engine_power_hysteresis() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        let mut events = Vec::new();

        for i in 0..40 {
            let mut snapshot = sample(i as f64, 25.0, Some(500.0));
            snapshot.provide_engine_noise_level(800);
            events.extend(detector.compute(&snapshot, None, &mut state));
            if i < 31 {
                assert!(!state.powered, "powered too early at {}", i);
            }
        }
        assert!(state.powered);
        assert_eq!(state.power_on_time, Some(1.0));

        // noise in the hysteresis band changes nothing
        for i in 40..100 {
            let mut snapshot = sample(i as f64, 25.0, Some(500.0));
            snapshot.provide_engine_noise_level(400);
            detector.compute(&snapshot, None, &mut state);
        }
        assert!(state.powered);

        for i in 100..140 {
            let mut snapshot = sample(i as f64, 25.0, Some(500.0));
            snapshot.provide_engine_noise_level(100);
            events.extend(detector.compute(&snapshot, None, &mut state));
        }
        assert!(!state.powered);
        assert_eq!(state.power_off_time, Some(100.0));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, FlightEvent::PowerOn { .. } | FlightEvent::PowerOff { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_task_resume_invalidated_once() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        let events = run(&mut detector, &mut state, 0.0, &[0.0; 200]);
        let count = events
            .iter()
            .filter(|e| matches!(e, FlightEvent::TaskResumeInvalidated))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_relaxed_takeoff_speed_high_above_ground() {
        let mut detector = FlyingDetector::default();
        detector.last_ground_altitude = Some(400.0);

        let high = sample(0.0, 0.0, Some(1600.0));
        assert_eq!(detector.effective_takeoff_speed(&high, None, high.any_altitude()), 2.5);

        let mid = sample(0.0, 0.0, Some(1000.0));
        assert_eq!(detector.effective_takeoff_speed(&mid, None, mid.any_altitude()), 5.0);

        let low = sample(0.0, 0.0, Some(700.0));
        let relaxed = detector.effective_takeoff_speed(&low, None, low.any_altitude());
        assert!((relaxed - 20.0 / 3.0).abs() < 1e-9);

        let mut with_probe = sample(0.0, 0.0, Some(1600.0));
        with_probe.provide_true_airspeed(25.0);
        assert_eq!(
            detector.effective_takeoff_speed(&with_probe, None, with_probe.any_altitude()),
            10.0
        );
    }

    #[test]
    fn test_compute_simulated() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        let mut aircraft = AircraftState {
            time: 0.0,
            location: GeoPoint::new(47.0, 8.0),
            ground_speed: 20.0,
            altitude: 800.0,
        };
        for i in 0..10 {
            aircraft.time = i as f64;
            detector.compute_simulated(&aircraft, 1.0, &mut state);
        }
        assert!(state.flying);
        assert_eq!(state.takeoff_time, Some(0.0));
    }

    #[test]
    fn test_finish_forces_landing_when_stationary() {
        let mut detector = FlyingDetector::default();
        let mut state = FlyingState::default();
        run(&mut detector, &mut state, 0.0, &[25.0; 40]);
        run(&mut detector, &mut state, 40.0, &[0.0; 6]);
        assert!(state.flying);

        let events = detector.finish(&mut state, 46.0);
        assert!(!state.flying);
        assert!(matches!(events[0], FlightEvent::Landing { time, .. } if time == 40.0));
    }
}
