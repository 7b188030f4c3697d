//! Built-in simulated aircraft.
//!
//! The simulator owns a tiny kinematic model (position, track, speed,
//! altitude, turn and climb rate) and writes it into the blackboard's
//! simulator snapshot once per [`Simulator::process`] step. It exists for
//! demos and for exercising the detectors without hardware.

use crate::geo::{GeoPoint, SpeedVector};
use crate::snapshot::{FixQuality, Snapshot};

/// A scripted aircraft.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    /// Current position.
    pub location: GeoPoint,
    /// Ground track in degrees.
    pub track: f64,
    /// Ground speed in m/s.
    pub ground_speed: f64,
    /// GPS altitude in meters.
    pub altitude: f64,
    /// Turn rate in deg/s, right positive.
    pub turn_rate: f64,
    /// Climb rate in m/s.
    pub climb_rate: f64,
    /// Simulated GPS time of day in seconds.
    pub time: f64,
}

impl Simulator {
    /// A stationary aircraft at `location`.
    pub fn new(location: GeoPoint, altitude: f64) -> Self {
        Self {
            location,
            altitude,
            ..Self::default()
        }
    }

    /// Refresh every field the simulator owns without moving the aircraft.
    pub fn touch(&self, snapshot: &mut Snapshot) {
        snapshot.mark_alive();
        snapshot.simulator = true;
        snapshot.airspeed_real = false;

        snapshot.provide_time(self.time);
        snapshot.fix_quality.set(FixQuality::Simulation, snapshot.clock);
        snapshot.provide_location(self.location);
        snapshot.provide_track_and_speed(self.track, self.ground_speed);
        snapshot.provide_gps_altitude(self.altitude);
        snapshot.noncomp_vario.set(self.climb_rate, snapshot.clock);
    }

    /// Advance the aircraft by `dt` seconds and publish it into `snapshot`.
    pub fn process(&mut self, snapshot: &mut Snapshot, dt: f64) {
        if dt > 0.0 {
            self.time += dt;
            self.location = self
                .location
                .destination(self.track, self.ground_speed * dt);
            self.track = crate::geo::normalize_degrees(self.track + self.turn_rate * dt);
            self.altitude += self.climb_rate * dt;
        }
        self.touch(snapshot);
    }

    /// Move to `location`, pointing the track away from the old position.
    pub fn set_location(&mut self, location: GeoPoint) {
        if self.location != location {
            self.track = self.location.bearing(&location);
        }
        self.location = location;
    }

    /// Ground speed resulting from flying `heading` at `true_airspeed` in
    /// `wind`.
    pub fn ground_speed_from_tas(heading: f64, true_airspeed: f64, wind: SpeedVector) -> f64 {
        if true_airspeed <= 0.0 && wind.is_zero() {
            return 0.0;
        }
        let air = SpeedVector::new(heading, true_airspeed);
        // wind blows from its bearing
        let north = air.north() - wind.north();
        let east = air.east() - wind.east();
        north.hypot(east)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_marks_simulated_fix() {
        let sim = Simulator::new(GeoPoint::new(46.0, 7.0), 800.0);
        let mut snapshot = Snapshot::new(3.0);
        sim.touch(&mut snapshot);

        assert!(snapshot.is_alive());
        assert!(snapshot.simulator);
        assert_eq!(snapshot.fix_quality.value(), Some(FixQuality::Simulation));
        assert_eq!(snapshot.gps_altitude.value(), Some(800.0));
    }

    #[test]
    fn test_process_moves_along_track() {
        let start = GeoPoint::new(46.0, 7.0);
        let mut sim = Simulator::new(start, 1000.0);
        sim.track = 0.0;
        sim.ground_speed = 20.0;
        sim.climb_rate = 1.5;

        let mut snapshot = Snapshot::new(0.0);
        sim.process(&mut snapshot, 10.0);

        assert!((start.distance(&sim.location) - 200.0).abs() < 0.5);
        assert!(sim.location.latitude > start.latitude);
        assert!((sim.altitude - 1015.0).abs() < 1e-9);
        assert_eq!(snapshot.time.value(), Some(10.0));
    }

    #[test]
    fn test_process_turns() {
        let mut sim = Simulator::new(GeoPoint::new(46.0, 7.0), 1000.0);
        sim.track = 350.0;
        sim.turn_rate = 15.0;
        let mut snapshot = Snapshot::new(0.0);
        sim.process(&mut snapshot, 2.0);
        assert!((sim.track - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_ground_speed_from_tas_headwind() {
        // flying north into a 5 m/s north wind
        let gs = Simulator::ground_speed_from_tas(0.0, 25.0, SpeedVector::new(0.0, 5.0));
        assert!((gs - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_location_updates_track() {
        let mut sim = Simulator::new(GeoPoint::new(0.0, 0.0), 0.0);
        sim.set_location(GeoPoint::new(0.0, 1.0));
        assert!((sim.track - 90.0).abs() < 1e-6);
    }
}
