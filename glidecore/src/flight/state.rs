//! Flight phase state and transition events.
//!
//! - [`FlyingState`] - takeoff, landing, release and engine bookkeeping
//! - [`FlightEvent`] - one transition detected during a tick

use crate::geo::GeoPoint;

/// Phase of the current flight.
///
/// Owned and mutated only by the
/// [`FlyingDetector`](super::FlyingDetector). Times are GPS seconds; a
/// `None` means "has not happened in this flight".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlyingState {
    /// The aircraft is airborne.
    pub flying: bool,

    /// Not flying and stationary for long enough to be sure.
    ///
    /// Separate from `!flying` so that the takeoff detection window does
    /// not flicker between the two.
    pub on_ground: bool,

    /// Engine running, per the noise sensor.
    pub powered: bool,

    /// Seconds since takeoff (or total duration after landing).
    pub flight_time: f64,

    /// When continuous movement started.
    pub takeoff_time: Option<f64>,
    pub takeoff_location: Option<GeoPoint>,
    pub takeoff_altitude: Option<f64>,

    /// When the aircraft became stationary.
    pub landing_time: Option<f64>,
    pub landing_location: Option<GeoPoint>,

    /// Start of the sink that marked release from tow or winch.
    pub release_time: Option<f64>,
    pub release_location: Option<GeoPoint>,

    /// Point farthest from the release point, and its distance in meters.
    pub far_location: Option<GeoPoint>,
    pub far_distance: Option<f64>,

    pub power_on_time: Option<f64>,
    pub power_on_location: Option<GeoPoint>,
    pub power_off_time: Option<f64>,
    pub power_off_location: Option<GeoPoint>,
}

impl FlyingState {
    /// Forget everything, e.g. after a clock discontinuity.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a release from tow has been detected in this flight.
    pub fn is_released(&self) -> bool {
        self.release_time.is_some()
    }
}

/// A transition detected by the flying detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightEvent {
    Takeoff {
        time: f64,
        location: Option<GeoPoint>,
    },
    Landing {
        time: f64,
        location: Option<GeoPoint>,
    },
    Release {
        time: f64,
        location: Option<GeoPoint>,
    },
    PowerOn {
        time: f64,
    },
    PowerOff {
        time: f64,
    },
    /// The aircraft has been stationary long enough that an in-progress
    /// task must not be resumed on the next takeoff.
    TaskResumeInvalidated,
}

impl std::fmt::Display for FlightEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Takeoff { time, .. } => write!(f, "takeoff at {:.0}s", time),
            Self::Landing { time, .. } => write!(f, "landing at {:.0}s", time),
            Self::Release { time, .. } => write!(f, "release at {:.0}s", time),
            Self::PowerOn { time } => write!(f, "engine on at {:.0}s", time),
            Self::PowerOff { time } => write!(f, "engine off at {:.0}s", time),
            Self::TaskResumeInvalidated => write!(f, "task resume invalidated"),
        }
    }
}
