//! Values derived once per tick from the canonical snapshot.

use crate::circling::CirclingState;
use crate::flight::FlyingState;
use crate::geo::{SpeedVector, GRAVITY};
use crate::snapshot::{Snapshot, Timestamped};
use crate::wind::WindEstimate;

/// Everything the tick computes, for consumers downstream.
///
/// Every optional value is `None` when its inputs were unavailable; there
/// are no zero placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedInfo {
    /// Clock of the snapshot this was computed from.
    pub clock: f64,

    /// Attitude heading, else ground track (degrees).
    pub heading: Option<f64>,
    pub nav_altitude: Option<f64>,
    /// Kinetic energy as height, TAS²/2g (m).
    pub energy_height: f64,
    /// Total energy vario if present, else the altitude derivative (m/s).
    pub brutto_vario: Option<f64>,

    pub terrain_elevation: Option<f64>,
    pub height_above_ground: Option<f64>,

    pub flying: FlyingState,
    pub circling: CirclingState,

    /// Latest automatic wind estimate.
    pub estimated_wind: Timestamped<SpeedVector>,
    /// The estimate came from the airspeed filter.
    pub ekf_active: bool,
    /// The wind to use.
    pub wind: WindEstimate,
    pub head_wind: Option<f64>,

    /// Thermal ceiling from the forecast sounding (m).
    pub thermal_ceiling: Option<f64>,
}

/// Kinetic energy of `true_airspeed` (m/s) as height.
pub fn energy_height(true_airspeed: f64) -> f64 {
    true_airspeed * true_airspeed / (2.0 * GRAVITY)
}

/// Tracks the altitude derivative when no vario is connected.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AltitudeRate {
    last: Option<(f64, f64)>,
    rate: Option<f64>,
}

impl AltitudeRate {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Brutto vario for this tick.
    pub(crate) fn update(&mut self, basic: &Snapshot) -> Option<f64> {
        let (Some(time), Some(altitude)) = (basic.time.value(), basic.nav_altitude()) else {
            self.reset();
            return basic.total_energy_vario.value();
        };

        match self.last {
            Some((last_time, last_altitude)) if time > last_time => {
                self.rate = Some((altitude - last_altitude) / (time - last_time));
                self.last = Some((time, altitude));
            }
            Some((last_time, _)) if time == last_time => {}
            _ => {
                self.rate = None;
                self.last = Some((time, altitude));
            }
        }

        basic.total_energy_vario.value().or(self.rate)
    }
}
