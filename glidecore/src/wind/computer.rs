//! Wind estimation and source selection.

use crate::circling::CirclingState;
use crate::flight::FlyingState;
use crate::geo::SpeedVector;
use crate::snapshot::{Snapshot, Timestamped};

use super::circling::CirclingWind;
use super::ekf::WindEkfGlue;
use super::forecast::ForecastWind;
use super::store::WindStore;

/// Wind settings from the user's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSettings {
    /// Run the automatic estimators.
    pub auto_wind: bool,
    /// Use wind reported by a connected instrument.
    pub external_wind: bool,
    /// Wind entered by hand, stamped with the clock of the entry.
    pub manual_wind: Timestamped<SpeedVector>,
    /// Expected ground temperature for the thermal ceiling (°C).
    pub forecast_temperature: f64,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            auto_wind: true,
            external_wind: true,
            manual_wind: Timestamped::default(),
            forecast_temperature: 25.0,
        }
    }
}

impl WindSettings {
    /// Enter a manual wind at `clock`.
    pub fn set_manual_wind(&mut self, wind: SpeedVector, clock: f64) {
        self.manual_wind.set(wind, clock);
    }

    pub fn clear_manual_wind(&mut self) {
        self.manual_wind.clear();
    }
}

/// Where the selected wind came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindSource {
    #[default]
    None,
    Manual,
    Auto,
    External,
}

impl std::fmt::Display for WindSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Manual => write!(f, "manual"),
            Self::Auto => write!(f, "auto"),
            Self::External => write!(f, "external"),
        }
    }
}

/// The wind to use downstream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindEstimate {
    pub wind: Timestamped<SpeedVector>,
    pub source: WindSource,
}

impl WindEstimate {
    pub fn is_available(&self) -> bool {
        self.wind.is_valid()
    }
}

/// Pick the wind to use.
///
/// In order: external wind if enabled, manual wind if automatic estimation
/// is off, the automatic estimate if it is newer than the manual entry,
/// manual wind, nothing.
pub fn select_wind(settings: &WindSettings, basic: &Snapshot, estimated: &Timestamped<SpeedVector>) -> WindEstimate {
    if basic.external_wind.is_valid() && settings.external_wind {
        WindEstimate {
            wind: basic.external_wind,
            source: WindSource::External,
        }
    } else if settings.manual_wind.is_valid() && !settings.auto_wind {
        WindEstimate {
            wind: settings.manual_wind,
            source: WindSource::Manual,
        }
    } else if settings.auto_wind && estimated.is_newer_than(&settings.manual_wind) {
        WindEstimate {
            wind: *estimated,
            source: WindSource::Auto,
        }
    } else if settings.manual_wind.is_valid() && settings.auto_wind {
        WindEstimate {
            wind: settings.manual_wind,
            source: WindSource::Manual,
        }
    } else {
        WindEstimate::default()
    }
}

/// Wind component along `heading` (positive is a head wind).
///
/// Unknown when either the wind or the heading is.
pub fn head_wind(wind: &WindEstimate, heading: Option<f64>) -> Option<f64> {
    let wind = wind.wind.value()?;
    let heading = heading?;
    Some((wind.bearing - heading).to_radians().cos() * wind.norm)
}

/// Runs the three estimators and fuses their output.
#[derive(Debug, Clone, Default)]
pub struct WindComputer {
    circling: CirclingWind,
    ekf: WindEkfGlue,
    forecast: ForecastWind,
    store: WindStore,
    estimated: Timestamped<SpeedVector>,
    ekf_active: bool,
}

impl WindComputer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Latest automatic estimate.
    pub fn estimated(&self) -> &Timestamped<SpeedVector> {
        &self.estimated
    }

    /// The airspeed filter produced the latest estimate.
    pub fn ekf_active(&self) -> bool {
        self.ekf_active
    }

    pub fn store(&self) -> &WindStore {
        &self.store
    }

    pub fn forecast(&self) -> &ForecastWind {
        &self.forecast
    }

    pub fn forecast_mut(&mut self) -> &mut ForecastWind {
        &mut self.forecast
    }

    /// Thermal ceiling from the current sounding.
    pub fn thermal_ceiling(&self, settings: &WindSettings) -> Option<f64> {
        self.forecast.sounding().thermal_ceiling(settings.forecast_temperature)
    }

    /// Process one tick.
    ///
    /// `takeoff_speed` is the airspeed floor below which the airspeed filter
    /// is not fed.
    pub fn compute(
        &mut self,
        settings: &WindSettings,
        takeoff_speed: f64,
        basic: &Snapshot,
        circling: &CirclingState,
        flying: &FlyingState,
    ) {
        if !settings.auto_wind {
            self.estimated.clear();
            return;
        }
        if !flying.flying {
            return;
        }

        let time = basic.time.value();
        let altitude = basic.nav_altitude();

        if let (Some(time), Some(track), Some(ground_speed)) =
            (time, basic.track.value(), basic.ground_speed.value())
        {
            let sample = self.circling.new_sample(time, track, ground_speed, circling.circling);
            if let (Some(sample), Some(altitude)) = (sample, altitude) {
                self.store.slot_measurement(time, altitude, sample.wind, sample.quality);
            }
        }

        if let Some(time) = time {
            let sample = self.forecast.update(basic.location.value(), altitude, time);
            if let (Some(sample), Some(altitude)) = (sample, altitude) {
                self.store.slot_measurement(time, altitude, sample.wind, sample.quality);
            }
        }

        let was_active = self.ekf_active;
        if basic.has_real_airspeed() {
            let fast_enough = basic.true_airspeed.value().is_some_and(|tas| tas > takeoff_speed);
            if fast_enough {
                if let Some(sample) = self.ekf.update(basic, circling).filter(|s| s.quality > 0) {
                    // the filter output is published directly, the store keeps it for later
                    if let (Some(time), Some(altitude)) = (time, altitude) {
                        self.store.slot_measurement(time, altitude, sample.wind, sample.quality);
                    }
                    self.estimated.set(sample.wind, basic.clock);
                    self.ekf_active = true;
                }
            }
        } else {
            self.ekf_active = false;
        }
        if was_active != self.ekf_active {
            tracing::debug!(active = self.ekf_active, "Airspeed wind filter");
        }

        if !self.ekf_active {
            if let (Some(time), Some(altitude)) = (time, altitude) {
                if let Some(wind) = self.store.slot_altitude(time, altitude) {
                    self.estimated.set(wind, basic.clock);
                }
            }
        }
    }
}
