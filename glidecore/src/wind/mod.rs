//! Wind estimation.
//!
//! Three estimators run every tick while flying:
//!
//! - [`CirclingWind`] - ground speed variation over each full circle
//! - [`ForecastWind`] - interpolation in a forecast sounding
//! - [`WindEkfGlue`] - a Kalman filter over true airspeed and ground velocity
//!
//! Circling and forecast samples go into the [`WindStore`], which weighs
//! them by quality, altitude and age. When the airspeed filter has an
//! answer it is published directly, otherwise the store's estimate is.
//! [`select_wind`] then chooses between that estimate, manual wind and an
//! instrument's own wind.

mod circling;
mod computer;
mod ekf;
mod forecast;
mod store;

pub use circling::CirclingWind;
pub use computer::{head_wind, select_wind, WindComputer, WindEstimate, WindSettings, WindSource};
pub use ekf::{WindEkf, WindEkfGlue};
pub use forecast::{FileSoundingSource, ForecastWind, Level, Sounding, SoundingError, SoundingSource, FORECAST_QUALITY};
pub use store::WindStore;

use crate::geo::SpeedVector;

/// One estimator output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSample {
    /// Wind, "from" convention.
    pub wind: SpeedVector,
    /// 1 (poor) and up; the store caps it at 5.
    pub quality: u8,
}
