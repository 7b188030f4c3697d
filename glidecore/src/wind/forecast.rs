//! Winds aloft from a forecast sounding.
//!
//! A sounding is a list of levels in the RAOB text format. The estimator
//! interpolates between the levels around the current altitude. Fetching a
//! sounding is I/O and lives outside the tick: [`ForecastWind`] only raises a
//! refresh request, the runtime fulfils it through a [`SoundingSource`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geo::{interpolate_degrees, GeoPoint, SpeedVector, KNOT_MS, NAUTICAL_MILE_M};

use super::WindSample;

/// Quality assigned to forecast winds.
pub const FORECAST_QUALITY: u8 = 5;

const UPDATE_DISTANCE_M: f64 = 5.0 * NAUTICAL_MILE_M;
const UPDATE_INTERVAL_SECS: f64 = 60.0 * 60.0;
const RETRY_SECS: f64 = 60.0;

/// Dry adiabatic lapse rate (K/m).
const DRY_LAPSE_RATE: f64 = 0.00976;

/// Marker for a missing value.
const MISSING: i32 = 99999;

/// Errors from obtaining a sounding.
#[derive(Debug, Error)]
pub enum SoundingError {
    #[error("sounding contains no usable levels")]
    NoLevels,

    #[error("failed to read sounding: {0}")]
    Io(#[from] std::io::Error),

    #[error("sounding unavailable: {0}")]
    Unavailable(String),
}

/// One level of a sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    /// Pressure (hPa).
    pub pressure: f64,
    /// Height above sea level (m).
    pub altitude: f64,
    /// Temperature (°C).
    pub temperature: f64,
    /// Dew point (°C).
    pub dew_point: f64,
    /// Direction the wind blows from (degrees).
    pub wind_direction: f64,
    /// Wind speed (knots).
    pub wind_speed: f64,
}

impl Level {
    /// Parse one line. Only level lines (types 4 to 9) with height and wind
    /// are accepted.
    fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace().map(|field| field.parse::<i32>());
        let kind = fields.next()?.ok()?;
        if !(4..=9).contains(&kind) {
            return None;
        }

        let mut values = [0i32; 6];
        for value in values.iter_mut() {
            *value = fields.next()?.ok()?;
        }
        let [pressure, altitude, temperature, dew_point, wind_direction, wind_speed] = values;
        if altitude == MISSING || wind_direction == MISSING || wind_speed == MISSING {
            return None;
        }

        Some(Self {
            pressure: pressure as f64 / 10.0,
            altitude: altitude as f64,
            temperature: temperature as f64 / 10.0,
            dew_point: dew_point as f64 / 10.0,
            wind_direction: wind_direction as f64,
            wind_speed: wind_speed as f64,
        })
    }
}

/// A vertical profile, sorted by altitude.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sounding {
    levels: Vec<Level>,
}

impl Sounding {
    /// Parse RAOB text. Lines that are not usable levels are skipped.
    pub fn parse(text: &str) -> Result<Self, SoundingError> {
        let mut levels: Vec<Level> = text.lines().filter_map(Level::parse).collect();
        if levels.is_empty() {
            return Err(SoundingError::NoLevels);
        }
        levels.sort_by(|a, b| a.altitude.total_cmp(&b.altitude));
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Wind at `altitude`, interpolated between the surrounding levels.
    ///
    /// Below the lowest level the lowest level's wind is used. Above the
    /// highest level there is no answer.
    pub fn wind_at(&self, altitude: f64) -> Option<SpeedVector> {
        let index = self.levels.iter().position(|level| level.altitude > altitude)?;
        let next = &self.levels[index];
        let Some(previous) = index.checked_sub(1).map(|i| &self.levels[i]) else {
            return Some(SpeedVector::new(next.wind_direction, next.wind_speed * KNOT_MS));
        };

        let fraction = (altitude - previous.altitude) / (next.altitude - previous.altitude);
        let speed = previous.wind_speed + (next.wind_speed - previous.wind_speed) * fraction;
        let bearing = interpolate_degrees(previous.wind_direction, next.wind_direction, fraction);
        Some(SpeedVector::new(bearing, speed * KNOT_MS))
    }

    /// Height where a dry parcel heated to `ground_temperature` (°C) at the
    /// lowest level stops being warmer than the profile.
    pub fn thermal_ceiling(&self, ground_temperature: f64) -> Option<f64> {
        let ground = self.levels.first()?;
        let parcel = |altitude: f64| ground_temperature - DRY_LAPSE_RATE * (altitude - ground.altitude);

        let mut previous = ground;
        if parcel(ground.altitude) <= ground.temperature {
            return Some(ground.altitude);
        }
        for level in &self.levels[1..] {
            let excess = parcel(level.altitude) - level.temperature;
            if excess <= 0.0 {
                let previous_excess = parcel(previous.altitude) - previous.temperature;
                let fraction = previous_excess / (previous_excess - excess);
                return Some(previous.altitude + (level.altitude - previous.altitude) * fraction);
            }
            previous = level;
        }
        None
    }
}

/// Where soundings come from.
pub trait SoundingSource: Send + Sync {
    /// Fetch the latest sounding near `location`. May block.
    fn fetch(&self, location: GeoPoint) -> Result<Sounding, SoundingError>;
}

/// Reads a sounding from a local RAOB file, ignoring the location.
#[derive(Debug, Clone)]
pub struct FileSoundingSource {
    path: PathBuf,
}

impl FileSoundingSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SoundingSource for FileSoundingSource {
    fn fetch(&self, _location: GeoPoint) -> Result<Sounding, SoundingError> {
        let text = std::fs::read_to_string(&self.path)?;
        Sounding::parse(&text)
    }
}

/// Forecast wind estimator with its refresh policy.
#[derive(Debug, Clone)]
pub struct ForecastWind {
    sounding: Sounding,
    first_run: bool,
    busy: bool,
    pending: Option<GeoPoint>,
    last_update_location: Option<GeoPoint>,
    last_update_time: f64,
}

impl Default for ForecastWind {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastWind {
    pub fn new() -> Self {
        Self {
            sounding: Sounding::default(),
            first_run: true,
            busy: false,
            pending: None,
            last_update_location: None,
            last_update_time: 0.0,
        }
    }

    /// Drop the sounding; the next update requests a fresh one.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// A refresh has been requested and not yet answered.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn sounding(&self) -> &Sounding {
        &self.sounding
    }

    /// Take the location of a requested refresh, if any.
    pub fn take_refresh_request(&mut self) -> Option<GeoPoint> {
        self.pending.take()
    }

    /// Answer a refresh request.
    pub fn set_sounding(&mut self, sounding: Sounding) {
        tracing::debug!(levels = sounding.levels().len(), "Forecast sounding updated");
        self.sounding = sounding;
        self.busy = false;
    }

    /// A refresh failed; retry after a minute.
    pub fn fetch_failed(&mut self) {
        self.busy = false;
    }

    /// Wind at the current position, or a refresh request if the sounding
    /// is missing or out of date.
    pub fn update(&mut self, location: Option<GeoPoint>, altitude: Option<f64>, time: f64) -> Option<WindSample> {
        let (location, altitude) = (location?, altitude?);
        if self.busy {
            return None;
        }

        if self.needs_update(&location, time) {
            tracing::debug!(
                latitude = location.latitude,
                longitude = location.longitude,
                "Requesting forecast sounding"
            );
            self.first_run = false;
            self.busy = true;
            self.pending = Some(location);
            self.last_update_location = Some(location);
            self.last_update_time = time;
            self.sounding = Sounding::default();
            return None;
        }

        self.sounding.wind_at(altitude).map(|wind| WindSample {
            wind,
            quality: FORECAST_QUALITY,
        })
    }

    fn needs_update(&self, location: &GeoPoint, time: f64) -> bool {
        if self.first_run {
            return true;
        }
        let elapsed = time - self.last_update_time;
        if self.sounding.is_empty() && elapsed > RETRY_SECS {
            return true;
        }
        if self
            .last_update_location
            .is_some_and(|last| last.distance(location) > UPDATE_DISTANCE_M)
        {
            return true;
        }
        elapsed > UPDATE_INTERVAL_SECS
    }
}
