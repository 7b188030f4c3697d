//! Quality-weighted store of wind measurements.
//!
//! Every measurement is kept with its time, altitude and quality. The wind
//! at a given time and altitude is the weighted mean of the measurements
//! within an hour and a kilometre of it; closer and better measurements
//! weigh more.

use std::collections::VecDeque;

use crate::geo::SpeedVector;

const MAX_MEASUREMENTS: usize = 200;

/// Altitude window (m).
const ALTITUDE_RANGE: f64 = 1000.0;
/// Time window (s).
const TIME_RANGE: f64 = 3600.0;

/// Altitude change that triggers a new estimate (m).
const ALTITUDE_HYSTERESIS: f64 = 100.0;

const QUALITY_WEIGHT: f64 = 100.0;
const ALTITUDE_WEIGHT: f64 = 100.0;
const TIME_WEIGHT: f64 = 100.0;
const TIME_SHAPE: f64 = 0.0025;

const MAX_QUALITY: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Measurement {
    time: f64,
    altitude: f64,
    wind: SpeedVector,
    quality: u8,
}

impl Measurement {
    /// Weight for a query at `time` and `altitude`, if within range.
    fn weight(&self, time: f64, altitude: f64) -> Option<f64> {
        let altitude_diff = (altitude - self.altitude) / ALTITUDE_RANGE;
        let time_diff = (time - self.time).abs() / TIME_RANGE;
        if altitude_diff.abs() > 1.0 || time_diff > 1.0 {
            return None;
        }

        let quality = f64::from(self.quality.min(MAX_QUALITY)) * QUALITY_WEIGHT / f64::from(MAX_QUALITY);
        let altitude = (2.0 / (altitude_diff.powi(2) + 1.0) - 1.0) * ALTITUDE_WEIGHT;
        let age = TIME_SHAPE * (1.0 - time_diff) / (time_diff.powi(2) + TIME_SHAPE) * TIME_WEIGHT;
        Some(quality * altitude * age)
    }
}

/// Wind measurements from all estimators, and the estimate derived from them.
#[derive(Debug, Clone, Default)]
pub struct WindStore {
    measurements: VecDeque<Measurement>,
    updated: bool,
    last_altitude: Option<f64>,
    last_wind: Option<SpeedVector>,
}

impl WindStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Record a measurement. The oldest one is dropped when full.
    pub fn slot_measurement(&mut self, time: f64, altitude: f64, wind: SpeedVector, quality: u8) {
        if self.measurements.len() == MAX_MEASUREMENTS {
            self.measurements.pop_front();
        }
        self.measurements.push_back(Measurement {
            time,
            altitude,
            wind,
            quality,
        });
        self.updated = true;
    }

    /// Re-evaluate at the current altitude.
    ///
    /// Returns a new estimate when the altitude moved by more than 100 m or
    /// a measurement arrived since the last evaluation, and the estimate
    /// differs from the previous one.
    pub fn slot_altitude(&mut self, time: f64, altitude: f64) -> Option<SpeedVector> {
        let moved = self
            .last_altitude
            .map_or(true, |last| (altitude - last).abs() > ALTITUDE_HYSTERESIS);
        if !moved && !self.updated {
            return None;
        }
        self.updated = false;

        let wind = self.wind_at(time, altitude)?;
        if self.last_wind == Some(wind) {
            return None;
        }
        self.last_altitude = Some(altitude);
        self.last_wind = Some(wind);
        Some(wind)
    }

    /// Last published estimate.
    pub fn current(&self) -> Option<SpeedVector> {
        self.last_wind
    }

    /// Weighted wind at `time` and `altitude`.
    pub fn wind_at(&self, time: f64, altitude: f64) -> Option<SpeedVector> {
        let mut north = 0.0;
        let mut east = 0.0;
        let mut total = 0.0;
        for measurement in &self.measurements {
            let Some(weight) = measurement.weight(time, altitude) else {
                continue;
            };
            north += measurement.wind.north() * weight;
            east += measurement.wind.east() * weight;
            total += weight;
        }
        if total <= 0.0 {
            return None;
        }
        Some(SpeedVector::from_components(north / total, east / total))
    }
}
