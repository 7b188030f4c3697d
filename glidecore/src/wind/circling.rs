//! Wind from ground speed variation while circling.
//!
//! In a steady turn the ground speed peaks when flying downwind and dips
//! when flying upwind. Half the difference is the wind speed; the track at
//! the peak is the direction the wind blows to.

use std::collections::VecDeque;

use crate::geo::{delta_degrees, SpeedVector};

use super::WindSample;

const MAX_SAMPLES: usize = 50;

/// Mean sample spacing above which a circle is too sparse to analyse (s).
const MAX_MEAN_INTERVAL: f64 = 2.0;

const MAX_QUALITY: i32 = 5;

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: f64,
    track: f64,
    ground_speed: f64,
}

impl Sample {
    fn north(&self) -> f64 {
        self.track.to_radians().cos() * self.ground_speed
    }

    fn east(&self) -> f64 {
        self.track.to_radians().sin() * self.ground_speed
    }
}

/// Estimates wind once per completed circle.
///
/// Fixes are collected per circle and discarded once the circle has been
/// analysed.
#[derive(Debug, Clone, Default)]
pub struct CirclingWind {
    active: bool,
    circle_count: u32,
    circle_degrees: f64,
    last_track: Option<f64>,
    last_time: Option<f64>,
    samples: VecDeque<Sample>,
}

impl CirclingWind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all samples, as if never flown.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of full circles in the current climb.
    pub fn circle_count(&self) -> u32 {
        self.circle_count
    }

    /// Add one fix. Returns an estimate each time a full circle completes.
    pub fn new_sample(
        &mut self,
        time: f64,
        track: f64,
        ground_speed: f64,
        circling: bool,
    ) -> Option<WindSample> {
        if circling != self.active {
            self.reset();
            self.active = circling;
        }
        if !self.active {
            return None;
        }

        if self.last_time.is_some_and(|last| time <= last) {
            return None;
        }
        self.last_time = Some(time);

        if let Some(last) = self.last_track {
            self.circle_degrees += delta_degrees(last, track).abs();
        }
        self.last_track = Some(track);

        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            time,
            track,
            ground_speed,
        });

        if self.circle_degrees < 360.0 {
            return None;
        }

        self.circle_degrees -= 360.0;
        self.circle_count += 1;
        let result = self.calc_wind();
        self.samples.clear();
        result
    }

    fn calc_wind(&self) -> Option<WindSample> {
        let n = self.samples.len();
        if n < 3 {
            return None;
        }

        let first = self.samples.front()?;
        let last = self.samples.back()?;
        if (last.time - first.time) / (n - 1) as f64 > MAX_MEAN_INTERVAL {
            return None;
        }

        let average = self.samples.iter().map(|s| s.ground_speed).sum::<f64>() / n as f64;

        // Score each fix by the ground speed of the rest of the circle,
        // weighted by distance. The far side of the fastest fix is the
        // slowest part of the circle, so the fastest fix scores lowest.
        let mut lowest: Option<(usize, f64)> = None;
        let mut highest: Option<(usize, f64)> = None;
        for j in 0..n {
            let mut score = 0.0;
            for i in 1..n {
                let other = &self.samples[(i + j) % n];
                let distance = if i > n / 2 { n - i } else { i };
                score += other.ground_speed * distance as f64;
            }
            if lowest.map_or(true, |(_, low)| score < low) {
                lowest = Some((j, score));
            }
            if highest.map_or(true, |(_, high)| score > high) {
                highest = Some((j, score));
            }
        }
        let (fastest, slowest) = (lowest?.0, highest?.0);

        let magnitude = (self.samples[fastest].ground_speed - self.samples[slowest].ground_speed) / 2.0;
        let toward = self.samples[fastest].track;
        let wind_north = toward.to_radians().cos() * magnitude;
        let wind_east = toward.to_radians().sin() * magnitude;

        // the airspeed implied by each fix should be constant
        let residual = self
            .samples
            .iter()
            .map(|s| {
                let air = (s.north() - wind_north).hypot(s.east() - wind_east);
                (air - average).powi(2)
            })
            .sum::<f64>()
            / n as f64;
        let rms = residual.sqrt();

        let mut quality = if magnitude > 1.0 {
            MAX_QUALITY - (rms / magnitude * 3.0).round() as i32
        } else {
            MAX_QUALITY - rms.round() as i32
        };

        // the first circles are rarely round
        if self.circle_count < 3 {
            quality -= 1;
        }
        if self.circle_count < 2 {
            quality -= 1;
        }

        if quality < 1 {
            return None;
        }

        let wind = SpeedVector::new(toward + 180.0, magnitude);
        tracing::debug!(
            bearing = wind.bearing,
            speed = wind.norm,
            quality,
            circles = self.circle_count,
            "Circling wind estimate"
        );
        Some(WindSample {
            wind,
            quality: quality.min(MAX_QUALITY) as u8,
        })
    }
}
