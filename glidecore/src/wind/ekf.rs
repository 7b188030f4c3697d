//! Wind from an extended Kalman filter over airspeed and ground velocity.
//!
//! State is `[wind north, wind east, airspeed scale]`. The measurement is
//! the true airspeed, predicted as `scale * |ground - wind|`. Only straight
//! and level-ish flight is fed in; manoeuvres black the filter out for a
//! while.

use crate::circling::CirclingState;
use crate::geo::SpeedVector;
use crate::snapshot::Snapshot;

use super::WindSample;

const INITIAL_WIND_VARIANCE: f64 = 10.0;
const INITIAL_SCALE_VARIANCE: f64 = 1e-4;
const WIND_PROCESS_NOISE: f64 = 1e-4;
const SCALE_PROCESS_NOISE: f64 = 1e-7;
const MEASUREMENT_NOISE: f64 = 1.0;

/// The bare filter.
#[derive(Debug, Clone, PartialEq)]
pub struct WindEkf {
    x: [f64; 3],
    p: [[f64; 3]; 3],
}

impl Default for WindEkf {
    fn default() -> Self {
        Self::new()
    }
}

impl WindEkf {
    pub fn new() -> Self {
        let mut ekf = Self {
            x: [0.0; 3],
            p: [[0.0; 3]; 3],
        };
        ekf.reset();
        ekf
    }

    pub fn reset(&mut self) {
        self.x = [0.0, 0.0, 1.0];
        self.p = [
            [INITIAL_WIND_VARIANCE, 0.0, 0.0],
            [0.0, INITIAL_WIND_VARIANCE, 0.0],
            [0.0, 0.0, INITIAL_SCALE_VARIANCE],
        ];
    }

    /// Fold in one measurement.
    ///
    /// `ground` is the ground velocity as (north, east) in m/s.
    pub fn update(&mut self, airspeed: f64, ground: (f64, f64)) {
        let dn = ground.0 - self.x[0];
        let de = ground.1 - self.x[1];
        let magnitude = dn.hypot(de);
        if magnitude < 1e-3 {
            return;
        }
        let scale = self.x[2];

        let h = [-scale * dn / magnitude, -scale * de / magnitude, magnitude];
        let predicted = scale * magnitude;

        // P * H^T
        let mut ph = [0.0; 3];
        for (i, row) in self.p.iter().enumerate() {
            ph[i] = row.iter().zip(h.iter()).map(|(p, h)| p * h).sum();
        }
        let innovation_variance: f64 = h.iter().zip(ph.iter()).map(|(h, ph)| h * ph).sum::<f64>() + MEASUREMENT_NOISE;
        let gain = ph.map(|v| v / innovation_variance);

        let innovation = airspeed - predicted;
        for (x, k) in self.x.iter_mut().zip(gain.iter()) {
            *x += k * innovation;
        }

        // P = (I - K H) P, expressed as P - K (H P); H P is (P H^T)^T for symmetric P
        let mut next = self.p;
        for i in 0..3 {
            for j in 0..3 {
                next[i][j] -= gain[i] * ph[j];
            }
        }
        next[0][0] += WIND_PROCESS_NOISE;
        next[1][1] += WIND_PROCESS_NOISE;
        next[2][2] += SCALE_PROCESS_NOISE;
        self.p = next;
    }

    /// Current estimate as a "from" wind vector.
    pub fn wind(&self) -> SpeedVector {
        SpeedVector::from_components(-self.x[0], -self.x[1])
    }

    /// Estimated ratio of measured to real airspeed.
    pub fn airspeed_scale(&self) -> f64 {
        self.x[2]
    }
}

const BLACKOUT_SECS: f64 = 10.0;
const MAX_G_DEVIATION: f64 = 0.3;
const MAX_BANK_DEGREES: f64 = 20.0;
const MAX_TURN_RATE: f64 = 20.0;
const PUBLISH_EVERY: u32 = 10;

/// Feeds the filter from snapshots, skipping manoeuvres.
#[derive(Debug, Clone, Default)]
pub struct WindEkfGlue {
    ekf: WindEkf,
    samples: u32,
    last_time: Option<f64>,
    blackout_until: Option<f64>,
}

impl WindEkfGlue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of samples fed to the filter since the last reset.
    pub fn sample_count(&self) -> u32 {
        self.samples
    }

    /// Feed one snapshot.
    ///
    /// Returns a sample every tenth accepted measurement; the quality grows
    /// with the number of measurements behind it.
    pub fn update(&mut self, basic: &Snapshot, circling: &CirclingState) -> Option<WindSample> {
        let (Some(time), Some(tas), Some(track), Some(ground_speed)) = (
            basic.time.value(),
            basic.true_airspeed.value(),
            basic.track.value(),
            basic.ground_speed.value(),
        ) else {
            self.reset();
            return None;
        };

        match self.last_time {
            Some(last) if time < last => {
                tracing::debug!(time, last, "Wind filter reset on time regression");
                self.reset();
            }
            Some(last) if time == last => return None,
            _ => {}
        }
        self.last_time = Some(time);

        if self.blackout_until.is_some_and(|until| time < until) {
            return None;
        }

        let high_g = basic.g_load.value().is_some_and(|g| (g - 1.0).abs() > MAX_G_DEVIATION);
        let steep_bank = basic.bank_angle.value().is_some_and(|bank| bank.abs() > MAX_BANK_DEGREES);
        let fast_turn = circling.turn_rate.abs() > MAX_TURN_RATE;
        if high_g || steep_bank || fast_turn || circling.circling {
            self.blackout_until = Some(time + BLACKOUT_SECS);
            return None;
        }

        let track = track.to_radians();
        self.ekf
            .update(tas, (track.cos() * ground_speed, track.sin() * ground_speed));
        self.samples += 1;

        if self.samples % PUBLISH_EVERY != 0 {
            return None;
        }

        let quality = match self.samples {
            0..=99 => 1,
            100..=299 => 3,
            _ => 6,
        };
        Some(WindSample {
            wind: self.ekf.wind(),
            quality,
        })
    }
}
