//! One source's view of the aircraft at one instant.

use crate::geo::{GeoPoint, SpeedVector};

use super::timestamped::Timestamped;

/// Expiry windows in seconds, per field family.
pub mod timeouts {
    /// Device link silence before the whole snapshot is dropped.
    pub const ALIVE: f64 = 10.0;
    /// GPS time of day.
    pub const TIME: f64 = 10.0;
    /// Position, track and ground speed.
    pub const NAVIGATION: f64 = 10.0;
    /// Fix quality and satellite count.
    pub const GPS_STATUS: f64 = 5.0;
    /// Heading, bank, pitch and g-load.
    pub const ATTITUDE: f64 = 5.0;
    /// True and indicated airspeed.
    pub const AIRSPEED: f64 = 30.0;
    /// GPS, barometric and pressure altitude, static pressure.
    pub const ALTITUDE: f64 = 30.0;
    /// Vario signals.
    pub const VARIO: f64 = 5.0;
    /// Wind reported by a device.
    pub const EXTERNAL_WIND: f64 = 600.0;
    /// Outside air temperature and humidity.
    pub const ATMOSPHERE: f64 = 300.0;
    /// Engine noise level.
    pub const ENGINE_NOISE: f64 = 30.0;
    /// Supply voltage and battery level.
    pub const POWER_SUPPLY: f64 = 300.0;
    /// Stall ratio.
    pub const STALL: f64 = 5.0;
    /// Switch inputs.
    pub const SWITCHES: f64 = 600.0;
    /// MacCready, QNH, ballast and bugs received from a device.
    pub const DEVICE_SETTINGS: f64 = 600.0;
}

/// Sea-level ISA air density (kg/m³).
const SEA_LEVEL_DENSITY: f64 = 1.225;

/// ISA air density at `altitude` meters.
fn air_density(altitude: f64) -> f64 {
    SEA_LEVEL_DENSITY * (1.0 - 2.255_77e-5 * altitude).max(0.0).powf(4.255_88)
}

/// `TAS / IAS` at `altitude` meters.
fn air_density_ratio(altitude: f64) -> f64 {
    let density = air_density(altitude);
    if density <= 0.0 {
        return 1.0;
    }
    (SEA_LEVEL_DENSITY / density).sqrt()
}

/// GPS fix quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixQuality {
    #[default]
    NoFix,
    Gps,
    Dgps,
    RealTimeKinematic,
    Estimation,
    ManualInput,
    Simulation,
}

/// Flight mode reported by a switch box or vario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightModeSwitch {
    #[default]
    Unknown,
    Circling,
    Cruise,
}

/// State of external switch inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchState {
    pub flight_mode: FlightModeSwitch,
    pub airbrake_locked: bool,
    pub flap_landing: bool,
    pub gear_extended: bool,
}

/// A complete set of timestamped sensor fields from one source.
///
/// Every field carries its own validity; a field is only meaningful while
/// [`Timestamped::is_valid`] holds. `clock` is the owning source's
/// monotonic clock that all stamps refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Monotonic clock in seconds; all field stamps refer to it.
    pub clock: f64,

    /// Refreshed whenever the source delivered data.
    pub alive: Timestamped<()>,

    /// GPS time in seconds (UTC time of day, normalized to be monotonic
    /// after merging).
    pub time: Timestamped<f64>,

    pub fix_quality: Timestamped<FixQuality>,
    pub satellites_used: Timestamped<u8>,

    pub location: Timestamped<GeoPoint>,
    /// Ground track in degrees true.
    pub track: Timestamped<f64>,
    /// Ground speed in m/s.
    pub ground_speed: Timestamped<f64>,

    /// True heading in degrees (compass/attitude source).
    pub heading: Timestamped<f64>,
    /// Bank angle in degrees, right positive.
    pub bank_angle: Timestamped<f64>,
    /// Pitch angle in degrees, nose up positive.
    pub pitch_angle: Timestamped<f64>,
    /// Load factor in g.
    pub g_load: Timestamped<f64>,

    /// True airspeed in m/s.
    pub true_airspeed: Timestamped<f64>,
    /// Indicated airspeed in m/s. Only valid while `true_airspeed` is.
    pub indicated_airspeed: Timestamped<f64>,
    /// Whether the airspeeds come from a probe (as opposed to being computed).
    pub airspeed_real: bool,

    /// GPS altitude AMSL in meters.
    pub gps_altitude: Timestamped<f64>,
    /// Barometric altitude (QNH) in meters.
    pub baro_altitude: Timestamped<f64>,
    pub baro_altitude_weak: bool,
    /// Pressure altitude (1013.25 hPa) in meters.
    pub pressure_altitude: Timestamped<f64>,
    pub pressure_altitude_weak: bool,
    /// Static pressure in Pa.
    pub static_pressure: Timestamped<f64>,

    /// Gross vertical speed (m/s, up positive).
    pub noncomp_vario: Timestamped<f64>,
    /// Total energy vario (m/s).
    pub total_energy_vario: Timestamped<f64>,
    /// Air mass vertical speed (m/s).
    pub netto_vario: Timestamped<f64>,

    /// Wind computed by a device.
    pub external_wind: Timestamped<SpeedVector>,

    /// Outside air temperature in °C.
    pub temperature: Timestamped<f64>,
    /// Relative humidity in percent.
    pub humidity: Timestamped<f64>,

    /// Engine noise level (0..999).
    pub engine_noise_level: Timestamped<u32>,

    /// Supply voltage in V.
    pub voltage: Timestamped<f64>,
    /// Battery level in percent.
    pub battery_level: Timestamped<f64>,

    pub stall_ratio: Timestamped<f64>,

    pub switch_state: Timestamped<SwitchState>,

    /// MacCready setting in m/s.
    pub mac_cready: Timestamped<f64>,
    /// QNH in hPa.
    pub qnh: Timestamped<f64>,
    /// Ballast fraction 0..1.
    pub ballast: Timestamped<f64>,
    /// Bugs factor, 1.0 = clean.
    pub bugs: Timestamped<f64>,

    /// Produced by the built-in simulator.
    pub simulator: bool,
    /// Produced by a replay source.
    pub replay: bool,
}

/// Applies `$op` to every timestamped field except `alive`.
macro_rules! for_each_field {
    ($mac:ident!($($args:tt)*)) => {
        $mac!($($args)*;
            time => timeouts::TIME,
            fix_quality => timeouts::GPS_STATUS,
            satellites_used => timeouts::GPS_STATUS,
            location => timeouts::NAVIGATION,
            track => timeouts::NAVIGATION,
            ground_speed => timeouts::NAVIGATION,
            heading => timeouts::ATTITUDE,
            bank_angle => timeouts::ATTITUDE,
            pitch_angle => timeouts::ATTITUDE,
            g_load => timeouts::ATTITUDE,
            true_airspeed => timeouts::AIRSPEED,
            indicated_airspeed => timeouts::AIRSPEED,
            gps_altitude => timeouts::ALTITUDE,
            baro_altitude => timeouts::ALTITUDE,
            pressure_altitude => timeouts::ALTITUDE,
            static_pressure => timeouts::ALTITUDE,
            noncomp_vario => timeouts::VARIO,
            total_energy_vario => timeouts::VARIO,
            netto_vario => timeouts::VARIO,
            external_wind => timeouts::EXTERNAL_WIND,
            temperature => timeouts::ATMOSPHERE,
            humidity => timeouts::ATMOSPHERE,
            engine_noise_level => timeouts::ENGINE_NOISE,
            voltage => timeouts::POWER_SUPPLY,
            battery_level => timeouts::POWER_SUPPLY,
            stall_ratio => timeouts::STALL,
            switch_state => timeouts::SWITCHES,
            mac_cready => timeouts::DEVICE_SETTINGS,
            qnh => timeouts::DEVICE_SETTINGS,
            ballast => timeouts::DEVICE_SETTINGS,
            bugs => timeouts::DEVICE_SETTINGS,
        )
    };
}

macro_rules! expire_fields {
    ($snapshot:expr, $clock:expr; $($field:ident => $timeout:expr),* $(,)?) => {{
        let mut expired = 0usize;
        $( if $snapshot.$field.expire($clock, $timeout) { expired += 1; } )*
        expired
    }};
}

macro_rules! shift_fields {
    ($snapshot:expr, $offset:expr; $($field:ident => $timeout:expr),* $(,)?) => {
        $( $snapshot.$field.shift($offset); )*
    };
}

macro_rules! complement_fields {
    ($snapshot:expr, $other:expr; $($field:ident => $timeout:expr),* $(,)?) => {
        $( $snapshot.$field.complement(&$other.$field); )*
    };
}

impl Snapshot {
    /// An empty snapshot whose clock reads `clock`.
    pub fn new(clock: f64) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    /// Forget every field, keeping the clock.
    pub fn reset(&mut self) {
        let clock = self.clock;
        *self = Self::new(clock);
    }

    /// Advance the clock. The clock never runs backwards.
    pub fn update_clock(&mut self, now: f64) {
        if now > self.clock {
            self.clock = now;
        }
    }

    /// Move this snapshot onto a clock that reads `now` at this snapshot's
    /// current clock reading.
    ///
    /// Every stamp keeps its age, so a snapshot built on a device adapter's
    /// own clock can be handed to a blackboard running on another one.
    pub fn rebase(&mut self, now: f64) {
        let offset = now - self.clock;
        if offset == 0.0 {
            return;
        }
        self.alive.shift(offset);
        for_each_field!(shift_fields!(self, offset));
        self.clock = now;
    }

    /// Mark the source as alive at the current clock.
    pub fn mark_alive(&mut self) {
        self.alive.update(self.clock);
    }

    /// Whether the source is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.is_valid()
    }

    /// Check the link timeout against the current clock.
    ///
    /// A source silent for longer than [`timeouts::ALIVE`] is reset to
    /// empty. Returns `true` if the source died in this call.
    pub fn expire_wall_clock(&mut self) -> bool {
        if self.alive.expire(self.clock, timeouts::ALIVE) {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Invalidate every field not refreshed within its expiry window.
    ///
    /// Returns the number of fields that were invalidated.
    pub fn expire(&mut self) -> usize {
        let clock = self.clock;
        let expired = for_each_field!(expire_fields!(self, clock));

        // derived fields need their inputs
        if !self.true_airspeed.is_valid() {
            self.indicated_airspeed.clear();
        }

        expired
    }

    /// Fill every invalid field from `other` where `other` has it valid.
    ///
    /// First valid value wins; conflicting valid values are not reconciled.
    pub fn complement(&mut self, other: &Snapshot) {
        if !other.is_alive() {
            return;
        }

        // companion flags follow their fields
        if !self.true_airspeed.is_valid() && other.true_airspeed.is_valid() {
            self.airspeed_real = other.airspeed_real;
        }
        if !self.baro_altitude.is_valid() && other.baro_altitude.is_valid() {
            self.baro_altitude_weak = other.baro_altitude_weak;
        }
        if !self.pressure_altitude.is_valid() && other.pressure_altitude.is_valid() {
            self.pressure_altitude_weak = other.pressure_altitude_weak;
        }

        for_each_field!(complement_fields!(self, other));
        self.alive.complement(&other.alive);
        if other.alive.is_newer_than(&self.alive) {
            self.alive = other.alive;
        }
    }

    /// Provide the GPS time of day.
    pub fn provide_time(&mut self, seconds: f64) {
        self.time.set(seconds, self.clock);
    }

    /// Provide a position fix.
    pub fn provide_location(&mut self, location: GeoPoint) {
        self.location.set(location, self.clock);
    }

    /// Provide ground track (degrees) and ground speed (m/s).
    pub fn provide_track_and_speed(&mut self, track: f64, ground_speed: f64) {
        self.track.set(crate::geo::normalize_degrees(track), self.clock);
        self.ground_speed.set(ground_speed, self.clock);
    }

    /// Provide GPS altitude (m).
    pub fn provide_gps_altitude(&mut self, altitude: f64) {
        self.gps_altitude.set(altitude, self.clock);
    }

    /// Provide a "strong" barometric altitude (m).
    pub fn provide_baro_altitude(&mut self, altitude: f64) {
        self.baro_altitude.set(altitude, self.clock);
        self.baro_altitude_weak = false;
    }

    /// Provide a barometric altitude that never overwrites a strong one.
    pub fn provide_weak_baro_altitude(&mut self, altitude: f64) {
        if self.baro_altitude.is_valid() && !self.baro_altitude_weak {
            return;
        }
        self.baro_altitude.set(altitude, self.clock);
        self.baro_altitude_weak = true;
    }

    /// Provide a "strong" pressure altitude (m).
    pub fn provide_pressure_altitude(&mut self, altitude: f64) {
        self.pressure_altitude.set(altitude, self.clock);
        self.pressure_altitude_weak = false;
    }

    /// Provide a pressure altitude that never overwrites a strong one.
    pub fn provide_weak_pressure_altitude(&mut self, altitude: f64) {
        if self.pressure_altitude.is_valid() && !self.pressure_altitude_weak {
            return;
        }
        self.pressure_altitude.set(altitude, self.clock);
        self.pressure_altitude_weak = true;
    }

    /// Provide a measured true airspeed (m/s).
    ///
    /// Indicated airspeed is derived from it when an altitude is known.
    pub fn provide_true_airspeed(&mut self, tas: f64) {
        self.true_airspeed.set(tas, self.clock);
        self.airspeed_real = true;
        match self.any_altitude() {
            Some(altitude) => {
                let ias = tas / air_density_ratio(altitude);
                self.indicated_airspeed.set(ias, self.clock);
            }
            None => self.indicated_airspeed.clear(),
        }
    }

    /// Provide a measured indicated airspeed (m/s).
    ///
    /// True airspeed is derived using the current altitude, or sea level
    /// density when no altitude is known.
    pub fn provide_indicated_airspeed(&mut self, ias: f64) {
        let ratio = self.any_altitude().map_or(1.0, air_density_ratio);
        self.indicated_airspeed.set(ias, self.clock);
        self.true_airspeed.set(ias * ratio, self.clock);
        self.airspeed_real = true;
    }

    /// Provide total energy vario (m/s).
    pub fn provide_total_energy_vario(&mut self, vario: f64) {
        self.total_energy_vario.set(vario, self.clock);
    }

    /// Provide netto vario (m/s).
    pub fn provide_netto_vario(&mut self, vario: f64) {
        self.netto_vario.set(vario, self.clock);
    }

    /// Provide wind computed by the device.
    pub fn provide_external_wind(&mut self, wind: SpeedVector) {
        self.external_wind.set(wind, self.clock);
    }

    /// Provide engine noise level.
    pub fn provide_engine_noise_level(&mut self, level: u32) {
        self.engine_noise_level.set(level, self.clock);
    }

    /// Provide switch inputs.
    pub fn provide_switch_state(&mut self, state: SwitchState) {
        self.switch_state.set(state, self.clock);
    }

    /// Show a startup location without claiming it as a fix.
    pub fn set_fake_location(&mut self, location: GeoPoint, altitude: f64) {
        self.location = Timestamped::invalid(location);
        self.gps_altitude = Timestamped::invalid(altitude);
    }

    /// Best available altitude: barometric, else GPS.
    pub fn any_altitude(&self) -> Option<f64> {
        self.baro_altitude.value().or_else(|| self.gps_altitude.value())
    }

    /// Altitude used for navigation: strong barometric, else GPS, else a
    /// weak barometric reading.
    pub fn nav_altitude(&self) -> Option<f64> {
        match self.baro_altitude.value() {
            Some(baro) if !self.baro_altitude_weak => Some(baro),
            baro => self.gps_altitude.value().or(baro),
        }
    }

    /// Heading if known, else ground track.
    pub fn heading_or_track(&self) -> Option<f64> {
        self.heading.value().or_else(|| self.track.value())
    }

    /// Whether airspeed comes from a real probe and is currently valid.
    pub fn has_real_airspeed(&self) -> bool {
        self.airspeed_real && self.true_airspeed.is_valid()
    }

    /// Whether the GPS time advanced relative to `last`.
    pub fn has_time_advanced_since(&self, last: &Snapshot) -> bool {
        match (self.time.value(), last.time.value()) {
            (Some(now), Some(before)) => now > before,
            _ => false,
        }
    }

    /// Whether the GPS time went back relative to `last`, or `last` had none.
    pub fn has_time_retreated_since(&self, last: &Snapshot) -> bool {
        match (self.time.value(), last.time.value()) {
            (_, None) => true,
            (Some(now), Some(before)) => now < before,
            (None, Some(_)) => false,
        }
    }

    /// Ground speed above 2 m/s.
    pub fn movement_detected(&self) -> bool {
        self.ground_speed.value().is_some_and(|gs| gs > 2.0)
    }
}
