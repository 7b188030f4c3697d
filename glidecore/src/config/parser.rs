//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::geo::SpeedVector;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [flight] section
    if let Some(section) = ini.section(Some("flight")) {
        let s = Section::new("flight", section);
        let flight = &mut config.flight;
        s.positive("takeoff_speed", &mut flight.takeoff_speed)?;
        s.positive("takeoff_confirm_secs", &mut flight.takeoff_confirm_secs)?;
        s.positive("on_ground_secs", &mut flight.on_ground_secs)?;
        s.positive("release_sink_secs", &mut flight.release_sink_secs)?;
        s.parsed("engine_noise_on", "must be a non-negative integer", &mut flight.engine_noise_on)?;
        s.parsed("engine_noise_off", "must be a non-negative integer", &mut flight.engine_noise_off)?;
        s.positive("engine_hysteresis_secs", &mut flight.engine_hysteresis_secs)?;
        s.positive("task_resume_timeout_secs", &mut flight.task_resume_timeout_secs)?;

        if flight.engine_noise_off > flight.engine_noise_on {
            return Err(ConfigFileError::InvalidValue {
                section: "flight".to_string(),
                key: "engine_noise_off".to_string(),
                value: flight.engine_noise_off.to_string(),
                reason: format!("must not exceed engine_noise_on ({})", flight.engine_noise_on),
            });
        }
    }

    // [circling] section
    if let Some(section) = ini.section(Some("circling")) {
        let s = Section::new("circling", section);
        let circling = &mut config.circling;
        if let Some(v) = section.get("external_trigger_cruise") {
            circling.external_trigger_cruise = parse_bool(v);
        }
        s.positive("min_turn_rate", &mut circling.min_turn_rate)?;
        s.positive("cruise_climb_switch_secs", &mut circling.cruise_climb_switch_secs)?;
        s.positive("climb_cruise_switch_secs", &mut circling.climb_cruise_switch_secs)?;
    }

    // [wind] section
    if let Some(section) = ini.section(Some("wind")) {
        let s = Section::new("wind", section);
        let wind = &mut config.wind;
        if let Some(v) = section.get("auto_wind") {
            wind.auto_wind = parse_bool(v);
        }
        if let Some(v) = section.get("external_wind") {
            wind.external_wind = parse_bool(v);
        }
        s.parsed("forecast_temperature", "must be a number (°C)", &mut wind.forecast_temperature)?;
        if let Some(v) = non_empty(section, "sounding_file") {
            wind.sounding_file = Some(expand_tilde(v));
        }

        let speed = s.optional::<f64>("manual_wind_speed", "must be a number (m/s)")?;
        let bearing = s.optional::<f64>("manual_wind_bearing", "must be a number (degrees)")?;
        wind.manual_wind = match (speed, bearing) {
            (Some(speed), Some(bearing)) if speed >= 0.0 => Some(SpeedVector::new(bearing, speed)),
            (Some(speed), Some(_)) => {
                return Err(s.invalid("manual_wind_speed", &speed.to_string(), "must not be negative"));
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(s.invalid("manual_wind_bearing", "", "required when manual_wind_speed is set"));
            }
            (None, Some(_)) => {
                return Err(s.invalid("manual_wind_speed", "", "required when manual_wind_bearing is set"));
            }
        };
    }

    // [devices] section
    if let Some(section) = ini.section(Some("devices")) {
        if let Some(v) = section.get("slots") {
            let slots: Vec<String> = v.split(',').map(|name| name.trim().to_string()).collect();
            if slots.iter().any(|name| name.is_empty()) {
                return Err(ConfigFileError::InvalidValue {
                    section: "devices".to_string(),
                    key: "slots".to_string(),
                    value: v.to_string(),
                    reason: "expected a comma-separated list of non-empty names".to_string(),
                });
            }
            config.devices.slots = slots;
        }
    }

    // [runtime] section
    if let Some(section) = ini.section(Some("runtime")) {
        let s = Section::new("runtime", section);
        if let Some(ms) = s.optional::<u64>("tick_interval_ms", "must be a positive integer (milliseconds)")? {
            if ms == 0 {
                return Err(s.invalid("tick_interval_ms", "0", "must be a positive integer (milliseconds)"));
            }
            config.runtime.tick_interval_ms = ms;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

/// One INI section plus its name, for error reporting.
struct Section<'a> {
    name: &'static str,
    properties: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, properties: &'a Properties) -> Self {
        Self { name, properties }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Parse `key` if present and not blank.
    fn optional<T: FromStr>(&self, key: &str, reason: &str) -> Result<Option<T>, ConfigFileError> {
        match non_empty(self.properties, key) {
            Some(v) => v.parse().map(Some).map_err(|_| self.invalid(key, v, reason)),
            None => Ok(None),
        }
    }

    /// Overwrite `target` with `key` if present.
    fn parsed<T: FromStr>(&self, key: &str, reason: &str, target: &mut T) -> Result<(), ConfigFileError> {
        if let Some(value) = self.optional(key, reason)? {
            *target = value;
        }
        Ok(())
    }

    /// Overwrite `target` with `key` if present; the value must be above zero.
    fn positive(&self, key: &str, target: &mut f64) -> Result<(), ConfigFileError> {
        const REASON: &str = "must be a positive number";
        if let Some(value) = self.optional::<f64>(key, REASON)? {
            if value <= 0.0 || !value.is_finite() {
                return Err(self.invalid(key, &value.to_string(), REASON));
            }
            *target = value;
        }
        Ok(())
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a boolean value from a config string.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
