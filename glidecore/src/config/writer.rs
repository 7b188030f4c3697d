//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let flight = &config.flight;
    let circling = &config.circling;
    let wind = &config.wind;

    let (manual_wind_speed, manual_wind_bearing) = wind
        .manual_wind
        .map(|w| (w.norm.to_string(), w.bearing.to_string()))
        .unwrap_or_default();
    let sounding_file = wind
        .sounding_file
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[flight]
; Ground speed that counts as moving, in m/s
takeoff_speed = {}
; Seconds of continuous movement before a takeoff is confirmed
takeoff_confirm_secs = {}
; Seconds without movement before the aircraft counts as on the ground
on_ground_secs = {}
; Seconds of continuous sink before release from tow is detected
release_sink_secs = {}
; Engine noise level above which the engine counts as running
engine_noise_on = {}
; Engine noise level at or below which the engine counts as stopped
engine_noise_off = {}
; Seconds a noise level must persist before the power state changes
engine_hysteresis_secs = {}
; Seconds on the ground after which a resumable task is discarded
task_resume_timeout_secs = {}

[circling]
; Let an external switch force circling or cruise mode
external_trigger_cruise = {}
; Smoothed turn rate that counts as turning, in deg/s
min_turn_rate = {}
; Seconds of turning before circling is confirmed
cruise_climb_switch_secs = {}
; Seconds of straight flight before cruise is confirmed
climb_cruise_switch_secs = {}

[wind]
; Estimate wind from circling and airspeed
auto_wind = {}
; Prefer wind reported by a connected instrument
external_wind = {}
; Manual wind, speed in m/s and the bearing it blows from (leave empty for none)
manual_wind_speed = {}
manual_wind_bearing = {}
; Expected ground temperature for the thermal ceiling, in °C
forecast_temperature = {}
; RAOB sounding file used as the forecast wind source (leave empty to disable)
sounding_file = {}

[devices]
; Comma-separated device slots, highest merge priority first
slots = {}

[runtime]
; Interval between flight state updates, in milliseconds
tick_interval_ms = {}

[logging]
; Log directory
directory = {}
; Log file name, truncated at every start
file = {}
"#,
        flight.takeoff_speed,
        flight.takeoff_confirm_secs,
        flight.on_ground_secs,
        flight.release_sink_secs,
        flight.engine_noise_on,
        flight.engine_noise_off,
        flight.engine_hysteresis_secs,
        flight.task_resume_timeout_secs,
        circling.external_trigger_cruise,
        circling.min_turn_rate,
        circling.cruise_climb_switch_secs,
        circling.climb_cruise_switch_secs,
        wind.auto_wind,
        wind.external_wind,
        manual_wind_speed,
        manual_wind_bearing,
        wind.forecast_temperature,
        sounding_file,
        config.devices.slots.join(", "),
        config.runtime.tick_interval_ms,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert a path to a string, collapsing the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
