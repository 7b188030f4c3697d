//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::circling::CirclingConfig;
use crate::flight::FlyingConfig;
use crate::geo::SpeedVector;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// `[flight]` flying detector tuning
    pub flight: FlyingConfig,
    /// `[circling]` circling detector tuning
    pub circling: CirclingConfig,
    /// `[wind]` wind estimation and selection
    pub wind: WindFileSettings,
    /// `[devices]` device slots in merge priority order
    pub devices: DeviceSettings,
    /// `[runtime]` daemon timing
    pub runtime: RuntimeSettings,
    /// `[logging]` log destination
    pub logging: LoggingSettings,
}

/// Wind configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WindFileSettings {
    /// Run the automatic estimators
    pub auto_wind: bool,
    /// Prefer wind reported by an instrument
    pub external_wind: bool,
    /// Wind entered by hand, if any
    pub manual_wind: Option<SpeedVector>,
    /// Ground temperature for the thermal ceiling (°C)
    pub forecast_temperature: f64,
    /// RAOB sounding file used as the forecast source
    pub sounding_file: Option<PathBuf>,
}

/// Device slot configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    /// Slot names; the first has the highest merge priority
    pub slots: Vec<String>,
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    /// Tick daemon interval in milliseconds
    pub tick_interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}
