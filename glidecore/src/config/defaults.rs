//! Default values for all configuration settings.

use crate::circling::CirclingConfig;
use crate::flight::FlyingConfig;
use crate::logging::{default_log_dir, DEFAULT_LOG_FILE};

use super::settings::*;

pub const DEFAULT_AUTO_WIND: bool = true;
pub const DEFAULT_EXTERNAL_WIND: bool = true;
pub const DEFAULT_FORECAST_TEMPERATURE: f64 = 25.0;
pub const DEFAULT_DEVICE_SLOTS: &[&str] = &["primary", "secondary"];
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            flight: FlyingConfig::default(),
            circling: CirclingConfig::default(),
            wind: WindFileSettings::default(),
            devices: DeviceSettings::default(),
            runtime: RuntimeSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for WindFileSettings {
    fn default() -> Self {
        Self {
            auto_wind: DEFAULT_AUTO_WIND,
            external_wind: DEFAULT_EXTERNAL_WIND,
            manual_wind: None,
            forecast_temperature: DEFAULT_FORECAST_TEMPERATURE,
            sounding_file: None,
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            slots: DEFAULT_DEVICE_SLOTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
