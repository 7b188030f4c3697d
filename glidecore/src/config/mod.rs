//! User configuration.
//!
//! The INI file at `~/.glidecore/config.ini` tunes the detectors, selects
//! the wind sources, names the device slots and sets the log destination.
//! [`ConfigFile::runtime_config`] turns it into what
//! [`FlightRuntime`](crate::runtime::FlightRuntime) needs.
//!
//! # Example
//!
//! ```
//! use glidecore::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let runtime = config.runtime_config();
//! assert_eq!(runtime.tick_interval.as_millis(), 1000);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, DeviceSettings, LoggingSettings, RuntimeSettings, WindFileSettings};
