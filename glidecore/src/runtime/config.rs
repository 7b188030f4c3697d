//! Runtime configuration.

use std::time::Duration;

use crate::circling::CirclingConfig;
use crate::flight::FlyingConfig;
use crate::wind::WindSettings;

/// Default interval of the tick daemon.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the runtime needs to drive the detectors.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub tick_interval: Duration,
    pub flying: FlyingConfig,
    pub circling: CirclingConfig,
    pub wind: WindSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            flying: FlyingConfig::default(),
            circling: CirclingConfig::default(),
            wind: WindSettings::default(),
        }
    }
}
