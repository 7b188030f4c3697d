//! glidecore - Flight-state estimation for glide computers
//!
//! This library merges data from several sensor devices into one canonical
//! snapshot and derives the flight phase and the wind from it.
//!
//! # Architecture
//!
//! - [`blackboard`] holds one [`Snapshot`](snapshot::Snapshot) per device and
//!   merges them by priority into the canonical snapshot
//! - [`flight`] detects takeoff, landing, release and powered flight
//! - [`circling`] detects circling and tracks climb/cruise statistics
//! - [`wind`] estimates the wind and picks the one to display
//! - [`computer`] runs the detectors in order once per tick
//! - [`runtime`] drives the merge and tick daemons on tokio
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use glidecore::blackboard::Blackboard;
//! use glidecore::config::ConfigFile;
//! use glidecore::provider::FlightStateProvider;
//! use glidecore::runtime::{FlightRuntime, RuntimeHooks};
//! use glidecore::time_source::MonotonicTimeSource;
//!
//! let config = ConfigFile::load()?;
//! let board = Arc::new(Blackboard::new(&config.devices.slots, Arc::new(MonotonicTimeSource::new())));
//! let runtime = FlightRuntime::start(board, config.runtime_config(), RuntimeHooks::default());
//!
//! if runtime.shared().is_circling() {
//!     // ...
//! }
//! runtime.shutdown().await;
//! ```

pub mod blackboard;
pub mod circling;
pub mod computer;
pub mod config;
pub mod flight;
pub mod geo;
pub mod logging;
pub mod provider;
pub mod runtime;
pub mod simulator;
pub mod snapshot;
pub mod time_source;
pub mod wind;

/// Version of the glidecore library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
