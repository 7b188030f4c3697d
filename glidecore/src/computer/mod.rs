//! Per-tick flight computation.
//!
//! [`FlightComputer::tick`] takes one canonical [`Snapshot`](crate::snapshot::Snapshot)
//! and runs, in order:
//!
//! 1. derived basics: heading, navigation altitude, energy height, brutto
//!    vario, height above ground from a [`TerrainModel`]
//! 2. the flying detector
//! 3. the circling detector
//! 4. wind estimation and selection
//!
//! The results are collected in [`DerivedInfo`].

mod derived;
mod flight_computer;
mod terrain;

pub use derived::{energy_height, DerivedInfo};
pub use flight_computer::FlightComputer;
pub use terrain::{FlatTerrain, NoTerrain, TerrainModel};
