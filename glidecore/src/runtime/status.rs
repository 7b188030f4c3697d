//! What the runtime publishes after each tick.

use crate::computer::DerivedInfo;
use crate::snapshot::Snapshot;

/// One tick's result.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightStatus {
    /// Merge sequence number of `snapshot`.
    pub sequence: u64,
    /// The canonical snapshot the tick ran on.
    pub snapshot: Snapshot,
    pub derived: DerivedInfo,
}
