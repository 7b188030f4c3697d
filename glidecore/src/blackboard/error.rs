//! Error types for the blackboard.

use thiserror::Error;

/// Errors returned to device adapters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlackboardError {
    /// The adapter addressed a slot that was never configured.
    #[error("Unknown device slot {slot} (blackboard has {count} slots)")]
    UnknownSlot { slot: usize, count: usize },
}
