//! Multi-source blackboard.
//!
//! The blackboard holds one [`Snapshot`](crate::snapshot::Snapshot) per
//! connected device, plus one for the built-in simulator and one for replay,
//! and fuses them into the canonical snapshot the rest of the core reads.
//!
//! # Merge
//!
//! ```text
//!  slot 0 ──┐
//!  slot 1 ──┼─ expire ─ complement (first valid wins) ─ normalize clock ─┐
//!  slot N ──┘                                                            │
//!                                                                        ▼
//!  replay (alive?) ────────────────────────────► canonical ◄── simulator (alive?)
//! ```
//!
//! Priority is replay, then simulator, then the fused devices. Every merge
//! bumps a sequence number, so readers can tell merges apart and never see
//! an older canonical snapshot after a newer one.
//!
//! # Usage
//!
//! ```ignore
//! let board = Arc::new(Blackboard::new(["flarm", "vario"], time_source));
//! let daemon = spawn_merge_daemon(Arc::clone(&board), cancellation.clone());
//!
//! // device I/O thread
//! board.with_device(0, |data| {
//!     data.mark_alive();
//!     data.provide_location(fix);
//! })?;
//! board.schedule_merge();
//!
//! // consumer
//! let CanonicalSnapshot { sequence, snapshot } = board.snapshot();
//! ```

mod board;
mod daemon;
mod error;

pub use board::{Blackboard, CanonicalSnapshot};
pub use daemon::spawn_merge_daemon;
pub use error::BlackboardError;
