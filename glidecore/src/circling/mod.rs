//! Circling detection.
//!
//! The smoothed turn rate drives a four-state mode machine (see
//! [`transition`]). A climb is confirmed after 15 s of turning and a
//! return to cruise after 10 s of straight flight; a switch box can force
//! either mode when `external_trigger_cruise` is enabled.

mod detector;
mod mode;
mod state;

pub use detector::{CirclingConfig, CirclingDetector};
pub use mode::{transition, Capture, CirclingMode, ForcedMode, PhaseMark, SwitchDelays, Transition};
pub use state::CirclingState;
