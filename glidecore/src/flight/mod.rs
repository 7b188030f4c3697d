//! Flying-state detection.
//!
//! [`FlyingDetector`] turns the canonical snapshot into a [`FlyingState`]
//! once per tick and reports every transition as a [`FlightEvent`]:
//!
//! | Event | Condition |
//! |-------|-----------|
//! | Takeoff | fast (or high above ground) for `takeoff_confirm_secs` |
//! | Landing | slow and not climbing until the moving clock drains |
//! | Release | losing height for `release_sink_secs` after takeoff |
//! | PowerOn / PowerOff | engine noise beyond a threshold for `engine_hysteresis_secs` |
//! | TaskResumeInvalidated | stationary for `task_resume_timeout_secs` |
//!
//! Samples less than 0.5 s apart are accumulated; a step backwards or of
//! more than 20 s resets the detector and the flying state.

mod clock;
mod detector;
mod state;

pub use clock::{DeltaTime, StateClock, TimeStep};
pub use detector::{AircraftState, FlyingConfig, FlyingDetector};
pub use state::{FlightEvent, FlyingState};
