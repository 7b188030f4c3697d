//! Background daemons around the blackboard.
//!
//! ```text
//!  device adapters ──update_device/schedule_merge──► Blackboard
//!                                                        │
//!                      merge daemon (Notify) ◄───────────┤
//!                                                        │ snapshot()
//!                      tick daemon (interval) ◄──────────┘
//!                        │  expire ─ simulate ─ FlightComputer::tick
//!                        ▼
//!                SharedFlightState ──► pull (status) / push (broadcast)
//! ```
//!
//! Device adapters never wait for a merge; they write and signal. The tick
//! daemon owns the detectors, so they need no locking. Sounding fetches run
//! on the blocking pool and are picked up on a later tick.

mod config;
mod flight_runtime;
mod hooks;
mod status;
mod tick;

pub use config::{RuntimeConfig, DEFAULT_TICK_INTERVAL};
pub use flight_runtime::{FlightRuntime, RuntimeHooks};
pub use hooks::TaskResumeHook;
pub use status::FlightStatus;
pub use tick::{spawn_tick_daemon, TickPipeline};
