//! Per-source sensor snapshots.
//!
//! A [`Snapshot`] is one source's view of the aircraft: a flat set of
//! [`Timestamped`] fields, each carrying its own validity. Snapshots from
//! several sources are fused with [`Snapshot::complement`] (fill missing
//! fields, first valid value wins) and aged with [`Snapshot::expire`].
//!
//! ```ignore
//! let mut gps = Snapshot::new(clock.now());
//! gps.mark_alive();
//! gps.provide_location(GeoPoint::new(47.1, 8.4));
//! gps.provide_track_and_speed(270.0, 24.0);
//!
//! let mut merged = Snapshot::new(clock.now());
//! merged.complement(&gps);
//! ```

mod clock;
mod info;
mod timestamped;

pub use clock::ClockNormalizer;
pub use info::{timeouts, FixQuality, FlightModeSwitch, Snapshot, SwitchState};
pub use timestamped::Timestamped;
