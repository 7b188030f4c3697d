//! The multi-source blackboard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::geo::GeoPoint;
use crate::simulator::Simulator;
use crate::snapshot::{ClockNormalizer, Snapshot};
use crate::time_source::TimeSource;

use super::error::BlackboardError;

/// A copy of the canonical snapshot together with the merge that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSnapshot {
    /// Merge sequence number. Strictly increasing over merges.
    pub sequence: u64,
    /// The fused snapshot.
    pub snapshot: Snapshot,
}

/// One connected device.
#[derive(Debug, Clone)]
struct DeviceSlot {
    name: String,
    data: Snapshot,
}

/// Everything guarded by the blackboard lock.
struct BoardState {
    /// Device slots in merge priority order.
    devices: Vec<DeviceSlot>,

    simulator: Option<Simulator>,
    simulator_data: Snapshot,

    replay_data: Snapshot,

    /// Fusion of all device slots from the last merge.
    real_data: Snapshot,

    canonical: Snapshot,
    sequence: u64,

    real_clock: ClockNormalizer,
    replay_clock: ClockNormalizer,

    /// Last flying flag reported by the tick pipeline.
    flying: bool,
}

/// Owns every source snapshot and produces the canonical one.
///
/// Device adapters write into their slot with [`update_device`] or
/// [`with_device`] and then call [`schedule_merge`], which never blocks on a
/// merge. The merge daemon (see [`spawn_merge_daemon`]) or the next
/// [`snapshot`] reader performs the pending merge.
///
/// Slot order is merge priority: for every field, the first alive slot that
/// has it valid wins.
///
/// [`update_device`]: Self::update_device
/// [`with_device`]: Self::with_device
/// [`schedule_merge`]: Self::schedule_merge
/// [`snapshot`]: Self::snapshot
/// [`spawn_merge_daemon`]: super::spawn_merge_daemon
pub struct Blackboard {
    time_source: Arc<dyn TimeSource>,
    state: Mutex<BoardState>,
    merge_pending: AtomicBool,
    merge_notify: Notify,
}

impl Blackboard {
    /// Create a blackboard with one slot per device name, in priority order.
    pub fn new<I, S>(device_names: I, time_source: Arc<dyn TimeSource>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = time_source.now();
        let devices = device_names
            .into_iter()
            .map(|name| DeviceSlot {
                name: name.into(),
                data: Snapshot::new(now),
            })
            .collect();

        Self {
            time_source,
            state: Mutex::new(BoardState {
                devices,
                simulator: None,
                simulator_data: Snapshot::new(now),
                replay_data: Snapshot::new(now),
                real_data: Snapshot::new(now),
                canonical: Snapshot::new(now),
                sequence: 0,
                real_clock: ClockNormalizer::new(),
                replay_clock: ClockNormalizer::new(),
                flying: false,
            }),
            merge_pending: AtomicBool::new(false),
            merge_notify: Notify::new(),
        }
    }

    /// Current reading of the blackboard clock.
    pub fn now(&self) -> f64 {
        self.time_source.now()
    }

    /// Number of device slots.
    pub fn device_count(&self) -> usize {
        self.state.lock().devices.len()
    }

    /// Device names in priority order.
    pub fn device_names(&self) -> Vec<String> {
        self.state
            .lock()
            .devices
            .iter()
            .map(|slot| slot.name.clone())
            .collect()
    }

    /// Slot index of the device called `name`.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.state
            .lock()
            .devices
            .iter()
            .position(|slot| slot.name == name)
    }

    /// Replace the snapshot of device `slot`.
    ///
    /// The snapshot may be stamped on any clock: it is rebased so that its
    /// own clock reading maps to the blackboard's current time.
    pub fn update_device(&self, slot: usize, mut snapshot: Snapshot) -> Result<(), BlackboardError> {
        snapshot.rebase(self.now());
        let mut state = self.state.lock();
        let count = state.devices.len();
        let device = state
            .devices
            .get_mut(slot)
            .ok_or(BlackboardError::UnknownSlot { slot, count })?;
        device.data = snapshot;
        Ok(())
    }

    /// Edit device `slot` in place under the lock.
    ///
    /// The slot's clock is advanced to now before `f` runs, so the
    /// `provide_*` helpers stamp fields with the current time.
    pub fn with_device<R>(
        &self,
        slot: usize,
        f: impl FnOnce(&mut Snapshot) -> R,
    ) -> Result<R, BlackboardError> {
        let now = self.now();
        let mut state = self.state.lock();
        let count = state.devices.len();
        let device = state
            .devices
            .get_mut(slot)
            .ok_or(BlackboardError::UnknownSlot { slot, count })?;
        device.data.update_clock(now);
        Ok(f(&mut device.data))
    }

    /// Forget everything device `slot` reported, e.g. on connection loss.
    pub fn reset_device(&self, slot: usize) -> Result<(), BlackboardError> {
        let now = self.now();
        {
            let mut state = self.state.lock();
            let count = state.devices.len();
            let device = state
                .devices
                .get_mut(slot)
                .ok_or(BlackboardError::UnknownSlot { slot, count })?;
            device.data = Snapshot::new(now);
            tracing::debug!(slot, name = %device.name, "Device slot reset");
        }
        self.schedule_merge();
        Ok(())
    }

    /// Request a merge before the next read. Never blocks.
    pub fn schedule_merge(&self) {
        if !self.merge_pending.swap(true, Ordering::AcqRel) {
            self.merge_notify.notify_one();
        }
    }

    /// Whether a merge has been requested and not yet performed.
    pub fn is_merge_scheduled(&self) -> bool {
        self.merge_pending.load(Ordering::Acquire)
    }

    /// Perform a merge if one was scheduled. Returns the new sequence number.
    pub fn merge_if_scheduled(&self) -> Option<u64> {
        if self.merge_pending.swap(false, Ordering::AcqRel) {
            Some(self.merge())
        } else {
            None
        }
    }

    /// Fuse all sources into a new canonical snapshot.
    ///
    /// Returns the sequence number of this merge.
    pub fn merge(&self) -> u64 {
        let now = self.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.real_data.update_clock(now);
        state.real_data.reset();

        for (slot, device) in state.devices.iter_mut().enumerate() {
            if !device.data.is_alive() {
                continue;
            }

            device.data.update_clock(now);
            if device.data.expire_wall_clock() {
                tracing::debug!(slot, name = %device.name, "Device silent, dropped from merge");
                continue;
            }
            device.data.expire();
            state.real_data.complement(&device.data);
        }

        state.real_clock.normalize(&mut state.real_data);

        let mut canonical = if state.replay_data.is_alive() {
            state.replay_data.expire();
            let mut replay = state.replay_data.clone();
            state.replay_clock.normalize(&mut replay);
            replay
        } else if state.simulator_data.is_alive() {
            state.simulator_data.update_clock(now);
            state.simulator_data.expire();
            state.simulator_data.clone()
        } else {
            state.real_data.clone()
        };
        canonical.update_clock(now);

        state.sequence += 1;
        state.canonical = canonical;
        tracing::trace!(sequence = state.sequence, "Blackboard merged");
        state.sequence
    }

    /// A copy of the canonical snapshot.
    ///
    /// A pending merge is performed first so that readers never see data
    /// older than the last scheduled update.
    pub fn snapshot(&self) -> CanonicalSnapshot {
        self.merge_if_scheduled();
        let state = self.state.lock();
        CanonicalSnapshot {
            sequence: state.sequence,
            snapshot: state.canonical.clone(),
        }
    }

    /// The fused device data from the last merge, ignoring simulator and
    /// replay.
    pub fn real_snapshot(&self) -> Snapshot {
        self.state.lock().real_data.clone()
    }

    /// Sequence number of the last merge.
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Drop devices that have been silent for too long.
    ///
    /// Dead slots are reset and a merge is scheduled.
    pub fn expire_wall_clock(&self) {
        let now = self.now();
        let mut modified = false;
        {
            let mut state = self.state.lock();
            if !state.canonical.is_alive() {
                return;
            }

            for (slot, device) in state.devices.iter_mut().enumerate() {
                if !device.data.is_alive() {
                    continue;
                }
                device.data.update_clock(now);
                if device.data.expire_wall_clock() {
                    tracing::debug!(slot, name = %device.name, "Device timed out");
                    modified = true;
                }
            }
        }

        if modified {
            self.schedule_merge();
        }
    }

    /// Show `location` until a real fix arrives.
    ///
    /// Every source without a valid location gets it as an invalid
    /// placeholder. Ignored while flying.
    pub fn set_startup_location(&self, location: GeoPoint, altitude: f64) {
        {
            let mut state = self.state.lock();
            if state.flying {
                return;
            }

            for device in state.devices.iter_mut() {
                if !device.data.location.is_valid() {
                    device.data.set_fake_location(location, altitude);
                }
            }
            if !state.real_data.location.is_valid() {
                state.real_data.set_fake_location(location, altitude);
            }

            let state = &mut *state;
            if let Some(simulator) = state.simulator.as_mut() {
                simulator.location = location;
                simulator.altitude = altitude;
                simulator.touch(&mut state.simulator_data);
            }
        }
        self.schedule_merge();
    }

    /// Record the flying flag computed by the tick pipeline.
    pub fn set_flying(&self, flying: bool) {
        self.state.lock().flying = flying;
    }

    /// Replace the replay snapshot. While alive it overrides every other
    /// source.
    pub fn update_replay(&self, mut snapshot: Snapshot) {
        snapshot.replay = true;
        self.state.lock().replay_data = snapshot;
        self.schedule_merge();
    }

    /// Stop replaying and return to live sources.
    pub fn stop_replay(&self) {
        let now = self.now();
        {
            let mut state = self.state.lock();
            state.replay_data = Snapshot::new(now);
            state.replay_clock.reset();
        }
        tracing::debug!("Replay stopped");
        self.schedule_merge();
    }

    /// Switch the simulator on.
    pub fn enable_simulator(&self, simulator: Simulator) {
        let now = self.now();
        {
            let mut state = self.state.lock();
            let mut data = Snapshot::new(now);
            simulator.touch(&mut data);
            state.simulator_data = data;
            state.simulator = Some(simulator);
        }
        tracing::info!("Simulator enabled");
        self.schedule_merge();
    }

    /// Switch the simulator off.
    pub fn disable_simulator(&self) {
        let now = self.now();
        {
            let mut state = self.state.lock();
            state.simulator = None;
            state.simulator_data = Snapshot::new(now);
        }
        tracing::info!("Simulator disabled");
        self.schedule_merge();
    }

    /// Whether the simulator is on.
    pub fn is_simulator(&self) -> bool {
        self.state.lock().simulator.is_some()
    }

    /// Edit the simulator and its snapshot under the lock.
    ///
    /// Returns `None` when the simulator is off.
    pub fn with_simulator<R>(&self, f: impl FnOnce(&mut Simulator, &mut Snapshot) -> R) -> Option<R> {
        let now = self.now();
        let result = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let simulator = state.simulator.as_mut()?;
            state.simulator_data.update_clock(now);
            f(simulator, &mut state.simulator_data)
        };
        self.schedule_merge();
        Some(result)
    }

    /// Advance the simulated aircraft by `dt` seconds.
    pub fn process_simulation(&self, dt: f64) {
        self.with_simulator(|simulator, data| simulator.process(data, dt));
    }

    /// Wait until a merge is requested.
    pub(crate) async fn merge_requested(&self) {
        self.merge_notify.notified().await;
    }
}
