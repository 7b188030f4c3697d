//! Provider traits and shared wrapper for the flight state.
//!
//! - [`FlightStateProvider`] - query API (pull)
//! - [`FlightStateBroadcaster`] - subscription API (push)
//! - [`SharedFlightState`] - thread-safe wrapper combining both

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::runtime::FlightStatus;
use crate::wind::WindEstimate;

/// Capacity of the status broadcast channel.
pub const STATUS_CHANNEL_CAPACITY: usize = 16;

/// Trait for querying the flight state (pull API).
pub trait FlightStateProvider: Send + Sync {
    /// Latest published status, if any tick has run yet.
    fn status(&self) -> Option<FlightStatus>;

    /// Whether the aircraft is airborne.
    fn is_flying(&self) -> bool {
        self.status().is_some_and(|status| status.derived.flying.flying)
    }

    /// Whether a climb is confirmed.
    fn is_circling(&self) -> bool {
        self.status().is_some_and(|status| status.derived.circling.circling)
    }

    /// The selected wind.
    fn wind(&self) -> WindEstimate {
        self.status().map(|status| status.derived.wind).unwrap_or_default()
    }
}

/// Trait for subscribing to status updates (push API).
///
/// One status is sent per tick.
pub trait FlightStateBroadcaster: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<FlightStatus>;
}

struct Inner {
    latest: RwLock<Option<FlightStatus>>,
    sender: broadcast::Sender<FlightStatus>,
}

/// Latest flight status plus its broadcast channel.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct SharedFlightState {
    inner: Arc<Inner>,
}

impl Default for SharedFlightState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedFlightState {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                latest: RwLock::new(None),
                sender,
            }),
        }
    }

    /// Store `status` and send it to subscribers.
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, status: FlightStatus) {
        *self.inner.latest.write() = Some(status.clone());
        let _ = self.inner.sender.send(status);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

impl FlightStateProvider for SharedFlightState {
    fn status(&self) -> Option<FlightStatus> {
        self.inner.latest.read().clone()
    }
}

impl FlightStateBroadcaster for SharedFlightState {
    fn subscribe(&self) -> broadcast::Receiver<FlightStatus> {
        self.inner.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computer::DerivedInfo;
    use crate::snapshot::Snapshot;

    fn status(sequence: u64, flying: bool) -> FlightStatus {
        let mut derived = DerivedInfo::default();
        derived.flying.flying = flying;
        FlightStatus {
            sequence,
            snapshot: Snapshot::default(),
            derived,
        }
    }

    #[test]
    fn test_empty_state() {
        let shared = SharedFlightState::new();
        assert!(shared.status().is_none());
        assert!(!shared.is_flying());
        assert!(!shared.is_circling());
        assert!(!shared.wind().is_available());
    }

    #[test]
    fn test_publish_updates_latest() {
        let shared = SharedFlightState::new();
        shared.publish(status(1, false));
        shared.publish(status(2, true));

        assert_eq!(shared.status().map(|s| s.sequence), Some(2));
        assert!(shared.is_flying());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let shared = SharedFlightState::new();
        assert_eq!(shared.subscriber_count(), 0);
        shared.publish(status(1, false));
        assert!(shared.status().is_some());
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let shared = SharedFlightState::new();
        let mut rx = shared.subscribe();
        let clone = shared.clone();

        clone.publish(status(7, true));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.sequence, 7);
        assert!(received.derived.flying.flying);
    }
}
