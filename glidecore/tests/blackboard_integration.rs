//! Integration tests for the multi-source blackboard.
//!
//! These tests drive the blackboard the way device adapters do:
//! - Several devices write into their slots and a merge fuses them
//! - Silent devices drop out of the merge
//! - Replay and simulator sources override the devices
//! - The merge daemon picks up scheduled merges
//!
//! Run with: `cargo test --test blackboard_integration`

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use glidecore::blackboard::{spawn_merge_daemon, Blackboard, BlackboardError};
use glidecore::geo::{GeoPoint, SpeedVector};
use glidecore::simulator::Simulator;
use glidecore::snapshot::Snapshot;
use glidecore::time_source::ManualTimeSource;

// ============================================================================
// Test Helpers
// ============================================================================

const GPS: usize = 0;
const VARIO: usize = 1;
const FLARM: usize = 2;

fn create_board() -> (Arc<Blackboard>, ManualTimeSource) {
    let clock = ManualTimeSource::new(1000.0);
    let board = Arc::new(Blackboard::new(["gps", "vario", "flarm"], Arc::new(clock.clone())));
    (board, clock)
}

fn provide_fix(board: &Blackboard, slot: usize, time: f64, location: GeoPoint, altitude: f64) {
    board
        .with_device(slot, |data| {
            data.mark_alive();
            data.provide_time(time);
            data.provide_location(location);
            data.provide_gps_altitude(altitude);
        })
        .unwrap();
    board.schedule_merge();
}

// ============================================================================
// Merge
// ============================================================================

#[test]
fn test_three_devices_with_one_silent() {
    let (board, clock) = create_board();

    // the flarm reports once, then goes quiet
    board
        .with_device(FLARM, |data| {
            data.mark_alive();
            data.provide_location(GeoPoint::new(45.0, 6.0));
            data.provide_total_energy_vario(-3.0);
            data.provide_external_wind(SpeedVector::new(180.0, 12.0));
        })
        .unwrap();
    clock.advance(20.0);

    provide_fix(&board, GPS, 36_000.0, GeoPoint::new(47.0, 8.0), 900.0);
    board
        .with_device(VARIO, |data| {
            data.mark_alive();
            data.provide_total_energy_vario(2.5);
        })
        .unwrap();
    board.schedule_merge();

    let canonical = board.snapshot().snapshot;
    assert_eq!(canonical.location.get(), Some(&GeoPoint::new(47.0, 8.0)));
    assert_eq!(canonical.gps_altitude.get(), Some(&900.0));
    assert_eq!(canonical.total_energy_vario.get(), Some(&2.5));
    assert!(!canonical.external_wind.is_valid());
}

#[test]
fn test_slot_order_is_priority() {
    let (board, _clock) = create_board();

    provide_fix(&board, FLARM, 100.0, GeoPoint::new(45.0, 6.0), 500.0);
    provide_fix(&board, VARIO, 100.0, GeoPoint::new(46.0, 7.0), 600.0);

    let canonical = board.snapshot().snapshot;
    assert_eq!(canonical.location.get(), Some(&GeoPoint::new(46.0, 7.0)));
    assert_eq!(canonical.gps_altitude.get(), Some(&600.0));
}

#[test]
fn test_lower_priority_fills_missing_fields_only() {
    let (board, _clock) = create_board();

    provide_fix(&board, GPS, 100.0, GeoPoint::new(47.0, 8.0), 900.0);
    board
        .with_device(FLARM, |data| {
            data.mark_alive();
            data.provide_location(GeoPoint::new(45.0, 6.0));
            data.provide_track_and_speed(270.0, 30.0);
        })
        .unwrap();
    board.schedule_merge();

    let canonical = board.snapshot().snapshot;
    assert_eq!(canonical.location.get(), Some(&GeoPoint::new(47.0, 8.0)));
    assert_eq!(canonical.track.get(), Some(&270.0));
}

#[test]
fn test_stale_field_expires_but_device_survives() {
    let (board, clock) = create_board();

    board
        .with_device(GPS, |data| {
            data.mark_alive();
            data.provide_total_energy_vario(1.0);
        })
        .unwrap();
    clock.advance(8.0);
    board
        .with_device(GPS, |data| {
            data.mark_alive();
            data.provide_location(GeoPoint::new(47.0, 8.0));
        })
        .unwrap();
    board.schedule_merge();

    let canonical = board.snapshot().snapshot;
    assert!(canonical.location.is_valid());
    assert!(!canonical.total_energy_vario.is_valid());
}

#[test]
fn test_update_device_replaces_slot() {
    let (board, _clock) = create_board();
    provide_fix(&board, VARIO, 100.0, GeoPoint::new(46.0, 7.0), 600.0);
    board
        .with_device(GPS, |data| {
            data.mark_alive();
            data.provide_total_energy_vario(0.5);
        })
        .unwrap();

    // an adapter that keeps its own clock hands over a complete snapshot
    let mut received = Snapshot::new(0.0);
    received.mark_alive();
    received.provide_time(36_000.0);
    received.provide_location(GeoPoint::new(47.0, 8.0));
    received.provide_gps_altitude(900.0);
    board.update_device(GPS, received).unwrap();
    board.schedule_merge();

    let canonical = board.snapshot().snapshot;
    assert_eq!(canonical.location.get(), Some(&GeoPoint::new(47.0, 8.0)));
    assert_eq!(canonical.gps_altitude.get(), Some(&900.0));
    assert_eq!(canonical.time.get(), Some(&36_000.0));
    // the old slot content is gone, so the vario comes from nowhere
    assert!(!canonical.total_energy_vario.is_valid());
}

#[test]
fn test_scheduled_merges_coalesce() {
    let (board, _clock) = create_board();

    for i in 0..5 {
        provide_fix(&board, GPS, 100.0 + i as f64, GeoPoint::new(47.0, 8.0), 900.0);
    }
    assert!(board.is_merge_scheduled());

    assert_eq!(board.snapshot().sequence, 1);
    assert_eq!(board.snapshot().sequence, 1);
}

#[test]
fn test_unknown_slot_is_an_error() {
    let (board, _clock) = create_board();
    let err = board.with_device(7, |_| ()).unwrap_err();
    assert_eq!(err, BlackboardError::UnknownSlot { slot: 7, count: 3 });
}

#[test]
fn test_reset_device_forgets_values() {
    let (board, _clock) = create_board();
    provide_fix(&board, GPS, 100.0, GeoPoint::new(47.0, 8.0), 900.0);
    assert!(board.snapshot().snapshot.location.is_valid());

    board.reset_device(GPS).unwrap();
    assert!(!board.snapshot().snapshot.location.is_valid());
}

// ============================================================================
// Source priority
// ============================================================================

#[test]
fn test_replay_beats_simulator_beats_devices() {
    let (board, _clock) = create_board();
    provide_fix(&board, GPS, 100.0, GeoPoint::new(47.0, 8.0), 900.0);

    board.enable_simulator(Simulator::new(GeoPoint::new(46.0, 7.0), 1500.0));
    let canonical = board.snapshot().snapshot;
    assert!(canonical.simulator);
    assert_eq!(canonical.location.get(), Some(&GeoPoint::new(46.0, 7.0)));

    let mut replay = Snapshot::new(board.now());
    replay.mark_alive();
    replay.provide_time(50_000.0);
    replay.provide_location(GeoPoint::new(45.0, 6.0));
    board.update_replay(replay);

    let canonical = board.snapshot().snapshot;
    assert!(canonical.replay);
    assert_eq!(canonical.location.get(), Some(&GeoPoint::new(45.0, 6.0)));

    board.stop_replay();
    assert!(board.snapshot().snapshot.simulator);

    board.disable_simulator();
    let canonical = board.snapshot().snapshot;
    assert!(!canonical.simulator);
    assert_eq!(canonical.location.get(), Some(&GeoPoint::new(47.0, 8.0)));
}

#[test]
fn test_real_snapshot_ignores_simulator() {
    let (board, _clock) = create_board();
    provide_fix(&board, GPS, 100.0, GeoPoint::new(47.0, 8.0), 900.0);
    board.enable_simulator(Simulator::new(GeoPoint::new(46.0, 7.0), 1500.0));
    board.snapshot();

    assert_eq!(
        board.real_snapshot().location.get(),
        Some(&GeoPoint::new(47.0, 8.0))
    );
}

#[test]
fn test_startup_location_ignored_while_flying() {
    let (board, _clock) = create_board();

    board.set_flying(true);
    board.set_startup_location(GeoPoint::new(46.0, 7.0), 500.0);
    assert!(board.snapshot().snapshot.location.raw() != &GeoPoint::new(46.0, 7.0));

    board.set_flying(false);
    board.set_startup_location(GeoPoint::new(46.0, 7.0), 500.0);
    let canonical = board.snapshot().snapshot;
    assert!(!canonical.location.is_valid());
}

// ============================================================================
// Merge daemon
// ============================================================================

#[tokio::test]
async fn test_merge_daemon_follows_device_updates() {
    let (board, _clock) = create_board();
    let cancellation = CancellationToken::new();
    let handle = spawn_merge_daemon(Arc::clone(&board), cancellation.clone());

    provide_fix(&board, GPS, 100.0, GeoPoint::new(47.0, 8.0), 900.0);

    tokio::time::timeout(Duration::from_secs(5), async {
        while board.sequence() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("merge daemon did not merge");

    assert!(!board.is_merge_scheduled());
    let canonical = board.snapshot().snapshot;
    assert!(canonical.location.is_valid());

    cancellation.cancel();
    handle.await.unwrap();
}
