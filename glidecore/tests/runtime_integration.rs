//! Integration tests for the flight runtime.
//!
//! These tests run the merge and tick daemons on tokio and observe them
//! through [`SharedFlightState`]:
//! - Device updates reach the published status
//! - Manual wind entry and automatic wind switching
//! - The simulator flies through the full pipeline
//! - Shutdown stops both daemons
//!
//! Run with: `cargo test --test runtime_integration`

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use glidecore::blackboard::Blackboard;
use glidecore::config::ConfigFile;
use glidecore::geo::{GeoPoint, SpeedVector};
use glidecore::provider::{FlightStateBroadcaster, FlightStateProvider};
use glidecore::runtime::{FlightRuntime, FlightStatus, RuntimeConfig, RuntimeHooks};
use glidecore::simulator::Simulator;
use glidecore::time_source::ManualTimeSource;
use glidecore::wind::WindSource;

// ============================================================================
// Test Helpers
// ============================================================================

fn fast_config() -> RuntimeConfig {
    RuntimeConfig {
        tick_interval: Duration::from_millis(10),
        ..RuntimeConfig::default()
    }
}

fn create_board() -> Arc<Blackboard> {
    Arc::new(Blackboard::new(["gps", "vario"], Arc::new(ManualTimeSource::new(0.0))))
}

/// Wait for the first status matching `predicate`.
async fn wait_for(
    updates: &mut broadcast::Receiver<FlightStatus>,
    limit: Duration,
    predicate: impl Fn(&FlightStatus) -> bool,
) -> FlightStatus {
    tokio::time::timeout(limit, async {
        loop {
            match updates.recv().await {
                Ok(status) if predicate(&status) => return status,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("status channel closed"),
            }
        }
    })
    .await
    .expect("no matching status in time")
}

// ============================================================================
// Device data
// ============================================================================

#[tokio::test]
async fn test_device_update_is_published() {
    let board = create_board();
    let runtime = FlightRuntime::start(Arc::clone(&board), fast_config(), RuntimeHooks::default());
    let shared = runtime.shared();
    let mut updates = shared.subscribe();

    board
        .with_device(1, |data| {
            data.mark_alive();
            data.provide_time(43_200.0);
            data.provide_location(GeoPoint::new(47.0, 8.0));
            data.provide_total_energy_vario(1.2);
        })
        .unwrap();
    board.schedule_merge();

    let status = wait_for(&mut updates, Duration::from_secs(5), |status| {
        status.snapshot.location.is_valid()
    })
    .await;
    assert_eq!(status.snapshot.total_energy_vario.value(), Some(1.2));
    assert_eq!(status.derived.brutto_vario, Some(1.2));
    assert!(!shared.is_flying());
    assert!(shared.status().is_some());

    runtime.shutdown().await;
}

// ============================================================================
// Wind settings
// ============================================================================

#[tokio::test]
async fn test_manual_wind_round_trip() {
    let board = create_board();
    let runtime = FlightRuntime::start(Arc::clone(&board), fast_config(), RuntimeHooks::default());
    let mut updates = runtime.shared().subscribe();

    let manual = SpeedVector::new(240.0, 6.0);
    runtime.set_manual_wind(manual);
    let status = wait_for(&mut updates, Duration::from_secs(5), |status| {
        status.derived.wind.source == WindSource::Manual
    })
    .await;
    assert_eq!(status.derived.wind.wind.value(), Some(manual));
    assert_eq!(runtime.shared().wind().source, WindSource::Manual);

    runtime.set_auto_wind(false);
    assert!(!runtime.wind_settings().auto_wind);
    wait_for(&mut updates, Duration::from_secs(5), |status| {
        status.derived.wind.source == WindSource::Manual
    })
    .await;

    runtime.clear_manual_wind();
    wait_for(&mut updates, Duration::from_secs(5), |status| {
        status.derived.wind.source == WindSource::None
    })
    .await;

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_config_file_manual_wind_reaches_runtime() {
    let mut config = ConfigFile::default();
    config.runtime.tick_interval_ms = 10;
    config.wind.manual_wind = Some(SpeedVector::new(90.0, 4.0));

    let runtime = FlightRuntime::start(create_board(), config.runtime_config(), RuntimeHooks::default());
    let mut updates = runtime.shared().subscribe();

    let status = wait_for(&mut updates, Duration::from_secs(5), |_| true).await;
    assert_eq!(status.derived.wind.source, WindSource::Manual);
    assert_eq!(status.derived.wind.wind.value(), Some(SpeedVector::new(90.0, 4.0)));

    runtime.shutdown().await;
}

// ============================================================================
// Simulator
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_simulator_takes_off_through_daemons() {
    let board = create_board();
    let mut simulator = Simulator::new(GeoPoint::new(46.5, 7.5), 1200.0);
    simulator.ground_speed = 25.0;
    board.enable_simulator(simulator);

    let config = RuntimeConfig::default();
    let runtime = FlightRuntime::start(Arc::clone(&board), config, RuntimeHooks::default());
    let mut updates = runtime.shared().subscribe();

    let status = wait_for(&mut updates, Duration::from_secs(60), |status| {
        status.derived.flying.flying
    })
    .await;
    assert!(status.snapshot.simulator);
    assert!(status.derived.flying.takeoff_time.is_some());
    assert!(runtime.shared().is_flying());

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_sequence_numbers_increase() {
    let board = create_board();
    board.enable_simulator(Simulator::new(GeoPoint::new(46.5, 7.5), 1200.0));
    let runtime = FlightRuntime::start(Arc::clone(&board), RuntimeConfig::default(), RuntimeHooks::default());
    let mut updates = runtime.shared().subscribe();

    let first = wait_for(&mut updates, Duration::from_secs(10), |_| true).await;
    let second = wait_for(&mut updates, Duration::from_secs(10), |_| true).await;
    assert!(second.sequence > first.sequence);

    runtime.shutdown().await;
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_cancels_token_and_closes_channel() {
    let runtime = FlightRuntime::start(create_board(), fast_config(), RuntimeHooks::default());
    let token = runtime.cancellation_token();
    let shared = runtime.shared();

    runtime.shutdown().await;
    assert!(token.is_cancelled());
    assert_eq!(shared.subscriber_count(), 0);
}
