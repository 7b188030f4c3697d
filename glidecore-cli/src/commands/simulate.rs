//! Simulate command - fly the built-in simulator through the detectors.
//!
//! The aircraft flies straight at `--speed` until `--circle-after`, then
//! turns at `--turn-rate` while climbing at `--climb-rate`. An optional
//! wind shifts the ground speed so the circling estimator has something
//! to find.
//!
//! By default the simulation runs as fast as possible on a manual clock;
//! `--realtime` starts the full runtime with its daemons instead.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use glidecore::blackboard::Blackboard;
use glidecore::computer::{DerivedInfo, FlightComputer};
use glidecore::config::ConfigFile;
use glidecore::geo::{GeoPoint, SpeedVector};
use glidecore::provider::{FlightStateBroadcaster, FlightStateProvider, SharedFlightState};
use glidecore::runtime::{FlightRuntime, FlightStatus, RuntimeHooks, TickPipeline};
use glidecore::simulator::Simulator;
use glidecore::time_source::{ManualTimeSource, MonotonicTimeSource};
use glidecore::wind::{FileSoundingSource, SoundingSource};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the simulate command.
#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Start latitude in decimal degrees
    #[arg(long, default_value = "46.5", allow_hyphen_values = true)]
    pub lat: f64,

    /// Start longitude in decimal degrees
    #[arg(long, default_value = "7.5", allow_hyphen_values = true)]
    pub lon: f64,

    /// Start altitude in meters
    #[arg(long, default_value = "1200")]
    pub altitude: f64,

    /// True airspeed in m/s
    #[arg(long, default_value = "25")]
    pub speed: f64,

    /// Initial heading in degrees
    #[arg(long, default_value = "0")]
    pub heading: f64,

    /// Turn rate once circling, in deg/s (negative turns left)
    #[arg(long, default_value = "15", allow_hyphen_values = true)]
    pub turn_rate: f64,

    /// Climb rate once circling, in m/s
    #[arg(long, default_value = "1.5", allow_hyphen_values = true)]
    pub climb_rate: f64,

    /// Seconds of straight flight before circling starts
    #[arg(long, default_value = "60")]
    pub circle_after: f64,

    /// Simulated duration in seconds
    #[arg(long, default_value = "300")]
    pub duration: f64,

    /// Wind speed in m/s
    #[arg(long, default_value = "0")]
    pub wind_speed: f64,

    /// Direction the wind blows from, in degrees
    #[arg(long, default_value = "0")]
    pub wind_from: f64,

    /// Run the daemons against the wall clock instead of a manual clock
    #[arg(long)]
    pub realtime: bool,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("simulate");
    let scenario = Scenario::from_args(&args)?;
    let start = GeoPoint::new(args.lat, args.lon);
    let config = runner.config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let info = runtime.block_on(async {
        if args.realtime {
            run_realtime(config, &scenario, start, args.altitude, args.duration).await
        } else {
            run_fast(config, &scenario, start, args.altitude, args.duration).await
        }
    });

    match info {
        Some(info) => print_summary(&info),
        None => println!("No flight status was published."),
    }
    Ok(())
}

/// Scripted flight profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub true_airspeed: f64,
    pub heading: f64,
    pub turn_rate: f64,
    pub climb_rate: f64,
    pub circle_after: f64,
    pub wind: SpeedVector,
}

impl Scenario {
    pub fn from_args(args: &SimulateArgs) -> Result<Self, CliError> {
        if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lon) {
            return Err(CliError::InvalidArgument(format!(
                "position {}, {} is out of range",
                args.lat, args.lon
            )));
        }
        if args.duration <= 0.0 {
            return Err(CliError::InvalidArgument("--duration must be positive".to_string()));
        }
        if args.speed < 0.0 || args.wind_speed < 0.0 {
            return Err(CliError::InvalidArgument(
                "--speed and --wind-speed must not be negative".to_string(),
            ));
        }

        Ok(Self {
            true_airspeed: args.speed,
            heading: args.heading,
            turn_rate: args.turn_rate,
            climb_rate: args.climb_rate,
            circle_after: args.circle_after,
            wind: SpeedVector::new(args.wind_from, args.wind_speed),
        })
    }

    /// The simulator at the start of the scenario.
    pub fn simulator(&self, start: GeoPoint, altitude: f64) -> Simulator {
        let mut simulator = Simulator::new(start, altitude);
        simulator.track = self.heading;
        self.steer(&mut simulator, 0.0);
        simulator
    }

    /// Set turn, climb and ground speed for `elapsed` seconds into the flight.
    pub fn steer(&self, simulator: &mut Simulator, elapsed: f64) {
        let circling = elapsed >= self.circle_after;
        simulator.turn_rate = if circling { self.turn_rate } else { 0.0 };
        simulator.climb_rate = if circling { self.climb_rate } else { 0.0 };
        simulator.ground_speed =
            Simulator::ground_speed_from_tas(simulator.track, self.true_airspeed, self.wind);
    }
}

/// Turns the status stream into one line per change.
#[derive(Debug, Default)]
pub struct Reporter {
    flying: bool,
    circling: bool,
    wind: Option<(i64, i64)>,
}

impl Reporter {
    pub fn observe(&mut self, elapsed: f64, status: &FlightStatus) -> Vec<String> {
        let derived = &status.derived;
        let mut lines = Vec::new();
        let stamp = format!("[{:>5.0}s]", elapsed);

        if derived.flying.flying != self.flying {
            self.flying = derived.flying.flying;
            lines.push(format!(
                "{} {}",
                stamp,
                if self.flying { "takeoff" } else { "landed" }
            ));
        }

        if derived.circling.circling != self.circling {
            self.circling = derived.circling.circling;
            lines.push(format!(
                "{} {}",
                stamp,
                if self.circling { "circling" } else { "cruising" }
            ));
        }

        let wind = derived
            .wind
            .wind
            .get()
            .map(|w| (w.bearing.round() as i64, (w.norm * 2.0).round() as i64));
        if wind != self.wind {
            self.wind = wind;
            if let Some(w) = derived.wind.wind.get() {
                lines.push(format!(
                    "{} wind {:03.0}° {:.1} m/s ({})",
                    stamp, w.bearing, w.norm, derived.wind.source
                ));
            }
        }

        lines
    }
}

fn sounding_source(config: &ConfigFile) -> Option<Arc<dyn SoundingSource>> {
    config
        .wind
        .sounding_file
        .as_ref()
        .map(|path| Arc::new(FileSoundingSource::new(path)) as Arc<dyn SoundingSource>)
}

/// Step the tick pipeline on a manual clock.
async fn run_fast(
    config: &ConfigFile,
    scenario: &Scenario,
    start: GeoPoint,
    altitude: f64,
    duration: f64,
) -> Option<DerivedInfo> {
    let runtime_config = config.runtime_config();
    let dt = runtime_config.tick_interval.as_secs_f64();

    let clock = ManualTimeSource::new(0.0);
    let board = Arc::new(Blackboard::new(&config.devices.slots, Arc::new(clock.clone())));
    board.enable_simulator(scenario.simulator(start, altitude));

    let computer = FlightComputer::new(runtime_config.flying, runtime_config.circling);
    let mut pipeline = TickPipeline::new(
        Arc::clone(&board),
        computer,
        Arc::new(RwLock::new(runtime_config.wind)),
        SharedFlightState::new(),
    );
    if let Some(source) = sounding_source(config) {
        pipeline = pipeline.with_sounding_source(source);
    }

    let mut reporter = Reporter::default();
    let mut elapsed = 0.0;
    while elapsed < duration {
        clock.advance(dt);
        elapsed += dt;
        board.with_simulator(|simulator, _| scenario.steer(simulator, elapsed));

        let status = pipeline.step(dt);
        for line in reporter.observe(elapsed, &status) {
            println!("{}", line);
        }
        // lets a pending sounding fetch complete
        tokio::task::yield_now().await;
    }

    Some(pipeline.computer().info().clone())
}

/// Run the daemons against the wall clock for `duration` seconds.
async fn run_realtime(
    config: &ConfigFile,
    scenario: &Scenario,
    start: GeoPoint,
    altitude: f64,
    duration: f64,
) -> Option<DerivedInfo> {
    let board = Arc::new(Blackboard::new(
        &config.devices.slots,
        Arc::new(MonotonicTimeSource::new()),
    ));
    board.enable_simulator(scenario.simulator(start, altitude));

    let hooks = RuntimeHooks {
        sounding_source: sounding_source(config),
        ..RuntimeHooks::default()
    };
    let runtime = FlightRuntime::start(Arc::clone(&board), config.runtime_config(), hooks);
    let shared = runtime.shared();
    let mut updates = shared.subscribe();

    println!("Running for {:.0} s of wall-clock time...", duration);
    let started = tokio::time::Instant::now();
    let deadline = started + Duration::from_secs_f64(duration);
    let mut reporter = Reporter::default();

    loop {
        tokio::select! {
            received = updates.recv() => match received {
                Ok(status) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    board.with_simulator(|simulator, _| scenario.steer(simulator, elapsed));
                    for line in reporter.observe(elapsed, &status) {
                        println!("{}", line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Status updates lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }

    let status = shared.status();
    runtime.shutdown().await;
    status.map(|status| status.derived)
}

fn print_summary(info: &DerivedInfo) {
    println!();
    println!("Summary");
    println!("=======");
    println!("  Flying:        {}", info.flying.flying);
    println!("  Flight time:   {:.0} s", info.flying.flight_time);
    if let Some(takeoff) = info.flying.takeoff_time {
        println!("  Takeoff:       {:.0} s", takeoff);
    }
    println!("  Circling:      {:.0}% of flight", info.circling.circling_percentage);
    println!("  Height gain:   {:.0} m", info.circling.total_height_gain);
    match info.wind.wind.get() {
        Some(w) => println!(
            "  Wind:          {:03.0}° {:.1} m/s ({})",
            w.bearing, w.norm, info.wind.source
        ),
        None => println!("  Wind:          unknown"),
    }
    if let Some(ceiling) = info.thermal_ceiling {
        println!("  Thermal top:   {:.0} m", ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidecore::snapshot::Snapshot;

    fn args() -> SimulateArgs {
        SimulateArgs {
            lat: 46.5,
            lon: 7.5,
            altitude: 1200.0,
            speed: 25.0,
            heading: 0.0,
            turn_rate: 15.0,
            climb_rate: 1.5,
            circle_after: 60.0,
            duration: 300.0,
            wind_speed: 5.0,
            wind_from: 270.0,
            realtime: false,
        }
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let mut bad = args();
        bad.duration = 0.0;
        assert!(Scenario::from_args(&bad).is_err());

        let mut bad = args();
        bad.lat = 95.0;
        assert!(Scenario::from_args(&bad).is_err());
    }

    #[test]
    fn test_steer_starts_turning_after_delay() {
        let scenario = Scenario::from_args(&args()).unwrap();
        let mut simulator = scenario.simulator(GeoPoint::new(46.5, 7.5), 1200.0);
        assert_eq!(simulator.turn_rate, 0.0);

        scenario.steer(&mut simulator, 60.0);
        assert_eq!(simulator.turn_rate, 15.0);
        assert_eq!(simulator.climb_rate, 1.5);
    }

    #[test]
    fn test_steer_applies_crosswind() {
        let scenario = Scenario::from_args(&args()).unwrap();
        let mut simulator = scenario.simulator(GeoPoint::new(46.5, 7.5), 1200.0);

        simulator.track = 90.0;
        scenario.steer(&mut simulator, 0.0);
        assert!((simulator.ground_speed - 30.0).abs() < 1e-9);

        simulator.track = 270.0;
        scenario.steer(&mut simulator, 0.0);
        assert!((simulator.ground_speed - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_reporter_prints_changes_once() {
        let mut reporter = Reporter::default();
        let mut status = FlightStatus {
            sequence: 1,
            snapshot: Snapshot::new(0.0),
            derived: DerivedInfo::default(),
        };
        assert!(reporter.observe(1.0, &status).is_empty());

        status.derived.flying.flying = true;
        let lines = reporter.observe(2.0, &status);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("takeoff"));
        assert!(reporter.observe(3.0, &status).is_empty());
    }
}
