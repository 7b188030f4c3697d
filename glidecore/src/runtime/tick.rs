//! The periodic tick.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::blackboard::{Blackboard, CanonicalSnapshot};
use crate::computer::FlightComputer;
use crate::flight::FlightEvent;
use crate::provider::SharedFlightState;
use crate::wind::{Sounding, SoundingError, SoundingSource, WindSettings};

use super::hooks::TaskResumeHook;
use super::status::FlightStatus;

type PendingSounding = oneshot::Receiver<Result<Sounding, SoundingError>>;

/// One tick's worth of work, separate from the timer so it can be driven
/// step by step.
pub struct TickPipeline {
    blackboard: Arc<Blackboard>,
    computer: FlightComputer,
    wind_settings: Arc<RwLock<WindSettings>>,
    shared: SharedFlightState,
    task_resume: Option<Arc<dyn TaskResumeHook>>,
    sounding_source: Option<Arc<dyn SoundingSource>>,
    pending_sounding: Option<PendingSounding>,
}

impl TickPipeline {
    pub fn new(
        blackboard: Arc<Blackboard>,
        computer: FlightComputer,
        wind_settings: Arc<RwLock<WindSettings>>,
        shared: SharedFlightState,
    ) -> Self {
        Self {
            blackboard,
            computer,
            wind_settings,
            shared,
            task_resume: None,
            sounding_source: None,
            pending_sounding: None,
        }
    }

    pub fn with_task_resume_hook(mut self, hook: Arc<dyn TaskResumeHook>) -> Self {
        self.task_resume = Some(hook);
        self
    }

    pub fn with_sounding_source(mut self, source: Arc<dyn SoundingSource>) -> Self {
        self.sounding_source = Some(source);
        self
    }

    pub fn computer(&self) -> &FlightComputer {
        &self.computer
    }

    /// Run one tick, `dt` seconds after the previous one.
    ///
    /// Expires silent devices, advances the simulator, merges if needed,
    /// runs the detectors on the canonical snapshot and publishes the
    /// result.
    pub fn step(&mut self, dt: f64) -> FlightStatus {
        self.blackboard.expire_wall_clock();
        self.blackboard.process_simulation(dt);

        let CanonicalSnapshot { sequence, snapshot } = self.blackboard.snapshot();
        let settings = self.wind_settings.read().clone();

        let events = self.computer.tick(&snapshot, &settings);
        self.dispatch(&events);
        self.blackboard.set_flying(self.computer.info().flying.flying);

        self.poll_sounding();
        self.request_sounding();

        let status = FlightStatus {
            sequence,
            snapshot,
            derived: self.computer.info().clone(),
        };
        self.shared.publish(status.clone());
        status
    }

    fn dispatch(&self, events: &[FlightEvent]) {
        for event in events {
            tracing::debug!(event = %event, "Flight event");
            if matches!(event, FlightEvent::TaskResumeInvalidated) {
                if let Some(hook) = &self.task_resume {
                    hook.task_resume_invalidated();
                }
            }
        }
    }

    /// Hand a finished fetch to the forecast estimator.
    fn poll_sounding(&mut self) {
        let Some(pending) = self.pending_sounding.as_mut() else {
            return;
        };
        let result = match pending.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(SoundingError::Unavailable("fetch task ended without a result".to_string()))
            }
        };
        self.pending_sounding = None;

        let forecast = self.computer.wind_mut().forecast_mut();
        match result {
            Ok(sounding) => forecast.set_sounding(sounding),
            Err(error) => {
                tracing::warn!(error = %error, "Forecast sounding fetch failed");
                forecast.fetch_failed();
            }
        }
    }

    /// Start a fetch if the forecast estimator asked for one.
    fn request_sounding(&mut self) {
        let Some(location) = self.computer.wind_mut().forecast_mut().take_refresh_request() else {
            return;
        };
        let Some(source) = self.sounding_source.clone() else {
            self.computer.wind_mut().forecast_mut().fetch_failed();
            return;
        };

        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(source.fetch(location));
        });
        self.pending_sounding = Some(rx);
    }
}

/// Spawns the task that runs [`TickPipeline::step`] every `interval`.
///
/// The task stops when `cancellation` fires.
pub fn spawn_tick_daemon(
    mut pipeline: TickPipeline,
    interval: Duration,
    cancellation: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let dt = interval.as_secs_f64();
        tracing::debug!(interval_ms = interval.as_millis() as u64, "Tick daemon started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    pipeline.step(dt);
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Tick daemon stopped");
                    break;
                }
            }
        }
    })
}
