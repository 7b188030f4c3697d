//! Owner of the background daemons.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::blackboard::{spawn_merge_daemon, Blackboard};
use crate::computer::{FlightComputer, TerrainModel};
use crate::geo::SpeedVector;
use crate::provider::SharedFlightState;
use crate::wind::{SoundingSource, WindSettings};

use super::config::RuntimeConfig;
use super::hooks::TaskResumeHook;
use super::tick::{spawn_tick_daemon, TickPipeline};

/// Optional collaborators of the runtime.
#[derive(Clone, Default)]
pub struct RuntimeHooks {
    pub terrain: Option<Arc<dyn TerrainModel>>,
    pub task_resume: Option<Arc<dyn TaskResumeHook>>,
    pub sounding_source: Option<Arc<dyn SoundingSource>>,
}

/// Runs the merge daemon and the tick daemon against one blackboard.
///
/// Device adapters keep writing to the blackboard directly; consumers read
/// [`SharedFlightState`].
pub struct FlightRuntime {
    blackboard: Arc<Blackboard>,
    shared: SharedFlightState,
    wind_settings: Arc<RwLock<WindSettings>>,
    cancellation: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl FlightRuntime {
    /// Spawn both daemons. Must be called inside a tokio runtime.
    pub fn start(blackboard: Arc<Blackboard>, config: RuntimeConfig, hooks: RuntimeHooks) -> Self {
        let cancellation = CancellationToken::new();
        let shared = SharedFlightState::new();
        let wind_settings = Arc::new(RwLock::new(config.wind.clone()));

        let mut computer = FlightComputer::new(config.flying.clone(), config.circling.clone());
        if let Some(terrain) = hooks.terrain {
            computer = computer.with_terrain(terrain);
        }

        let mut pipeline = TickPipeline::new(
            Arc::clone(&blackboard),
            computer,
            Arc::clone(&wind_settings),
            shared.clone(),
        );
        if let Some(hook) = hooks.task_resume {
            pipeline = pipeline.with_task_resume_hook(hook);
        }
        if let Some(source) = hooks.sounding_source {
            pipeline = pipeline.with_sounding_source(source);
        }

        let handles = vec![
            spawn_merge_daemon(Arc::clone(&blackboard), cancellation.clone()),
            spawn_tick_daemon(pipeline, config.tick_interval, cancellation.clone()),
        ];

        tracing::info!(
            devices = blackboard.device_count(),
            tick_ms = config.tick_interval.as_millis() as u64,
            "Flight runtime started"
        );

        Self {
            blackboard,
            shared,
            wind_settings,
            cancellation,
            handles,
        }
    }

    pub fn blackboard(&self) -> &Arc<Blackboard> {
        &self.blackboard
    }

    /// Handle for reading and subscribing to the flight status.
    pub fn shared(&self) -> SharedFlightState {
        self.shared.clone()
    }

    pub fn wind_settings(&self) -> WindSettings {
        self.wind_settings.read().clone()
    }

    /// Enter a manual wind now.
    pub fn set_manual_wind(&self, wind: SpeedVector) {
        let now = self.blackboard.now();
        self.wind_settings.write().set_manual_wind(wind, now);
        tracing::info!(bearing = wind.bearing, speed = wind.norm, "Manual wind set");
    }

    pub fn clear_manual_wind(&self) {
        self.wind_settings.write().clear_manual_wind();
    }

    /// Switch automatic wind estimation on or off.
    pub fn set_auto_wind(&self, enabled: bool) {
        self.wind_settings.write().auto_wind = enabled;
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Stop both daemons and wait for them.
    pub async fn shutdown(self) {
        self.cancellation.cancel();
        for handle in self.handles {
            if let Err(error) = handle.await {
                tracing::warn!(error = %error, "Daemon task failed");
            }
        }
        tracing::info!("Flight runtime stopped");
    }
}
