//! The per-tick pipeline.

use std::sync::Arc;

use crate::circling::{CirclingConfig, CirclingDetector};
use crate::flight::{FlightEvent, FlyingConfig, FlyingDetector};
use crate::snapshot::Snapshot;
use crate::wind::{head_wind, select_wind, WindComputer, WindSettings};

use super::derived::{energy_height, AltitudeRate, DerivedInfo};
use super::terrain::{NoTerrain, TerrainModel};

/// Runs flying, circling and wind detection in that order.
///
/// Owned by a single task; nothing in here is shared.
pub struct FlightComputer {
    flying: FlyingDetector,
    circling: CirclingDetector,
    wind: WindComputer,
    terrain: Arc<dyn TerrainModel>,
    vario: AltitudeRate,
    last_time: Option<f64>,
    info: DerivedInfo,
}

impl std::fmt::Debug for FlightComputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightComputer")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl Default for FlightComputer {
    fn default() -> Self {
        Self::new(FlyingConfig::default(), CirclingConfig::default())
    }
}

impl FlightComputer {
    pub fn new(flying: FlyingConfig, circling: CirclingConfig) -> Self {
        Self {
            flying: FlyingDetector::new(flying),
            circling: CirclingDetector::new(circling),
            wind: WindComputer::new(),
            terrain: Arc::new(NoTerrain),
            vario: AltitudeRate::default(),
            last_time: None,
            info: DerivedInfo::default(),
        }
    }

    /// Use `terrain` for height above ground.
    pub fn with_terrain(mut self, terrain: Arc<dyn TerrainModel>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn info(&self) -> &DerivedInfo {
        &self.info
    }

    pub fn flying_config(&self) -> &FlyingConfig {
        self.flying.config()
    }

    pub fn wind(&self) -> &WindComputer {
        &self.wind
    }

    pub fn wind_mut(&mut self) -> &mut WindComputer {
        &mut self.wind
    }

    /// Forget the current flight.
    pub fn reset(&mut self) {
        self.flying.reset();
        self.circling.reset();
        self.wind.reset();
        self.vario.reset();
        self.last_time = None;
        self.info = DerivedInfo::default();
    }

    /// Process one canonical snapshot.
    pub fn tick(&mut self, basic: &Snapshot, wind_settings: &WindSettings) -> Vec<FlightEvent> {
        if let Some(time) = basic.time.value() {
            if self.last_time.is_some_and(|last| time < last) {
                tracing::debug!(time, "Time went backwards, circling and wind reset");
                self.circling.reset();
                self.info.circling.reset();
                self.wind.reset();
                self.vario.reset();
            }
            self.last_time = Some(time);
        }

        self.update_basics(basic);

        let info = &mut self.info;
        let events = self.flying.compute(basic, info.height_above_ground, &mut info.flying);
        self.circling.compute(
            basic,
            info.energy_height,
            info.brutto_vario,
            &info.flying,
            &mut info.circling,
        );

        let takeoff_speed = self.flying.config().takeoff_speed;
        self.wind
            .compute(wind_settings, takeoff_speed, basic, &info.circling, &info.flying);
        self.update_wind(basic, wind_settings);

        events
    }

    /// Close the flight, e.g. at the end of a replay.
    pub fn finish(&mut self, time: f64) -> Vec<FlightEvent> {
        self.flying.finish(&mut self.info.flying, time)
    }

    /// Re-run wind selection after the settings changed between ticks.
    pub fn reselect_wind(&mut self, basic: &Snapshot, wind_settings: &WindSettings) {
        self.update_wind(basic, wind_settings);
    }

    fn update_basics(&mut self, basic: &Snapshot) {
        let info = &mut self.info;
        info.clock = basic.clock;
        info.heading = basic.heading_or_track();
        info.nav_altitude = basic.nav_altitude();
        info.energy_height = basic.true_airspeed.value().map_or(0.0, energy_height);
        info.brutto_vario = self.vario.update(basic);

        info.terrain_elevation = basic
            .location
            .get()
            .and_then(|location| self.terrain.elevation(location));
        info.height_above_ground = match (info.nav_altitude, info.terrain_elevation) {
            (Some(altitude), Some(elevation)) => Some(altitude - elevation),
            _ => None,
        };
    }

    fn update_wind(&mut self, basic: &Snapshot, wind_settings: &WindSettings) {
        let info = &mut self.info;
        info.estimated_wind = *self.wind.estimated();
        info.ekf_active = self.wind.ekf_active();
        info.wind = select_wind(wind_settings, basic, &info.estimated_wind);
        info.head_wind = head_wind(&info.wind, info.heading);
        info.thermal_ceiling = self.wind.thermal_ceiling(wind_settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computer::FlatTerrain;
    use crate::geo::{GeoPoint, SpeedVector};
    use crate::wind::WindSource;

    fn sample(time: f64, ground_speed: f64, altitude: f64) -> Snapshot {
        let mut basic = Snapshot::new(time);
        basic.mark_alive();
        basic.provide_time(time);
        basic.provide_location(GeoPoint::new(47.0, 8.0));
        basic.provide_track_and_speed(90.0, ground_speed);
        basic.provide_gps_altitude(altitude);
        basic
    }

    #[test]
    fn test_takeoff_through_pipeline() {
        let mut computer = FlightComputer::default();
        let settings = WindSettings::default();

        let mut events = Vec::new();
        for t in 0..15 {
            let speed = if t < 2 { 0.0 } else { 20.0 };
            events.extend(computer.tick(&sample(t as f64, speed, 500.0), &settings));
        }

        assert!(computer.info().flying.flying);
        assert!(matches!(events[..], [FlightEvent::Takeoff { .. }]));
        assert_eq!(computer.info().heading, Some(90.0));
        assert_eq!(computer.info().nav_altitude, Some(500.0));
    }

    #[test]
    fn test_height_above_ground_from_terrain() {
        let mut computer = FlightComputer::default().with_terrain(Arc::new(FlatTerrain::new(400.0)));
        computer.tick(&sample(1.0, 0.0, 1300.0), &WindSettings::default());
        assert_eq!(computer.info().terrain_elevation, Some(400.0));
        assert_eq!(computer.info().height_above_ground, Some(900.0));
    }

    #[test]
    fn test_no_terrain_leaves_height_unknown() {
        let mut computer = FlightComputer::default();
        computer.tick(&sample(1.0, 0.0, 1300.0), &WindSettings::default());
        assert_eq!(computer.info().height_above_ground, None);
    }

    #[test]
    fn test_energy_height_from_airspeed() {
        let mut computer = FlightComputer::default();
        let mut basic = sample(1.0, 20.0, 800.0);
        basic.provide_true_airspeed(30.0);
        computer.tick(&basic, &WindSettings::default());
        assert!((computer.info().energy_height - energy_height(30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_external_wind_selected_with_head_wind() {
        let mut computer = FlightComputer::default();
        let mut basic = sample(1.0, 20.0, 800.0);
        basic.provide_external_wind(SpeedVector::new(90.0, 6.0));
        computer.tick(&basic, &WindSettings::default());

        let info = computer.info();
        assert_eq!(info.wind.source, WindSource::External);
        assert!((info.head_wind.unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_wind_reselected_between_ticks() {
        let mut computer = FlightComputer::default();
        let basic = sample(1.0, 0.0, 800.0);
        let mut settings = WindSettings::default();
        computer.tick(&basic, &settings);
        assert_eq!(computer.info().wind.source, WindSource::None);

        settings.set_manual_wind(SpeedVector::new(180.0, 4.0), 1.5);
        computer.reselect_wind(&basic, &settings);
        assert_eq!(computer.info().wind.source, WindSource::Manual);
    }

    #[test]
    fn test_reset_forgets_flight() {
        let mut computer = FlightComputer::default();
        for t in 0..15 {
            computer.tick(&sample(t as f64, 20.0, 500.0), &WindSettings::default());
        }
        assert!(computer.info().flying.flying);
        computer.reset();
        assert_eq!(computer.info(), &DerivedInfo::default());
    }
}
