//! Terrain elevation lookup.

use crate::geo::GeoPoint;

/// Answers ground elevation queries.
///
/// Implementations must be cheap to call once per tick.
pub trait TerrainModel: Send + Sync {
    /// Ground elevation above sea level at `location` (m), if known.
    fn elevation(&self, location: &GeoPoint) -> Option<f64>;
}

/// No terrain data; height above ground stays unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerrain;

impl TerrainModel for NoTerrain {
    fn elevation(&self, _location: &GeoPoint) -> Option<f64> {
        None
    }
}

/// Flat terrain at a fixed elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub elevation: f64,
}

impl FlatTerrain {
    pub fn new(elevation: f64) -> Self {
        Self { elevation }
    }
}

impl TerrainModel for FlatTerrain {
    fn elevation(&self, _location: &GeoPoint) -> Option<f64> {
        Some(self.elevation)
    }
}
