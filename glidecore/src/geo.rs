//! Geodesy and angle helpers.
//!
//! - [`GeoPoint`] - WGS84 position in degrees
//! - [`SpeedVector`] - bearing + magnitude, used for wind
//! - angle helpers for bearings in degrees
//!
//! Distances use a spherical earth model; at glide-computer ranges the
//! error is far below GPS noise.

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Standard gravity (m/s²).
pub const GRAVITY: f64 = 9.81;

/// One nautical mile in meters.
pub const NAUTICAL_MILE_M: f64 = 1852.0;

/// One knot in m/s.
pub const KNOT_MS: f64 = NAUTICAL_MILE_M / 3600.0;

/// Normalize a bearing to `[0, 360)`.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Signed shortest difference `to - from` in `(-180, 180]`.
#[inline]
pub fn delta_degrees(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Interpolate between two bearings along the shorter arc.
///
/// `fraction` of 0.0 returns `from`, 1.0 returns `to`.
pub fn interpolate_degrees(from: f64, to: f64, fraction: f64) -> f64 {
    normalize_degrees(from + delta_degrees(from, to) * fraction)
}

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new position.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial bearing to `other` in degrees `[0, 360)`.
    pub fn bearing(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        normalize_degrees(y.atan2(x).to_degrees())
    }

    /// The point reached by travelling `distance` meters on `bearing`.
    pub fn destination(&self, bearing: f64, distance: f64) -> GeoPoint {
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let brg = bearing.to_radians();
        let d = distance / EARTH_RADIUS_M;

        let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * brg.cos()).asin();
        let lon2 = lon1 + (brg.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

        GeoPoint::new(lat2.to_degrees(), (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0)
    }
}

/// A bearing/magnitude pair.
///
/// For wind, `bearing` is the direction the wind blows *from* (meteorological
/// convention) and `norm` the speed in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedVector {
    /// Bearing in degrees `[0, 360)`.
    pub bearing: f64,
    /// Magnitude in m/s.
    pub norm: f64,
}

impl SpeedVector {
    /// Create a vector, normalizing the bearing.
    pub fn new(bearing: f64, norm: f64) -> Self {
        Self {
            bearing: normalize_degrees(bearing),
            norm,
        }
    }

    /// Build from north/east components.
    pub fn from_components(north: f64, east: f64) -> Self {
        let norm = north.hypot(east);
        if norm <= f64::EPSILON {
            return Self::default();
        }
        Self::new(east.atan2(north).to_degrees(), norm)
    }

    /// North component (m/s).
    #[inline]
    pub fn north(&self) -> f64 {
        self.bearing.to_radians().cos() * self.norm
    }

    /// East component (m/s).
    #[inline]
    pub fn east(&self) -> f64 {
        self.bearing.to_radians().sin() * self.norm
    }

    /// True when the magnitude is zero.
    pub fn is_zero(&self) -> bool {
        self.norm.abs() <= f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-10.0), 350.0);
        assert_eq!(normalize_degrees(0.0), 0.0);
    }

    #[test]
    fn test_delta_degrees_wraps_through_north() {
        assert_eq!(delta_degrees(350.0, 10.0), 20.0);
        assert_eq!(delta_degrees(10.0, 350.0), -20.0);
        assert_eq!(delta_degrees(90.0, 270.0), 180.0);
    }

    #[test]
    fn test_interpolate_degrees_shorter_arc() {
        let mid = interpolate_degrees(350.0, 30.0, 0.5);
        assert!((mid - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = GeoPoint::new(45.0, 7.0);
        let b = GeoPoint::new(46.0, 7.0);
        let d = a.distance(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_bearing_east() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        assert!((a.bearing(&b) - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_destination_matches_distance_and_bearing() {
        let start = GeoPoint::new(47.5, 8.5);
        let end = start.destination(60.0, 10_000.0);
        assert!((start.distance(&end) - 10_000.0).abs() < 1.0);
        assert!((start.bearing(&end) - 60.0).abs() < 0.1);
    }

    #[test]
    fn test_speed_vector_components() {
        let v = SpeedVector::new(90.0, 10.0);
        assert!(v.north().abs() < 1e-9);
        assert!((v.east() - 10.0).abs() < 1e-9);

        let back = SpeedVector::from_components(v.north(), v.east());
        assert!((back.bearing - 90.0).abs() < 1e-9);
        assert!((back.norm - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_vector_from_components() {
        assert!(SpeedVector::from_components(0.0, 0.0).is_zero());
    }
}
