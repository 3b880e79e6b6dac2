use crate::prelude::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used by every spherical formula in this module.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checked constructor for coordinates coming from outside the process.
    pub fn try_new(latitude: f64, longitude: f64) -> CoreResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidArgument(format!(
                "latitude {} outside [-90,90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidArgument(format!(
                "longitude {} outside [-180,180]",
                longitude
            )));
        }
        Ok(Self::new(latitude, longitude))
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5},{:.5})", self.latitude, self.longitude)
    }
}

/// Spherical-earth helpers.
pub struct GeoMath;

impl GeoMath {
    /// Point reached after travelling `distance_km` from `origin` along the
    /// initial bearing `bearing_deg`.
    ///
    /// The resulting longitude is not wrapped: near the antimeridian it can
    /// leave [-180,180] and callers that need wrapping must apply it.
    pub fn destination_point(origin: GeoPoint, bearing_deg: f64, distance_km: f64) -> GeoPoint {
        let lat1 = origin.latitude.to_radians();
        let lon1 = origin.longitude.to_radians();
        let brng = bearing_deg.to_radians();
        let delta = distance_km / EARTH_RADIUS_KM;

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * brng.cos()).asin();
        let lon2 = lon1
            + (brng.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

        GeoPoint::new(lat2.to_degrees(), lon2.to_degrees())
    }

    /// Forward azimuth from `from` to `to`, in [0,360).
    pub fn initial_bearing(from: GeoPoint, to: GeoPoint) -> f64 {
        let lat1 = from.latitude.to_radians();
        let lat2 = to.latitude.to_radians();
        let d_lon = (to.longitude - from.longitude).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }

    /// Great-circle distance in kilometres.
    pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
        let lat1 = a.latitude.to_radians();
        let lat2 = b.latitude.to_radians();
        let d_lat = (b.latitude - a.latitude).to_radians();
        let d_lon = (b.longitude - a.longitude).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
    }

    /// Maps any angle in degrees into [0,360).
    pub fn normalize_degrees(degrees: f64) -> f64 {
        let wrapped = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    }

    /// Smallest absolute angle between two compass directions, in [0,180].
    pub fn angular_difference(a: f64, b: f64) -> f64 {
        (((a - b + 540.0) % 360.0) - 180.0).abs()
    }
}
