use crate::math::geo::{GeoMath, GeoPoint};
use crate::prelude::{CoreError, CoreResult};
use serde::Serialize;

/// Four cardinal points `radius_km` away from a center, used as a feed query window.
///
/// Fields are private so a region can only be produced whole by
/// [`RegionCalculator::compute_region`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRegion {
    north: GeoPoint,
    east: GeoPoint,
    south: GeoPoint,
    west: GeoPoint,
}

impl BoundingRegion {
    pub fn north(&self) -> GeoPoint {
        self.north
    }

    pub fn east(&self) -> GeoPoint {
        self.east
    }

    pub fn south(&self) -> GeoPoint {
        self.south
    }

    pub fn west(&self) -> GeoPoint {
        self.west
    }

    /// `north_lat,south_lat,west_lon,east_lon`, each rounded to 3 decimals.
    pub fn bounds_param(&self) -> String {
        format!(
            "{:.3},{:.3},{:.3},{:.3}",
            self.north.latitude, self.south.latitude, self.west.longitude, self.east.longitude
        )
    }
}

pub struct RegionCalculator;

impl RegionCalculator {
    pub fn compute_region(center: GeoPoint, radius_km: f64) -> CoreResult<BoundingRegion> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "search radius must be positive, got {} km",
                radius_km
            )));
        }

        Ok(BoundingRegion {
            north: GeoMath::destination_point(center, 0.0, radius_km),
            east: GeoMath::destination_point(center, 90.0, radius_km),
            south: GeoMath::destination_point(center, 180.0, radius_km),
            west: GeoMath::destination_point(center, 270.0, radius_km),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYC: GeoPoint = GeoPoint::new(40.7128, -74.0060);

    #[test]
    fn region_brackets_center() {
        for center in [NYC, GeoPoint::new(-33.86, 151.2), GeoPoint::new(0.0, 0.0)] {
            for radius in [0.5, 10.0, 100.0, 900.0] {
                let region = RegionCalculator::compute_region(center, radius).unwrap();
                assert!(region.north().latitude > center.latitude);
                assert!(region.south().latitude < center.latitude);
                assert!(region.east().longitude > center.longitude);
                assert!(region.west().longitude < center.longitude);
            }
        }
    }

    #[test]
    fn new_york_region_north_point() {
        let region = RegionCalculator::compute_region(NYC, 100.0).unwrap();
        assert!((region.north().latitude - 41.6123).abs() < 0.01);
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        assert!(matches!(
            RegionCalculator::compute_region(NYC, 0.0),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(RegionCalculator::compute_region(NYC, -5.0).is_err());
        assert!(RegionCalculator::compute_region(NYC, f64::NAN).is_err());
    }

    #[test]
    fn bounds_param_rounds_to_three_decimals() {
        let region = RegionCalculator::compute_region(NYC, 100.0).unwrap();
        let param = region.bounds_param();
        let parts: Vec<&str> = param.split(',').collect();
        assert_eq!(parts.len(), 4);
        for part in &parts {
            assert_eq!(part.split('.').nth(1).map(str::len), Some(3));
        }
        assert_eq!(parts[0], format!("{:.3}", region.north().latitude));
        assert_eq!(parts[3], format!("{:.3}", region.east().longitude));
        // in-memory region keeps full precision
        assert_ne!(region.north().latitude, parts[0].parse::<f64>().unwrap());
    }
}
