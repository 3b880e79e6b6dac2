use crate::feed_interface::Flight;
use crate::math::geo::{GeoMath, GeoPoint};

pub const DEFAULT_TOLERANCE_DEG: f64 = 10.0;

/// Picks the aircraft the user is pointing the device at.
///
/// The first flight, in supplied order, whose bearing from the user lies within
/// `tolerance_deg` of the heading wins. This is neither the nearest nor the
/// best-aligned aircraft; feed order decides between several candidates.
#[derive(Debug, Clone, Copy)]
pub struct FlightInViewResolver {
    tolerance_deg: f64,
}

impl FlightInViewResolver {
    pub fn new(tolerance_deg: f64) -> Self {
        Self { tolerance_deg }
    }

    pub fn tolerance_deg(&self) -> f64 {
        self.tolerance_deg
    }

    pub fn resolve_index(&self, user: GeoPoint, heading: f64, flights: &[Flight]) -> Option<usize> {
        flights.iter().position(|flight| {
            let bearing = GeoMath::initial_bearing(user, flight.position());
            GeoMath::angular_difference(bearing, heading) <= self.tolerance_deg
        })
    }

    pub fn resolve<'a>(
        &self,
        user: GeoPoint,
        heading: f64,
        flights: &'a [Flight],
    ) -> Option<&'a Flight> {
        self.resolve_index(user, heading, flights).map(|idx| &flights[idx])
    }
}

impl Default for FlightInViewResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_DEG)
    }
}
