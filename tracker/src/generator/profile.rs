use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use spotcore::feed_interface::{Flight, FlightQuery};
use spotcore::math::{GeoMath, GeoPoint};
use spotcore::processing::FlightFeed;
use spotcore::CoreResult;
use std::sync::atomic::{AtomicU64, Ordering};

const AIRLINES: [(&str, &str); 5] = [
    ("B6", "JBU"),
    ("DL", "DAL"),
    ("AA", "AAL"),
    ("UA", "UAL"),
    ("NK", "NKS"),
];
const AIRPORTS: [&str; 8] = ["JFK", "LGA", "EWR", "SJU", "MCO", "ATL", "LAX", "BOS"];

/// Configuration for the offline flight generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub flight_count: usize,
    pub seed: u64,
    pub max_radius_km: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Ground speed used to advance positions between fetches.
    pub speed_kmh: f64,
    /// Simulated time between consecutive fetches.
    pub step_secs: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            flight_count: 12,
            seed: 0,
            max_radius_km: 100.0,
            center_lat: 40.7128,
            center_lon: -74.0060,
            speed_kmh: 780.0,
            step_secs: 60.0,
        }
    }
}

impl GeneratorConfig {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lat, self.center_lon)
    }

    fn normalized_count(&self) -> usize {
        self.flight_count.max(1)
    }

    fn normalized_radius(&self) -> f64 {
        if self.max_radius_km.is_finite() {
            self.max_radius_km.max(1.0)
        } else {
            1.0
        }
    }
}

/// Offline stand-in for the live feed.
///
/// Every fetch rebuilds the same fleet from the seed and moves each aircraft
/// along its track by the number of fetches served so far, so ids stay stable
/// while positions change.
pub struct SyntheticFeed {
    config: GeneratorConfig,
    fetches: AtomicU64,
}

impl SyntheticFeed {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            fetches: AtomicU64::new(0),
        }
    }

    pub fn build_flights(&self, query: &FlightQuery, step: u64) -> Vec<Flight> {
        let (center, radius_km) = match query {
            FlightQuery::Region(region) => {
                let north = region.north();
                let south = region.south();
                let center = GeoPoint::new(
                    (north.latitude + south.latitude) / 2.0,
                    (region.west().longitude + region.east().longitude) / 2.0,
                );
                let radius_km = GeoMath::haversine_distance_km(center, north);
                (center, radius_km)
            }
            _ => (self.config.center(), self.config.normalized_radius()),
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let travelled_km = self.config.speed_kmh * self.config.step_secs / 3600.0 * step as f64;
        let count = match query {
            FlightQuery::Identifier(_) => 1,
            _ => self.config.normalized_count(),
        };

        (0..count)
            .map(|index| {
                let (carrier, icao) = AIRLINES[rng.gen_range(0..AIRLINES.len())];
                let origin = AIRPORTS[rng.gen_range(0..AIRPORTS.len())];
                let destination = AIRPORTS[rng.gen_range(0..AIRPORTS.len())];
                let bearing = rng.gen_range(0.0..360.0);
                let distance_km = rng.gen_range(0.0..radius_km.max(1.0) * 0.5);
                let track: f64 = rng.gen_range(0.0..360.0);
                let altitude = rng.gen_range(3_000.0..38_000.0_f64).round();
                let eta_hour = rng.gen_range(0..24);
                let number = rng.gen_range(100..2000);

                let start = GeoMath::destination_point(center, bearing, distance_km);
                let position = GeoMath::destination_point(start, track, travelled_km);

                let mut flight = Flight {
                    id: format!("synth-{}", index),
                    ident: format!("{}{}", carrier, number),
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    arrival_time: format!("2025-07-14T{:02}:30:00Z", eta_hour),
                    airline: icao.to_string(),
                    lat: position.latitude,
                    lon: position.longitude,
                    track: track.round(),
                    altitude: Some(altitude),
                    ground_speed: Some(self.config.speed_kmh / 1.852),
                    vertical_speed: Some(0.0),
                    ..Default::default()
                };
                flight.details.source = Some("synthetic".into());

                match query {
                    FlightQuery::Identifier(ident) => flight.ident = ident.clone(),
                    FlightQuery::Route {
                        origin,
                        destination,
                    } => {
                        flight.origin = origin.clone();
                        flight.destination = destination.clone();
                    }
                    FlightQuery::Region(_) => {}
                }
                flight
            })
            .collect()
    }
}

impl FlightFeed for SyntheticFeed {
    async fn fetch(&self, query: &FlightQuery) -> CoreResult<Vec<Flight>> {
        let step = self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.build_flights(query, step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotcore::math::RegionCalculator;

    fn region_query(radius_km: f64) -> FlightQuery {
        let center = GeoPoint::new(51.47, -0.45);
        FlightQuery::Region(RegionCalculator::compute_region(center, radius_km).unwrap())
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let config = GeneratorConfig {
            seed: 7,
            ..Default::default()
        };
        let a = SyntheticFeed::new(config.clone()).build_flights(&region_query(80.0), 0);
        let b = SyntheticFeed::new(config).build_flights(&region_query(80.0), 0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn region_flights_stay_inside_the_radius() {
        let feed = SyntheticFeed::new(GeneratorConfig::default());
        let center = GeoPoint::new(51.47, -0.45);
        for flight in feed.build_flights(&region_query(80.0), 0) {
            let distance = GeoMath::haversine_distance_km(center, flight.position());
            assert!(distance < 80.0, "{} at {:.1} km", flight.id, distance);
        }
    }

    #[test]
    fn query_fields_are_echoed() {
        let feed = SyntheticFeed::new(GeneratorConfig::default());
        let one = feed.build_flights(&FlightQuery::Identifier("B6123".into()), 0);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].ident, "B6123");

        let route = feed.build_flights(
            &FlightQuery::Route {
                origin: "SJU".into(),
                destination: "MCO".into(),
            },
            0,
        );
        assert!(route.iter().all(|f| f.origin == "SJU" && f.destination == "MCO"));
    }

    #[test]
    fn degenerate_radius_is_clamped() {
        for max_radius_km in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let feed = SyntheticFeed::new(GeneratorConfig {
                max_radius_km,
                ..Default::default()
            });
            let one = feed.build_flights(&FlightQuery::Identifier("X".into()), 0);
            assert_eq!(one.len(), 1);
            let distance = GeoMath::haversine_distance_km(feed.config.center(), one[0].position());
            assert!(distance <= 0.5, "{} km for {}", distance, max_radius_km);
        }
    }

    #[tokio::test]
    async fn successive_fetches_move_aircraft_but_keep_ids() {
        let feed = SyntheticFeed::new(GeneratorConfig::default());
        let query = region_query(100.0);
        let first = feed.fetch(&query).await.unwrap();
        let second = feed.fetch(&query).await.unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].position(), second[0].position());
    }
}
