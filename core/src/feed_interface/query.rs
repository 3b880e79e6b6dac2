use crate::math::{BoundingRegion, GeoPoint, RegionCalculator};
use crate::prelude::CoreResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter state the user has entered; any combination may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryInputs {
    pub ident: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub radius_km: Option<f64>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl QueryInputs {
    pub fn by_ident(ident: impl Into<String>) -> Self {
        Self {
            ident: Some(ident.into()),
            ..Default::default()
        }
    }

    pub fn by_route(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            destination: Some(destination.into()),
            ..Default::default()
        }
    }

    pub fn by_radius(radius_km: f64) -> Self {
        Self {
            radius_km: Some(radius_km),
            ..Default::default()
        }
    }

    /// True when at least one query mode can be built from these inputs.
    pub fn is_present(&self) -> bool {
        non_blank(&self.ident).is_some()
            || (non_blank(&self.origin).is_some() && non_blank(&self.destination).is_some())
            || self.radius_km.is_some()
    }
}

/// Exactly one feed query mode.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightQuery {
    Identifier(String),
    Route { origin: String, destination: String },
    Region(BoundingRegion),
}

impl FlightQuery {
    /// Picks the query mode with precedence identifier > route > region.
    ///
    /// A region needs both a location and a radius; `Ok(None)` means no mode
    /// is available. An invalid radius is an error rather than a degenerate
    /// region.
    pub fn select(inputs: &QueryInputs, location: Option<GeoPoint>) -> CoreResult<Option<Self>> {
        if let Some(ident) = non_blank(&inputs.ident) {
            return Ok(Some(FlightQuery::Identifier(ident.to_string())));
        }

        if let (Some(origin), Some(destination)) =
            (non_blank(&inputs.origin), non_blank(&inputs.destination))
        {
            return Ok(Some(FlightQuery::Route {
                origin: origin.to_string(),
                destination: destination.to_string(),
            }));
        }

        match (location, inputs.radius_km) {
            (Some(center), Some(radius_km)) => Ok(Some(FlightQuery::Region(
                RegionCalculator::compute_region(center, radius_km)?,
            ))),
            _ => Ok(None),
        }
    }

    /// Query-string key and value understood by the live feed.
    pub fn query_param(&self) -> (&'static str, String) {
        match self {
            FlightQuery::Identifier(ident) => ("flights", ident.clone()),
            FlightQuery::Route {
                origin,
                destination,
            } => ("routes", format!("{}-{}", origin, destination)),
            FlightQuery::Region(region) => ("bounds", region.bounds_param()),
        }
    }

    pub fn region(&self) -> Option<&BoundingRegion> {
        match self {
            FlightQuery::Region(region) => Some(region),
            _ => None,
        }
    }
}

impl fmt::Display for FlightQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (key, value) = self.query_param();
        write!(f, "{}={}", key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYC: GeoPoint = GeoPoint::new(40.7128, -74.0060);

    #[test]
    fn identifier_wins_over_route_and_region() {
        let inputs = QueryInputs {
            ident: Some(" B6123 ".into()),
            origin: Some("SJU".into()),
            destination: Some("JFK".into()),
            radius_km: Some(50.0),
        };
        let query = FlightQuery::select(&inputs, Some(NYC)).unwrap().unwrap();
        assert_eq!(query, FlightQuery::Identifier("B6123".into()));
        assert_eq!(query.query_param(), ("flights", "B6123".to_string()));
    }

    #[test]
    fn route_wins_over_region() {
        let mut inputs = QueryInputs::by_route("SJU", "MCO");
        inputs.radius_km = Some(50.0);
        let query = FlightQuery::select(&inputs, Some(NYC)).unwrap().unwrap();
        assert_eq!(query.query_param(), ("routes", "SJU-MCO".to_string()));
    }

    #[test]
    fn half_a_route_is_not_a_route() {
        let inputs = QueryInputs {
            origin: Some("SJU".into()),
            destination: Some("  ".into()),
            radius_km: Some(25.0),
            ..Default::default()
        };
        let query = FlightQuery::select(&inputs, Some(NYC)).unwrap().unwrap();
        assert!(query.region().is_some());
    }

    #[test]
    fn region_needs_location() {
        let inputs = QueryInputs::by_radius(100.0);
        assert!(inputs.is_present());
        assert_eq!(FlightQuery::select(&inputs, None).unwrap(), None);

        let query = FlightQuery::select(&inputs, Some(NYC)).unwrap().unwrap();
        let (key, value) = query.query_param();
        assert_eq!(key, "bounds");
        assert!(value.starts_with("41.612,39.813,"));
    }

    #[test]
    fn invalid_radius_fails_fast() {
        let inputs = QueryInputs::by_radius(0.0);
        assert!(FlightQuery::select(&inputs, Some(NYC)).is_err());
    }

    #[test]
    fn empty_inputs_select_nothing() {
        let inputs = QueryInputs::default();
        assert!(!inputs.is_present());
        assert_eq!(FlightQuery::select(&inputs, Some(NYC)).unwrap(), None);
    }
}
