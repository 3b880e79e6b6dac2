use crate::math::GeoPoint;
use serde::{Deserialize, Serialize};

/// Canonical flight snapshot produced from one live-feed record.
///
/// Built fresh on every poll and never mutated afterwards. `id` is the identity
/// used for favorites and list rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Flight {
    pub id: String,
    pub ident: String,
    pub origin: String,
    pub destination: String,
    pub arrival_time: String,
    pub airline: String,
    pub lat: f64,
    pub lon: f64,
    /// True track of the aircraft in [0,360).
    pub track: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_speed: Option<f64>,
    #[serde(default)]
    pub details: FlightDetails,
}

/// Secondary fields shown on a flight's detail page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub squawk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aircraft_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_icao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_icao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

impl Flight {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Best label for display: flight number, then callsign, then feed id.
    pub fn label(&self) -> &str {
        if !self.ident.is_empty() {
            &self.ident
        } else if let Some(callsign) = self.details.callsign.as_deref().filter(|c| !c.is_empty()) {
            callsign
        } else {
            &self.id
        }
    }

    pub fn same_flight(&self, other: &Flight) -> bool {
        self.id == other.id
    }
}
