use serde::{Deserialize, Serialize};
use spotcore::feed_interface::Flight;
use spotcore::processing::ControllerSnapshot;

/// Everything a client needs to render the tracker screen.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerView {
    #[serde(flatten)]
    pub snapshot: ControllerSnapshot,
    pub favorite_ids: Vec<String>,
}

/// One row of the flight list.
#[derive(Debug, Clone, Serialize)]
pub struct FlightCard {
    #[serde(flatten)]
    pub flight: Flight,
    pub is_favorite: bool,
}

/// Body of `POST /location`; `denied` reports a refused permission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationUpdate {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub denied: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadingUpdate {
    pub heading: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AutoRefreshUpdate {
    pub enabled: bool,
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteToggle {
    pub id: String,
}
