use crate::feed_interface::Flight;
use chrono::{DateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Arrival buckets offered by the search screen, by hour of the ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrivalWindow {
    Morning,
    Afternoon,
    Evening,
}

impl ArrivalWindow {
    pub fn hours(&self) -> (u32, u32) {
        match self {
            ArrivalWindow::Morning => (0, 11),
            ArrivalWindow::Afternoon => (12, 17),
            ArrivalWindow::Evening => (18, 23),
        }
    }

    /// The hour is taken in the offset the timestamp carries.
    pub fn contains(&self, arrival_time: &str) -> bool {
        let (start, end) = self.hours();
        DateTime::parse_from_rfc3339(arrival_time)
            .map(|eta| (start..=end).contains(&eta.hour()))
            .unwrap_or(false)
    }
}

/// Client-side narrowing of the current flight list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightFilter {
    pub query: String,
    pub origin: String,
    pub destination: String,
    pub airline: String,
    pub arrival: Option<ArrivalWindow>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl FlightFilter {
    pub fn matches(&self, flight: &Flight) -> bool {
        contains_ignore_case(&flight.ident, &self.query)
            && contains_ignore_case(&flight.origin, &self.origin)
            && contains_ignore_case(&flight.destination, &self.destination)
            && contains_ignore_case(&flight.airline, &self.airline)
            && self
                .arrival
                .map_or(true, |window| window.contains(&flight.arrival_time))
    }

    pub fn apply<'a>(&self, flights: &'a [Flight]) -> Vec<&'a Flight> {
        flights.iter().filter(|f| self.matches(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(ident: &str, origin: &str, destination: &str, airline: &str, eta: &str) -> Flight {
        Flight {
            id: format!("id-{}", ident),
            ident: ident.into(),
            origin: origin.into(),
            destination: destination.into(),
            airline: airline.into(),
            arrival_time: eta.into(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Flight> {
        vec![
            flight("B6123", "SJU", "JFK", "JBU", "2025-07-14T09:10:00Z"),
            flight("DL455", "ATL", "JFK", "DAL", "2025-07-14T14:44:00Z"),
            flight("AA100", "JFK", "LHR", "AAL", "2025-07-14T19:05:00-04:00"),
            flight("N55XY", "", "", "", ""),
        ]
    }

    #[test]
    fn default_filter_keeps_everything_in_order() {
        let flights = sample();
        let kept = FlightFilter::default().apply(&flights);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].ident, "B6123");
    }

    #[test]
    fn text_fields_match_case_insensitively() {
        let flights = sample();
        let filter = FlightFilter {
            query: "dl".into(),
            destination: "jfk".into(),
            ..Default::default()
        };
        let kept = filter.apply(&flights);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].ident, "DL455");
    }

    #[test]
    fn arrival_window_uses_timestamp_offset() {
        let flights = sample();
        let evening = FlightFilter {
            arrival: Some(ArrivalWindow::Evening),
            ..Default::default()
        };
        let kept = evening.apply(&flights);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].ident, "AA100");

        let morning = FlightFilter {
            arrival: Some(ArrivalWindow::Morning),
            ..Default::default()
        };
        assert_eq!(morning.apply(&flights)[0].ident, "B6123");
    }

    #[test]
    fn unparseable_eta_never_matches_a_window() {
        assert!(!ArrivalWindow::Afternoon.contains(""));
        assert!(!ArrivalWindow::Afternoon.contains("Jul 14, 2025 at 02:44 PM"));
    }
}
