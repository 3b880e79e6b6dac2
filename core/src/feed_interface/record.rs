use crate::feed_interface::flight::{Flight, FlightDetails};
use crate::math::geo::GeoMath;
use crate::prelude::{CoreError, CoreResult};
use crate::telemetry::LogManager;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One raw record of the live flight-position feed.
///
/// Every field is optional; the feed omits, nulls or mistypes fields freely.
/// A field of an unexpected type reads as `None` instead of failing the whole
/// record. This type stays private to the feed boundary, consumers only see
/// [`Flight`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FeedRecord {
    #[serde(deserialize_with = "lenient_string")]
    fr24_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    flight: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    callsign: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    lat: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    lon: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    track: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    alt: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    gspeed: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    vspeed: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    squawk: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    timestamp: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    source: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    hex: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    aircraft_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    reg: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    painted_as: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    operating_as: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    orig_iata: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    orig_icao: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    dest_iata: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    dest_icao: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    eta: Option<String>,
}

/// Strings pass through, numbers are rendered, anything else is `None`.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Numbers pass through, numeric strings are parsed, anything else is `None`.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

/// First candidate that is present and non-empty.
fn first_non_empty(candidates: &[&Option<String>]) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

impl FeedRecord {
    /// Maps the record onto the canonical shape. Records without a position
    /// cannot be placed on a map or matched against a bearing and yield `None`.
    pub(crate) fn into_flight(self) -> Option<Flight> {
        let (lat, lon) = (self.lat?, self.lon?);

        Some(Flight {
            id: self.fr24_id.unwrap_or_default(),
            ident: first_non_empty(&[&self.flight, &self.callsign]),
            origin: self.orig_iata.unwrap_or_default(),
            destination: self.dest_iata.unwrap_or_default(),
            arrival_time: self.eta.unwrap_or_default(),
            airline: first_non_empty(&[&self.operating_as, &self.painted_as]),
            lat,
            lon,
            track: self.track.map(GeoMath::normalize_degrees).unwrap_or(0.0),
            altitude: self.alt,
            ground_speed: self.gspeed,
            vertical_speed: self.vspeed,
            details: FlightDetails {
                callsign: self.callsign,
                squawk: self.squawk,
                registration: self.reg,
                aircraft_type: self.aircraft_type,
                origin_icao: self.orig_icao,
                destination_icao: self.dest_icao,
                timestamp: self.timestamp,
                source: self.source,
                hex: self.hex,
            },
        })
    }
}

/// Parses a successful feed response body into flights.
///
/// Records that are not objects or lack a usable position are skipped and
/// logged; any other field of the wrong type is read as absent.
/// A body that is not JSON, or whose `data` member is not an array, is
/// reported as [`CoreError::MalformedResponse`]; callers degrade that to an
/// empty list.
pub fn parse_feed_body(body: &[u8]) -> CoreResult<Vec<Flight>> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| CoreError::MalformedResponse(format!("body is not JSON: {}", e)))?;

    let records = match json.get("data") {
        Some(Value::Array(records)) => records,
        Some(other) => {
            return Err(CoreError::MalformedResponse(format!(
                "`data` is {} instead of an array",
                json_kind(other)
            )))
        }
        None => {
            return Err(CoreError::MalformedResponse(
                "response has no `data` member".into(),
            ))
        }
    };

    let logger = LogManager::new("spotcore::feed");
    let flights = records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let record = match FeedRecord::deserialize(raw) {
                Ok(record) => record,
                Err(e) => {
                    logger.warn(&format!("dropping feed record #{}: {}", index, e));
                    return None;
                }
            };
            let id = record.fr24_id.clone().unwrap_or_default();
            let flight = record.into_flight();
            if flight.is_none() {
                logger.detail(&format!("dropping feed record #{} ({}): no position", index, id));
            }
            flight
        })
        .collect();

    Ok(flights)
}

/// Human-readable message for a non-2xx response: the body's `message` when
/// there is one, otherwise the HTTP status text.
pub fn error_message(body: &[u8], status_text: &str) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status_text.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data": [
            {
                "fr24_id": "3a9f1c2e",
                "flight": "B6123",
                "callsign": "JBU123",
                "lat": 40.9,
                "lon": -73.8,
                "track": 370,
                "alt": 12000,
                "gspeed": 310,
                "vspeed": -640,
                "squawk": "4521",
                "timestamp": "2025-07-14T12:01:02Z",
                "source": "ADSB",
                "hex": "A1B2C3",
                "type": "A320",
                "reg": "N123JB",
                "painted_as": "JBU",
                "operating_as": "",
                "orig_iata": "SJU",
                "orig_icao": "TJSJ",
                "dest_iata": "JFK",
                "dest_icao": "KJFK",
                "eta": "2025-07-14T14:44:00Z"
            },
            {
                "fr24_id": "3a9f1c2f",
                "flight": "",
                "callsign": "N55XY",
                "lat": 40.5,
                "lon": -74.1,
                "orig_iata": null
            },
            { "fr24_id": "no-position", "flight": "AA1" },
            { "fr24_id": 17, "lat": "north" }
        ]
    }"#;

    #[test]
    fn normalizes_full_record() {
        let flights = parse_feed_body(SAMPLE.as_bytes()).unwrap();
        let first = &flights[0];
        assert_eq!(first.id, "3a9f1c2e");
        assert_eq!(first.ident, "B6123");
        assert_eq!(first.origin, "SJU");
        assert_eq!(first.destination, "JFK");
        assert_eq!(first.arrival_time, "2025-07-14T14:44:00Z");
        // empty operating_as falls back to painted_as
        assert_eq!(first.airline, "JBU");
        assert_eq!(first.track, 10.0);
        assert_eq!(first.altitude, Some(12000.0));
        assert_eq!(first.details.aircraft_type.as_deref(), Some("A320"));
        assert_eq!(first.details.registration.as_deref(), Some("N123JB"));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let flights = parse_feed_body(SAMPLE.as_bytes()).unwrap();
        let second = &flights[1];
        assert_eq!(second.ident, "N55XY");
        assert_eq!(second.origin, "");
        assert_eq!(second.airline, "");
        assert_eq!(second.arrival_time, "");
        assert_eq!(second.track, 0.0);
        assert_eq!(second.altitude, None);
    }

    #[test]
    fn records_without_position_are_skipped() {
        let flights = parse_feed_body(SAMPLE.as_bytes()).unwrap();
        assert_eq!(flights.len(), 2);
        assert!(flights.iter().all(|f| f.id != "no-position" && f.id != "17"));
    }

    #[test]
    fn mistyped_optional_fields_do_not_drop_the_flight() {
        let body = br#"{"data": [
            {"fr24_id": "ok", "lat": 40.1, "lon": -73.9, "squawk": "1200"},
            {"fr24_id": "typed", "lat": 40.2, "lon": -73.8, "squawk": 4521, "eta": false},
            {"fr24_id": "alt", "lat": "40.3", "lon": -73.7, "alt": "12000", "gspeed": [1]},
            "not an object"
        ]}"#;
        let flights = parse_feed_body(body).unwrap();
        let ids: Vec<&str> = flights.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["ok", "typed", "alt"]);

        assert_eq!(flights[1].details.squawk.as_deref(), Some("4521"));
        assert_eq!(flights[1].arrival_time, "");
        assert_eq!(flights[2].lat, 40.3);
        assert_eq!(flights[2].altitude, Some(12000.0));
        assert_eq!(flights[2].ground_speed, None);
    }

    #[test]
    fn non_array_data_is_malformed() {
        let result = parse_feed_body(br#"{"data": {"fr24_id": "x"}}"#);
        assert!(matches!(result, Err(CoreError::MalformedResponse(_))));

        let result = parse_feed_body(b"<html>oops</html>");
        assert!(matches!(result, Err(CoreError::MalformedResponse(_))));

        let result = parse_feed_body(br#"{"message": "ok"}"#);
        assert!(matches!(result, Err(CoreError::MalformedResponse(_))));
    }

    #[test]
    fn empty_data_array_is_valid() {
        assert!(parse_feed_body(br#"{"data": []}"#).unwrap().is_empty());
    }

    #[test]
    fn error_message_prefers_body_message() {
        assert_eq!(
            error_message(br#"{"message": "Unauthenticated."}"#, "Unauthorized"),
            "Unauthenticated."
        );
        assert_eq!(error_message(b"", "Too Many Requests"), "Too Many Requests");
    }
}
