//! Core geospatial and live-feed logic for the plane spotting tracker.
//!
//! The modules cover the haversine math behind query regions and bearings, the
//! normalization of live flight-position records, the flight-in-view resolver
//! used by the camera overlay, and the polling controller that keeps the flight
//! list fresh while discarding out-of-order responses.

pub mod app_state;
pub mod feed_interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{CoreError, CoreResult, UserState};
