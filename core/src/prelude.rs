use crate::math::geo::GeoMath;
use serde::{Deserialize, Serialize};

pub use crate::feed_interface::{Flight, FlightQuery, QueryInputs};
pub use crate::math::{BoundingRegion, GeoPoint};

/// Common error type for the core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("storage error: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Device-sourced position and compass heading of the user.
///
/// Either value may be unknown; consumers treat that as "nothing to compute".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    location: Option<GeoPoint>,
    heading: Option<f64>,
    heading_offset: f64,
}

impl UserState {
    /// `heading_offset` is added to every raw compass reading, e.g. 180 when the
    /// camera looks opposite to the compass reference.
    pub fn with_heading_offset(heading_offset: f64) -> Self {
        Self {
            heading_offset,
            ..Default::default()
        }
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn set_location(&mut self, location: GeoPoint) {
        self.location = Some(location);
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }

    pub fn set_heading(&mut self, raw_heading: f64) {
        self.heading = Some(GeoMath::normalize_degrees(raw_heading + self.heading_offset));
    }

    /// Location and heading together, when both are known.
    pub fn fix(&self) -> Option<(GeoPoint, f64)> {
        Some((self.location?, self.heading?))
    }
}
