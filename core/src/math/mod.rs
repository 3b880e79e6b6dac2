pub mod geo;
pub mod region;

pub use geo::{GeoMath, GeoPoint};
pub use region::{BoundingRegion, RegionCalculator};
