pub mod flight;
pub mod query;
pub mod record;

pub use flight::Flight;
pub use query::{FlightQuery, QueryInputs};
pub use record::{error_message, parse_feed_body};
