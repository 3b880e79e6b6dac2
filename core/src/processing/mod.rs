pub mod feed_client;
pub mod filter;
pub mod polling;
pub mod resolver;

pub use feed_client::{FeedClientConfig, FlightFeed, HttpFlightFeed};
pub use filter::{ArrivalWindow, FlightFilter};
pub use polling::{
    Completion, ControlMsg, ControllerSnapshot, PollEvent, PollState, PollingConfig,
    PollingController,
};
pub use resolver::FlightInViewResolver;
