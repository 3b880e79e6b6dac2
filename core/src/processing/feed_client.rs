use crate::feed_interface::{error_message, parse_feed_body, Flight, FlightQuery};
use crate::math::BoundingRegion;
use crate::prelude::{CoreError, CoreResult};
use crate::telemetry::{LogManager, MetricsRecorder};
use reqwest::header::ACCEPT;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str =
    "https://fr24api.flightradar24.com/api/live/flight-positions/full";
pub const DEFAULT_ACCEPT_VERSION: &str = "v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Source of live flight positions.
///
/// Implementations must report transport failures as [`CoreError::Network`]
/// and degrade malformed payloads to an empty list.
pub trait FlightFeed: Send + Sync {
    fn fetch(&self, query: &FlightQuery) -> impl Future<Output = CoreResult<Vec<Flight>>> + Send;
}

/// Connection settings for the live flight-position API.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub accept_version: String,
    pub request_timeout: Duration,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            api_token: String::new(),
            accept_version: DEFAULT_ACCEPT_VERSION.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// HTTP client for the live flight-position API.
pub struct HttpFlightFeed {
    http: reqwest::Client,
    config: FeedClientConfig,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl HttpFlightFeed {
    pub fn new(config: FeedClientConfig, metrics: Arc<MetricsRecorder>) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CoreError::InvalidArgument(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            metrics,
            logger: LogManager::new("spotcore::feed"),
        })
    }

    pub async fn fetch_by_region(&self, region: &BoundingRegion) -> CoreResult<Vec<Flight>> {
        self.fetch_query(&FlightQuery::Region(*region)).await
    }

    pub async fn fetch_by_identifier(&self, ident: &str) -> CoreResult<Vec<Flight>> {
        self.fetch_query(&FlightQuery::Identifier(ident.to_string())).await
    }

    pub async fn fetch_by_route(&self, origin: &str, destination: &str) -> CoreResult<Vec<Flight>> {
        self.fetch_query(&FlightQuery::Route {
            origin: origin.to_string(),
            destination: destination.to_string(),
        })
        .await
    }

    fn build_request(&self, query: &FlightQuery) -> CoreResult<reqwest::Request> {
        let (key, value) = query.query_param();
        self.http
            .get(&self.config.base_url)
            .query(&[(key, value.as_str())])
            .header(ACCEPT, "application/json")
            .header("Accept-Version", self.config.accept_version.as_str())
            .bearer_auth(&self.config.api_token)
            .build()
            .map_err(|e| CoreError::InvalidArgument(format!("building feed request: {}", e)))
    }

    async fn fetch_query(&self, query: &FlightQuery) -> CoreResult<Vec<Flight>> {
        let request = self.build_request(query)?;
        self.logger.detail(&format!("GET {}", request.url()));

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("request failed");
            return Err(CoreError::Network(format!(
                "{} {}",
                status.as_u16(),
                error_message(&body, reason)
            )));
        }

        match parse_feed_body(&body) {
            Ok(flights) => {
                self.logger
                    .detail(&format!("{} -> {} flights", query, flights.len()));
                Ok(flights)
            }
            Err(CoreError::MalformedResponse(reason)) => {
                self.metrics.record_malformed();
                self.logger.warn(&format!(
                    "{} -> malformed payload ({}), using empty list",
                    query, reason
                ));
                Ok(Vec::new())
            }
            Err(other) => Err(other),
        }
    }
}

impl FlightFeed for HttpFlightFeed {
    async fn fetch(&self, query: &FlightQuery) -> CoreResult<Vec<Flight>> {
        self.fetch_query(query).await
    }
}
