use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use spotcore::processing::feed_client::{DEFAULT_ACCEPT_VERSION, DEFAULT_FEED_URL};
use spotcore::processing::{FeedClientConfig, PollingConfig};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted when the config carries no API token.
pub const API_KEY_ENV: &str = "FR24_API_KEY";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub feed_url: String,
    pub api_token: Option<String>,
    pub accept_version: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub radius_km: f64,
    pub tolerance_deg: f64,
    pub heading_offset_deg: f64,
    pub auto_refresh: bool,
    pub favorites_path: PathBuf,
    pub bind_address: SocketAddr,
    pub generator: GeneratorConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            api_token: None,
            accept_version: DEFAULT_ACCEPT_VERSION.to_string(),
            poll_interval_secs: 60,
            request_timeout_secs: 15,
            radius_km: 100.0,
            tolerance_deg: 10.0,
            heading_offset_deg: 0.0,
            auto_refresh: true,
            favorites_path: PathBuf::from("tools/data/favorites.json"),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9000)),
            generator: GeneratorConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading tracker config {}", path_ref.display()))?;
        let config: TrackerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing tracker config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn with_overrides(mut self, radius_km: Option<f64>, interval_secs: Option<u64>) -> Self {
        if let Some(radius_km) = radius_km {
            self.radius_km = radius_km;
        }
        if let Some(interval_secs) = interval_secs {
            self.poll_interval_secs = interval_secs;
        }
        self
    }

    pub fn api_token(&self) -> String {
        self.api_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default()
    }

    pub fn to_feed_config(&self) -> FeedClientConfig {
        FeedClientConfig {
            base_url: self.feed_url.clone(),
            api_token: self.api_token(),
            accept_version: self.accept_version.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn to_polling_config(&self) -> PollingConfig {
        PollingConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            tolerance_deg: self.tolerance_deg,
            heading_offset_deg: self.heading_offset_deg,
            auto_refresh: self.auto_refresh,
        }
    }
}
