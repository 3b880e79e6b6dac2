use crate::generator::profile::SyntheticFeed;
use crate::gui_bridge::bridge::{GuiBridge, SharedSnapshot};
use crate::workflow::config::TrackerConfig;
use crate::workflow::favorites_file::JsonFileFavoritesStore;
use anyhow::Context;
use log::info;
use spotcore::app_state::AppState;
use spotcore::feed_interface::{Flight, FlightQuery, QueryInputs};
use spotcore::math::GeoPoint;
use spotcore::processing::{
    Completion, ControlMsg, ControllerSnapshot, FlightFeed, HttpFlightFeed, PollingConfig,
    PollingController,
};
use spotcore::telemetry::MetricsRecorder;
use spotcore::CoreResult;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;

/// Feed selected at startup: the live API or the offline generator.
pub enum TrackerFeed {
    Live(HttpFlightFeed),
    Synthetic(SyntheticFeed),
}

impl FlightFeed for TrackerFeed {
    async fn fetch(&self, query: &FlightQuery) -> CoreResult<Vec<Flight>> {
        match self {
            TrackerFeed::Live(feed) => feed.fetch(query).await,
            TrackerFeed::Synthetic(feed) => feed.fetch(query).await,
        }
    }
}

/// Sensor and search values known before the controller starts.
#[derive(Debug, Clone, Default)]
pub struct StartupInputs {
    pub location: Option<GeoPoint>,
    pub heading: Option<f64>,
    pub query: QueryInputs,
}

#[derive(Clone)]
pub struct Runner {
    config: TrackerConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn build_feed(&self, offline: bool) -> anyhow::Result<TrackerFeed> {
        if offline {
            info!(
                "using synthetic feed ({} flights, seed {})",
                self.config.generator.flight_count, self.config.generator.seed
            );
            return Ok(TrackerFeed::Synthetic(SyntheticFeed::new(
                self.config.generator.clone(),
            )));
        }

        let feed_config = self.config.to_feed_config();
        if feed_config.api_token.is_empty() {
            log::warn!("no API token configured, the live feed will reject requests");
        }
        let feed = HttpFlightFeed::new(feed_config, Arc::clone(&self.metrics))
            .context("creating live feed client")?;
        Ok(TrackerFeed::Live(feed))
    }

    fn build_controller<F: FlightFeed + 'static>(
        &self,
        feed: F,
        config: PollingConfig,
        startup: &StartupInputs,
    ) -> anyhow::Result<PollingController<F>> {
        let mut controller =
            PollingController::new(Arc::new(feed), config, Arc::clone(&self.metrics))
                .context("creating polling controller")?;
        if let Some(heading) = startup.heading {
            controller.set_heading(heading);
        }
        if let Some(location) = startup.location {
            controller.set_location(location);
        }
        controller.set_query(startup.query.clone());
        Ok(controller)
    }

    /// Fetches once with auto-refresh off and returns the resulting state.
    pub async fn execute_once<F: FlightFeed + 'static>(
        &self,
        feed: F,
        startup: StartupInputs,
    ) -> anyhow::Result<ControllerSnapshot> {
        let config = PollingConfig {
            auto_refresh: false,
            ..self.config.to_polling_config()
        };
        let mut controller = self.build_controller(feed, config, &startup)?;
        controller
            .refetch()
            .context("no query available: pass --flight, --origin/--destination or --lat/--lon")?;

        let completion = loop {
            let event = controller.next_event().await;
            if let Some(completion) = controller.handle_event(event) {
                break completion;
            }
        };

        let snapshot = controller.snapshot();
        if completion == Completion::Failed {
            anyhow::bail!(
                "fetch failed: {}",
                snapshot.last_error.unwrap_or_default()
            );
        }
        Ok(snapshot)
    }

    /// Polls until Ctrl+C.
    pub async fn run<F: FlightFeed + 'static>(
        &self,
        feed: F,
        startup: StartupInputs,
        serve: bool,
    ) -> anyhow::Result<ControllerSnapshot> {
        self.run_until(feed, startup, serve, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("awaiting Ctrl+C failed: {}", e);
            }
        })
        .await
    }

    /// Drives the controller, optionally behind the HTTP bridge, until
    /// `shutdown` resolves. Returns the last published snapshot.
    pub async fn run_until<F, S>(
        &self,
        feed: F,
        startup: StartupInputs,
        serve: bool,
        shutdown: S,
    ) -> anyhow::Result<ControllerSnapshot>
    where
        F: FlightFeed + 'static,
        S: Future<Output = ()>,
    {
        let controller = self.build_controller(feed, self.config.to_polling_config(), &startup)?;
        let snapshot: SharedSnapshot = Arc::new(RwLock::new(controller.snapshot()));
        let (commands_tx, commands_rx) = mpsc::channel::<ControlMsg>(32);

        let publish = Arc::clone(&snapshot);
        let mut reported = 0;
        let controller_task = tokio::spawn(controller.run(commands_rx, move |ctl| {
            let current = ctl.snapshot();
            if current.metrics.applied != reported {
                reported = current.metrics.applied;
                info!(
                    "{:?} {} -> {} flights, in view: {}",
                    current.state,
                    current.query.as_deref().unwrap_or("-"),
                    current.flights.len(),
                    current
                        .flight_in_view
                        .as_ref()
                        .map(Flight::label)
                        .unwrap_or("none")
                );
            }
            *publish.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = current;
        }));

        let server_task = if serve {
            let store = JsonFileFavoritesStore::new(&self.config.favorites_path);
            let app_state = Arc::new(Mutex::new(AppState::new(store)));
            let bridge = GuiBridge::new(Arc::clone(&snapshot), commands_tx.clone(), app_state);
            let (_, server) = bridge
                .bind(self.config.bind_address)
                .with_context(|| format!("binding HTTP bridge on {}", self.config.bind_address))?;
            Some(tokio::spawn(server))
        } else {
            None
        };

        shutdown.await;
        info!("shutting down tracker");

        if let Some(server) = server_task {
            server.abort();
            let _ = server.await;
        }
        drop(commands_tx);
        controller_task
            .await
            .context("joining polling controller task")?;

        let last = snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Ok(last)
    }
}
