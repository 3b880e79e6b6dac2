use crate::feed_interface::{Flight, FlightQuery, QueryInputs};
use crate::math::{BoundingRegion, GeoMath, GeoPoint};
use crate::prelude::{CoreError, CoreResult, UserState};
use crate::processing::feed_client::{FlightFeed, DEFAULT_REQUEST_TIMEOUT};
use crate::processing::resolver::{FlightInViewResolver, DEFAULT_TOLERANCE_DEG};
use crate::telemetry::{LogManager, MetricsRecorder, PollMetrics};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollState {
    Idle,
    Polling,
    Suspended,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval: Duration,
    pub request_timeout: Duration,
    pub tolerance_deg: f64,
    pub heading_offset_deg: f64,
    pub auto_refresh: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tolerance_deg: DEFAULT_TOLERANCE_DEG,
            heading_offset_deg: 0.0,
            auto_refresh: true,
        }
    }
}

/// Internal events: timer ticks and finished fetches.
#[derive(Debug)]
pub enum PollEvent {
    Tick { timer: u64 },
    Completed {
        seq: u64,
        result: CoreResult<Vec<Flight>>,
    },
}

/// Inputs from sensors and the user interface.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    SetLocation(GeoPoint),
    LocationDenied,
    SetHeading(f64),
    SetQuery(QueryInputs),
    SetAutoRefresh(bool),
    SetInterval(Duration),
    Refetch,
}

/// What happened to a finished fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// A newer request had already been applied.
    Discarded,
}

/// Serializable view of the controller for consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub state: PollState,
    pub auto_refresh: bool,
    pub query: Option<String>,
    pub region: Option<BoundingRegion>,
    pub user: UserState,
    pub flights: Vec<Flight>,
    pub flight_in_view: Option<Flight>,
    pub in_view_distance_km: Option<f64>,
    pub last_error: Option<String>,
    pub metrics: PollMetrics,
}

/// Owns the flight list and the flight-in-view selection and keeps both fresh.
///
/// Every fetch is tagged with a sequence number at dispatch. Results are
/// applied in trigger order: a response older than the last applied one is
/// dropped even if it arrives later. At most one interval timer exists; ticks
/// from a replaced timer are ignored by generation.
pub struct PollingController<F: FlightFeed + 'static> {
    feed: Arc<F>,
    config: PollingConfig,
    resolver: FlightInViewResolver,
    state: PollState,
    user: UserState,
    inputs: QueryInputs,
    query: Option<FlightQuery>,
    flights: Vec<Flight>,
    in_view: Option<usize>,
    last_error: Option<CoreError>,
    next_seq: u64,
    last_applied: Option<u64>,
    in_flight: usize,
    timer: Option<JoinHandle<()>>,
    timer_generation: u64,
    events_tx: mpsc::UnboundedSender<PollEvent>,
    events_rx: mpsc::UnboundedReceiver<PollEvent>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

fn validate_interval(interval: Duration) -> CoreResult<()> {
    if interval.is_zero() {
        return Err(CoreError::InvalidArgument(
            "poll interval must be greater than zero".into(),
        ));
    }
    Ok(())
}

impl<F: FlightFeed + 'static> PollingController<F> {
    pub fn new(
        feed: Arc<F>,
        config: PollingConfig,
        metrics: Arc<MetricsRecorder>,
    ) -> CoreResult<Self> {
        validate_interval(config.interval)?;
        if config.request_timeout.is_zero() {
            return Err(CoreError::InvalidArgument(
                "request timeout must be greater than zero".into(),
            ));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            feed,
            resolver: FlightInViewResolver::new(config.tolerance_deg),
            user: UserState::with_heading_offset(config.heading_offset_deg),
            config,
            state: PollState::Idle,
            inputs: QueryInputs::default(),
            query: None,
            flights: Vec::new(),
            in_view: None,
            last_error: None,
            next_seq: 0,
            last_applied: None,
            in_flight: 0,
            timer: None,
            timer_generation: 0,
            events_tx,
            events_rx,
            metrics,
            logger: LogManager::new("spotcore::polling"),
        })
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn flight_in_view(&self) -> Option<&Flight> {
        self.in_view.and_then(|idx| self.flights.get(idx))
    }

    pub fn query(&self) -> Option<&FlightQuery> {
        self.query.as_ref()
    }

    pub fn region(&self) -> Option<&BoundingRegion> {
        self.query.as_ref().and_then(FlightQuery::region)
    }

    pub fn user(&self) -> &UserState {
        &self.user
    }

    pub fn last_error(&self) -> Option<&CoreError> {
        self.last_error.as_ref()
    }

    pub fn auto_refresh(&self) -> bool {
        self.config.auto_refresh
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let flight_in_view = self.flight_in_view().cloned();
        let in_view_distance_km = match (self.user.location(), &flight_in_view) {
            (Some(user), Some(flight)) => {
                Some(GeoMath::haversine_distance_km(user, flight.position()))
            }
            _ => None,
        };

        ControllerSnapshot {
            state: self.state,
            auto_refresh: self.config.auto_refresh,
            query: self.query.as_ref().map(ToString::to_string),
            region: self.region().copied(),
            user: self.user,
            flights: self.flights.clone(),
            flight_in_view,
            in_view_distance_km,
            last_error: self.last_error.as_ref().map(ToString::to_string),
            metrics: self.metrics.snapshot(),
        }
    }

    pub fn set_location(&mut self, location: GeoPoint) {
        self.user.set_location(location);
        if self.last_error == Some(CoreError::PermissionDenied) {
            self.last_error = None;
        }
        self.reconcile(false);
        self.refresh_in_view();
    }

    /// The location provider refused access; polling stops until a location arrives.
    pub fn location_denied(&mut self) {
        self.logger.warn("location permission denied");
        self.user.clear_location();
        self.last_error = Some(CoreError::PermissionDenied);
        self.reconcile(false);
        self.refresh_in_view();
    }

    pub fn set_heading(&mut self, raw_heading: f64) {
        self.user.set_heading(raw_heading);
        self.refresh_in_view();
    }

    pub fn set_query(&mut self, inputs: QueryInputs) {
        self.inputs = inputs;
        self.reconcile(true);
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.config.auto_refresh = enabled;
        self.reconcile(false);
    }

    /// Replaces the period; a running timer is restarted with the new one.
    pub fn set_interval(&mut self, interval: Duration) -> CoreResult<()> {
        validate_interval(interval)?;
        self.config.interval = interval;
        if self.state == PollState::Polling {
            self.start_timer(interval);
        }
        Ok(())
    }

    /// One-off fetch outside the periodic schedule. Returns the request's
    /// sequence number, or `None` when no query mode is available.
    pub fn refetch(&mut self) -> Option<u64> {
        let seq = self.dispatch();
        if seq.is_none() {
            self.logger.detail("refetch skipped, no query available");
        }
        seq
    }

    pub fn handle_control(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::SetLocation(location) => self.set_location(location),
            ControlMsg::LocationDenied => self.location_denied(),
            ControlMsg::SetHeading(heading) => self.set_heading(heading),
            ControlMsg::SetQuery(inputs) => self.set_query(inputs),
            ControlMsg::SetAutoRefresh(enabled) => self.set_auto_refresh(enabled),
            ControlMsg::SetInterval(interval) => {
                if let Err(e) = self.set_interval(interval) {
                    self.logger.warn(&format!("interval change rejected: {}", e));
                }
            }
            ControlMsg::Refetch => {
                self.refetch();
            }
        }
    }

    /// Waits for the next timer tick or fetch completion.
    pub async fn next_event(&mut self) -> PollEvent {
        // the controller keeps a sender, so the channel never closes
        loop {
            if let Some(event) = self.events_rx.recv().await {
                return event;
            }
        }
    }

    /// Returns the completion outcome for fetch results, `None` for ticks.
    pub fn handle_event(&mut self, event: PollEvent) -> Option<Completion> {
        match event {
            PollEvent::Tick { timer } => {
                if timer == self.timer_generation && self.state == PollState::Polling {
                    self.dispatch();
                }
                None
            }
            PollEvent::Completed { seq, result } => Some(self.apply(seq, result)),
        }
    }

    /// Event loop: processes control messages and internal events until the
    /// control channel closes, calling `on_change` after each step.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ControlMsg>,
        mut on_change: impl FnMut(&Self),
    ) {
        on_change(&self);
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(msg) => self.handle_control(msg),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }
            }
            on_change(&self);
        }
        self.stop_timer();
        self.logger.record("polling controller stopped");
    }

    fn reconcile(&mut self, query_changed: bool) {
        let location = self.user.location();
        self.query = match FlightQuery::select(&self.inputs, location) {
            Ok(query) => query,
            Err(e) => {
                self.logger.warn(&format!("cannot build feed query: {}", e));
                self.last_error = Some(e);
                None
            }
        };

        let ready = location.is_some() && self.query.is_some();
        let previous = self.state;
        let next = match (ready, self.config.auto_refresh) {
            (false, _) => PollState::Idle,
            (true, false) => PollState::Suspended,
            (true, true) => PollState::Polling,
        };

        if next != previous {
            self.logger
                .record(&format!("poll state {:?} -> {:?}", previous, next));
        }

        match next {
            PollState::Idle | PollState::Suspended => self.stop_timer(),
            PollState::Polling if previous == PollState::Idle => self.start_timer(Duration::ZERO),
            PollState::Polling if previous == PollState::Suspended => {
                self.start_timer(self.config.interval)
            }
            PollState::Polling => {
                if query_changed {
                    self.dispatch();
                }
            }
        }
        self.state = next;
    }

    fn start_timer(&mut self, first_tick_in: Duration) {
        self.stop_timer();
        self.timer_generation += 1;

        let generation = self.timer_generation;
        let period = self.config.interval;
        let tx = self.events_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + first_tick_in, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(PollEvent::Tick { timer: generation }).is_err() {
                    break;
                }
            }
        }));
        self.logger
            .detail(&format!("timer #{} started, period {:?}", generation, period));
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            self.logger
                .detail(&format!("timer #{} cancelled", self.timer_generation));
        }
    }

    fn dispatch(&mut self) -> Option<u64> {
        let query = self.query.clone()?;
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight += 1;
        self.metrics.record_dispatched();
        self.logger.detail(&format!("poll #{} {}", seq, query));

        let feed = Arc::clone(&self.feed);
        let tx = self.events_tx.clone();
        let timeout = self.config.request_timeout;
        tokio::spawn(async move {
            let result = match time::timeout(timeout, feed.fetch(&query)).await {
                Ok(result) => result,
                Err(_) => Err(CoreError::Network(format!(
                    "request timed out after {}s",
                    timeout.as_secs_f64()
                ))),
            };
            let _ = tx.send(PollEvent::Completed { seq, result });
        });
        Some(seq)
    }

    fn apply(&mut self, seq: u64, result: CoreResult<Vec<Flight>>) -> Completion {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.last_applied.is_some_and(|applied| seq < applied) {
            self.metrics.record_discarded();
            self.logger.detail(&format!(
                "poll #{} discarded, #{} already applied",
                seq,
                self.last_applied.unwrap_or_default()
            ));
            return Completion::Discarded;
        }
        self.last_applied = Some(seq);

        match result {
            Ok(flights) => {
                self.logger
                    .detail(&format!("poll #{} applied, {} flights", seq, flights.len()));
                self.flights = flights;
                self.last_error = None;
                self.metrics.record_applied();
                self.refresh_in_view();
                Completion::Applied
            }
            Err(e) => {
                self.logger.warn(&format!("poll #{} failed: {}", seq, e));
                self.metrics.record_error();
                self.flights.clear();
                self.in_view = None;
                self.last_error = Some(e);
                Completion::Failed
            }
        }
    }

    fn refresh_in_view(&mut self) {
        self.in_view = self.user.fix().and_then(|(location, heading)| {
            self.resolver.resolve_index(location, heading, &self.flights)
        });
    }
}

impl<F: FlightFeed + 'static> Drop for PollingController<F> {
    fn drop(&mut self) {
        self.stop_timer();
    }
}
