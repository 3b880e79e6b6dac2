use crate::gui_bridge::model::{
    AutoRefreshUpdate, FavoriteToggle, FlightCard, HeadingUpdate, LocationUpdate, TrackerView,
};
use crate::workflow::favorites_file::JsonFileFavoritesStore;
use log::{info, warn};
use serde_json::json;
use spotcore::app_state::AppState;
use spotcore::feed_interface::{Flight, QueryInputs};
use spotcore::math::GeoPoint;
use spotcore::processing::{ControlMsg, ControllerSnapshot, FlightFilter};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

pub type SharedSnapshot = Arc<RwLock<ControllerSnapshot>>;
pub type SharedAppState = Arc<Mutex<AppState<JsonFileFavoritesStore>>>;

#[derive(Debug)]
enum BridgeError {
    InvalidInput(String),
    UnknownFlight(String),
    ControllerStopped,
}

impl warp::reject::Reject for BridgeError {}

impl BridgeError {
    fn status(&self) -> StatusCode {
        match self {
            BridgeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BridgeError::UnknownFlight(_) => StatusCode::NOT_FOUND,
            BridgeError::ControllerStopped => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            BridgeError::InvalidInput(reason) => reason.clone(),
            BridgeError::UnknownFlight(id) => format!("no flight with id {}", id),
            BridgeError::ControllerStopped => "polling controller stopped".into(),
        }
    }
}

/// HTTP front end for a running tracker: sensor and query updates flow in as
/// controller commands, the latest published snapshot flows out as JSON.
#[derive(Clone)]
pub struct GuiBridge {
    snapshot: SharedSnapshot,
    commands: mpsc::Sender<ControlMsg>,
    app_state: SharedAppState,
}

fn with_bridge(
    bridge: GuiBridge,
) -> impl Filter<Extract = (GuiBridge,), Error = Infallible> + Clone {
    warp::any().map(move || bridge.clone())
}

fn ok_status() -> warp::reply::Json {
    warp::reply::json(&json!({"status": "ok"}))
}

impl GuiBridge {
    pub fn new(
        snapshot: SharedSnapshot,
        commands: mpsc::Sender<ControlMsg>,
        app_state: SharedAppState,
    ) -> Self {
        Self {
            snapshot,
            commands,
            app_state,
        }
    }

    fn current(&self) -> ControllerSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut AppState<JsonFileFavoritesStore>) -> T) -> T {
        let mut guard = self
            .app_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    fn card(&self, flight: Flight) -> FlightCard {
        let is_favorite = self.with_state(|state| state.is_favorite(&flight));
        FlightCard {
            flight,
            is_favorite,
        }
    }

    async fn send(&self, msg: ControlMsg) -> Result<(), Rejection> {
        self.commands
            .send(msg)
            .await
            .map_err(|_| warp::reject::custom(BridgeError::ControllerStopped))
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
        let bridge = with_bridge(self.clone());

        let snapshot = warp::path!("snapshot")
            .and(warp::get())
            .and(bridge.clone())
            .map(|bridge: GuiBridge| {
                let favorite_ids: Vec<String> = bridge.with_state(|state| {
                    state.favorites().iter().map(|f| f.id.clone()).collect()
                });
                warp::reply::json(&TrackerView {
                    snapshot: bridge.current(),
                    favorite_ids,
                })
            });

        let flights = warp::path!("flights")
            .and(warp::get())
            .and(warp::query::<FlightFilter>())
            .and(bridge.clone())
            .map(|filter: FlightFilter, bridge: GuiBridge| {
                let cards: Vec<FlightCard> = bridge
                    .current()
                    .flights
                    .into_iter()
                    .filter(|flight| filter.matches(flight))
                    .map(|flight| bridge.card(flight))
                    .collect();
                warp::reply::json(&cards)
            });

        let in_view = warp::path!("in-view")
            .and(warp::get())
            .and(bridge.clone())
            .map(|bridge: GuiBridge| {
                let card = bridge.current().flight_in_view.map(|f| bridge.card(f));
                warp::reply::json(&card)
            });

        let favorites = warp::path!("favorites")
            .and(warp::get())
            .and(bridge.clone())
            .map(|bridge: GuiBridge| {
                let saved = bridge.with_state(|state| state.favorites().to_vec());
                warp::reply::json(&saved)
            });

        let location = warp::path!("location")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge.clone())
            .and_then(|update: LocationUpdate, bridge: GuiBridge| async move {
                let msg = if update.denied {
                    ControlMsg::LocationDenied
                } else {
                    let (Some(latitude), Some(longitude)) = (update.latitude, update.longitude)
                    else {
                        return Err(warp::reject::custom(BridgeError::InvalidInput(
                            "latitude and longitude are required".into(),
                        )));
                    };
                    let point = GeoPoint::try_new(latitude, longitude).map_err(|e| {
                        warp::reject::custom(BridgeError::InvalidInput(e.to_string()))
                    })?;
                    ControlMsg::SetLocation(point)
                };
                bridge.send(msg).await?;
                Ok::<_, Rejection>(ok_status())
            });

        let heading = warp::path!("heading")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge.clone())
            .and_then(|update: HeadingUpdate, bridge: GuiBridge| async move {
                if !update.heading.is_finite() {
                    return Err(warp::reject::custom(BridgeError::InvalidInput(
                        "heading must be a finite number of degrees".into(),
                    )));
                }
                bridge.send(ControlMsg::SetHeading(update.heading)).await?;
                Ok(ok_status())
            });

        let query = warp::path!("query")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge.clone())
            .and_then(|inputs: QueryInputs, bridge: GuiBridge| async move {
                bridge.send(ControlMsg::SetQuery(inputs)).await?;
                Ok::<_, Rejection>(ok_status())
            });

        let auto_refresh = warp::path!("auto-refresh")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge.clone())
            .and_then(|update: AutoRefreshUpdate, bridge: GuiBridge| async move {
                if let Some(secs) = update.interval_secs {
                    if secs == 0 {
                        return Err(warp::reject::custom(BridgeError::InvalidInput(
                            "interval_secs must be greater than zero".into(),
                        )));
                    }
                    bridge
                        .send(ControlMsg::SetInterval(Duration::from_secs(secs)))
                        .await?;
                }
                bridge.send(ControlMsg::SetAutoRefresh(update.enabled)).await?;
                Ok(ok_status())
            });

        let refetch = warp::path!("refetch")
            .and(warp::post())
            .and(bridge.clone())
            .and_then(|bridge: GuiBridge| async move {
                bridge.send(ControlMsg::Refetch).await?;
                Ok::<_, Rejection>(ok_status())
            });

        let toggle = warp::path!("favorites" / "toggle")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge)
            .and_then(|toggle: FavoriteToggle, bridge: GuiBridge| async move {
                let known = bridge
                    .current()
                    .flights
                    .into_iter()
                    .find(|f| f.id == toggle.id)
                    .or_else(|| {
                        bridge.with_state(|state| {
                            state.favorites().iter().find(|f| f.id == toggle.id).cloned()
                        })
                    });
                let Some(flight) = known else {
                    return Err(warp::reject::custom(BridgeError::UnknownFlight(toggle.id)));
                };
                let is_favorite = bridge.with_state(|state| state.toggle_favorite(&flight));
                info!("favorite {} -> {}", flight.label(), is_favorite);
                Ok(warp::reply::json(
                    &json!({"status": "ok", "id": flight.id, "is_favorite": is_favorite}),
                ))
            });

        snapshot
            .or(flights)
            .or(in_view)
            .or(favorites)
            .or(location)
            .or(heading)
            .or(query)
            .or(auto_refresh)
            .or(refetch)
            .or(toggle)
            .recover(handle_rejection)
    }

    /// Binds the HTTP bridge and returns the bound address with the server future.
    pub fn bind(
        &self,
        addr: SocketAddr,
    ) -> anyhow::Result<(SocketAddr, impl std::future::Future<Output = ()> + 'static)> {
        let (bound, server) = warp::serve(self.routes()).try_bind_ephemeral(addr)?;
        info!("HTTP bridge listening on {}", bound);
        Ok((bound, server))
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if let Some(e) = err.find::<BridgeError>() {
        (e.status(), e.message())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        warn!("unhandled bridge rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({"status": "error", "message": message})),
        code,
    ))
}
