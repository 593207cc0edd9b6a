// HTTP request handlers
use crate::application::live_feed::LiveFeed;
use crate::application::selection::SelectionTracker;
use crate::domain::telemetry::{TimeWindow, MAX_TRAILING_HOURS};
use crate::infrastructure::http_response::{data_response, list_response, optional_response};
use crate::infrastructure::ndjson_stream::stream_from_receiver;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_EFFICIENCY_HOURS: i64 = 24;
const DEFAULT_ACCELEROMETER_HOURS: i64 = 1;
const DEFAULT_DAYS: i64 = 7;
const DEFAULT_PATH_HOURS: i64 = 24;
const MAX_DAYS: i64 = MAX_TRAILING_HOURS / 24;

#[derive(Deserialize)]
pub struct HoursQuery {
    pub hours: Option<i64>,
}

#[derive(Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct LiveQuery {
    /// Registers the feed so the client can later move it to another vehicle
    pub client: Option<String>,
}

impl RangeQuery {
    fn window(&self) -> Option<TimeWindow> {
        let to = self.to.unwrap_or_else(Utc::now);
        let from = match self.from {
            Some(from) => from,
            None => to.checked_sub_signed(Duration::hours(DEFAULT_PATH_HOURS))?,
        };
        (from < to).then(|| TimeWindow::new(from, to))
    }
}

/// Clamp user supplied periods to something the upstream will answer
fn positive(value: Option<i64>, default: i64, max: i64) -> i64 {
    value.filter(|v| *v > 0).unwrap_or(default).min(max)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_vehicles(State(state): State<Arc<AppState>>) -> Response {
    list_response(state.vehicle_service.list_vehicles().await)
}

pub async fn vehicle_status(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    optional_response(state.vehicle_service.current_status(&id).await)
}

pub async fn vehicle_fuel(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    optional_response(state.vehicle_service.fuel_snapshot(&id).await)
}

pub async fn vehicle_efficiency(
    Path(id): Path<String>,
    Query(query): Query<HoursQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hours = positive(query.hours, DEFAULT_EFFICIENCY_HOURS, MAX_TRAILING_HOURS);
    optional_response(state.efficiency_service.compute_efficiency(&id, hours).await)
}

pub async fn vehicle_geofence(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    optional_response(state.geofence_service.evaluate_vehicle(&id).await)
}

pub async fn vehicle_faults(
    Path(id): Path<String>,
    Query(query): Query<DaysQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let days = positive(query.days, DEFAULT_DAYS, MAX_DAYS);
    list_response(state.fault_service.fault_summary(&id, days).await)
}

pub async fn vehicle_accelerometer(
    Path(id): Path<String>,
    Query(query): Query<HoursQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hours = positive(query.hours, DEFAULT_ACCELEROMETER_HOURS, MAX_TRAILING_HOURS);
    let window = TimeWindow::trailing_hours(hours);
    optional_response(state.accelerometer_service.accelerometer_report(&id, &window).await)
}

pub async fn vehicle_trips(
    Path(id): Path<String>,
    Query(query): Query<DaysQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let days = positive(query.days, DEFAULT_DAYS, MAX_DAYS);
    list_response(state.vehicle_service.trips(&id, days).await)
}

pub async fn vehicle_path(
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(window) = query.window() else {
        return (StatusCode::BAD_REQUEST, "`from` must be before `to`").into_response();
    };
    optional_response(
        state
            .vehicle_service
            .trip_path(&id, &window)
            .await
            .map(|path| (!path.points.is_empty()).then_some(path)),
    )
}

pub async fn list_zones(State(state): State<Arc<AppState>>) -> Response {
    list_response(state.geofence_service.zones().await)
}

/// Stream live snapshots for a vehicle (newline-delimited JSON)
pub async fn vehicle_live(
    Path(id): Path<String>,
    Query(query): Query<LiveQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let selection = match query.client.as_deref() {
        Some(client) => state.selections.attach(client, &id),
        None => {
            let selection = Arc::new(SelectionTracker::default());
            selection.select(&id);
            selection
        }
    };

    let feed = Arc::new(LiveFeed::new(
        state.vehicle_service.clone(),
        state.geofence_service.clone(),
        state.fault_service.clone(),
        selection,
        state.live.poll_interval(),
        state.live.fault_days,
    ));

    tracing::info!("Starting live feed for vehicle {}", id);
    stream_from_receiver(feed.spawn())
}

/// Move a client's running live feed to another vehicle
pub async fn retarget_live(
    Path((client, id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.selections.retarget(&client, &id) {
        Some(token) => data_response(json!({ "client": client, "vehicleId": token.vehicle_id })),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "message": format!("No live feed for client {}", client) })),
        )
            .into_response(),
    }
}
