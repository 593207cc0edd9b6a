// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::{get, put}, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::accelerometer_service::AccelerometerService;
use crate::application::efficiency_service::EfficiencyService;
use crate::application::fault_service::FaultService;
use crate::application::geofence_service::GeofenceService;
use crate::application::selection::SelectionRegistry;
use crate::application::telemetry_api::TelemetryApi;
use crate::application::vehicle_service::VehicleService;
use crate::infrastructure::config::{load_app_config, load_diagnostics_config};
use crate::infrastructure::rpc_client::JsonRpcClient;
use crate::infrastructure::rpc_repository::RpcTelemetryApi;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, list_vehicles, list_zones, retarget_live, vehicle_accelerometer, vehicle_efficiency, vehicle_faults,
    vehicle_fuel, vehicle_geofence, vehicle_live, vehicle_path, vehicle_status, vehicle_trips,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;
    let diagnostics = load_diagnostics_config()?;

    // Connect to the telemetry API (infrastructure layer)
    let client = JsonRpcClient::connect(&app_config.api).await?;
    let api: Arc<dyn TelemetryApi> = Arc::new(RpcTelemetryApi::new(client));

    // Create services (application layer)
    let state = Arc::new(AppState {
        vehicle_service: VehicleService::new(api.clone(), diagnostics.status_diagnostics()),
        efficiency_service: EfficiencyService::new(
            api.clone(),
            diagnostics.efficiency_odometer.clone(),
            diagnostics.efficiency_fuel.clone(),
        ),
        geofence_service: GeofenceService::new(api.clone()),
        fault_service: FaultService::new(api.clone()),
        accelerometer_service: AccelerometerService::new(api, diagnostics.accelerometer_diagnostics()),
        live: app_config.live.clone(),
        selections: Arc::new(SelectionRegistry::default()),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/:id/status", get(vehicle_status))
        .route("/vehicles/:id/fuel", get(vehicle_fuel))
        .route("/vehicles/:id/efficiency", get(vehicle_efficiency))
        .route("/vehicles/:id/geofence", get(vehicle_geofence))
        .route("/vehicles/:id/faults", get(vehicle_faults))
        .route("/vehicles/:id/accelerometer", get(vehicle_accelerometer))
        .route("/vehicles/:id/trips", get(vehicle_trips))
        .route("/vehicles/:id/path", get(vehicle_path))
        .route("/vehicles/:id/live", get(vehicle_live))
        .route("/zones", get(list_zones))
        .route("/clients/:client/live/:id", put(retarget_live))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config.http.bind.parse()?;
    tracing::info!("Starting fleet-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
