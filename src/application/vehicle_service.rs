// Vehicle service - device list, current status, fuel, trips and paths
use crate::application::diagnostic_resolver::{DiagnosticResolver, FuelMarkers};
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::telemetry::{FuelSnapshot, TimeWindow};
use crate::domain::vehicle::{Device, Trip, TripPath, VehicleStatus};
use std::sync::Arc;

/// Trailing window used when a diagnostic has to stand in for a status field
const RESOLVER_WINDOW_HOURS: i64 = 24;

/// Ranked candidate diagnostics for values the status feed may omit
#[derive(Debug, Clone)]
pub struct StatusDiagnostics {
    pub odometer: Vec<String>,
    pub fuel: Vec<String>,
    pub fuel_markers: FuelMarkers,
}

#[derive(Clone)]
pub struct VehicleService {
    api: Arc<dyn TelemetryApi>,
    resolver: DiagnosticResolver,
    diagnostics: StatusDiagnostics,
}

impl VehicleService {
    pub fn new(api: Arc<dyn TelemetryApi>, diagnostics: StatusDiagnostics) -> Self {
        Self {
            resolver: DiagnosticResolver::new(api.clone()),
            api,
            diagnostics,
        }
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Device>, ApiError> {
        let mut devices = self.api.list_devices().await?;
        devices.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(devices)
    }

    /// Current status; the odometer falls back to the diagnostic resolver
    /// when the status feed does not carry it.
    pub async fn current_status(&self, device_id: &str) -> Result<Option<VehicleStatus>, ApiError> {
        let Some(mut status) = self.api.device_status(device_id).await? else {
            return Ok(None);
        };

        if status.odometer.is_none() {
            let window = TimeWindow::trailing_hours(RESOLVER_WINDOW_HOURS);
            match self
                .resolver
                .resolve_latest_reading(device_id, &self.diagnostics.odometer, &window)
                .await
            {
                Ok(odometer) => status.odometer = odometer,
                // Position is still worth returning without an odometer
                Err(e) => tracing::warn!("Odometer unavailable for device {}: {}", device_id, e),
            }
        }

        Ok(Some(status))
    }

    /// `Ok(None)` when no fuel diagnostic produced a value
    pub async fn fuel_snapshot(&self, device_id: &str) -> Result<Option<FuelSnapshot>, ApiError> {
        let window = TimeWindow::trailing_hours(RESOLVER_WINDOW_HOURS);
        let snapshot = self
            .resolver
            .resolve_fuel(
                device_id,
                &self.diagnostics.fuel,
                &self.diagnostics.fuel_markers,
                &window,
            )
            .await?;

        Ok((!snapshot.is_empty()).then_some(snapshot))
    }

    /// Trips in the trailing `days`, newest first
    pub async fn trips(&self, device_id: &str, days: i64) -> Result<Vec<Trip>, ApiError> {
        let window = TimeWindow::trailing_days(days);
        let mut trips = self.api.trips(device_id, &window).await?;
        trips.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(trips)
    }

    pub async fn trip_path(&self, device_id: &str, window: &TimeWindow) -> Result<TripPath, ApiError> {
        let points = self.api.log_records(device_id, window).await?;
        Ok(TripPath::new(device_id.to_string(), points))
    }
}
