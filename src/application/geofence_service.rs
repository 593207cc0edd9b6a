// Geofence service - current vehicle position against configured zones
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::geo::Position;
use crate::domain::zone::{evaluate, GeofenceStatus, Zone};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceReport {
    pub device_id: String,
    pub position: Position,
    pub status: GeofenceStatus,
}

#[derive(Clone)]
pub struct GeofenceService {
    api: Arc<dyn TelemetryApi>,
}

impl GeofenceService {
    pub fn new(api: Arc<dyn TelemetryApi>) -> Self {
        Self { api }
    }

    pub async fn zones(&self) -> Result<Vec<Zone>, ApiError> {
        self.api.zones().await
    }

    /// `Ok(None)` when the vehicle has no reported position yet
    pub async fn evaluate_vehicle(&self, device_id: &str) -> Result<Option<GeofenceReport>, ApiError> {
        let (status, zones) = futures::try_join!(self.api.device_status(device_id), self.api.zones())?;

        let Some(status) = status else {
            return Ok(None);
        };

        Ok(Some(GeofenceReport {
            device_id: device_id.to_string(),
            position: status.position,
            status: evaluate(status.position, &zones),
        }))
    }
}
