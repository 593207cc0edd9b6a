// Telemetry API trait - the upstream fleet RPC surface as seen by use cases
use crate::domain::fault::FaultEvent;
use crate::domain::telemetry::{DiagnosticSeries, TimeWindow};
use crate::domain::vehicle::{Device, PathPoint, Trip, VehicleStatus};
use crate::domain::zone::Zone;
use async_trait::async_trait;
use thiserror::Error;

/// Failures talking to the upstream API. "No data" is never an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Upstream API error: {message}")]
    Upstream { message: String, name: Option<String> },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream {
            message: message.into(),
            name: None,
        }
    }

    /// Transient failures a caller may simply retry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout)
    }
}

#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// List all devices visible to the session
    async fn list_devices(&self) -> Result<Vec<Device>, ApiError>;

    /// Latest status for a device, if the upstream has one
    async fn device_status(&self, device_id: &str) -> Result<Option<VehicleStatus>, ApiError>;

    /// All samples for one diagnostic within the window (unordered)
    async fn status_data(
        &self,
        device_id: &str,
        diagnostic_id: &str,
        window: &TimeWindow,
    ) -> Result<DiagnosticSeries, ApiError>;

    /// Several diagnostics in one batched request, so every series reflects
    /// the same query instant. Results line up with `diagnostic_ids`.
    async fn status_data_batch(
        &self,
        device_id: &str,
        diagnostic_ids: &[String],
        window: &TimeWindow,
    ) -> Result<Vec<DiagnosticSeries>, ApiError>;

    async fn zones(&self) -> Result<Vec<Zone>, ApiError>;

    async fn fault_data(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<FaultEvent>, ApiError>;

    async fn trips(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<Trip>, ApiError>;

    /// Raw GPS log records for a device within the window
    async fn log_records(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<PathPoint>, ApiError>;
}
