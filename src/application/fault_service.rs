// Fault service - use case for the per-diagnostic fault summary
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::fault::{group_faults, FaultGroup};
use crate::domain::telemetry::TimeWindow;
use std::sync::Arc;

#[derive(Clone)]
pub struct FaultService {
    api: Arc<dyn TelemetryApi>,
}

impl FaultService {
    pub fn new(api: Arc<dyn TelemetryApi>) -> Self {
        Self { api }
    }

    /// Fault groups over the trailing `days`, most recently active first.
    /// An empty list means no faults; fetch failures come back as `Err`.
    pub async fn fault_summary(&self, device_id: &str, days: i64) -> Result<Vec<FaultGroup>, ApiError> {
        let window = TimeWindow::trailing_days(days);
        let events = self.api.fault_data(device_id, &window).await?;

        tracing::debug!("Fetched {} fault events for device {}", events.len(), device_id);
        Ok(group_faults(events))
    }
}
