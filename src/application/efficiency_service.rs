// Fuel efficiency service - batched odometer/fuel fetch over a trailing window
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::telemetry::{compute_efficiency, EfficiencyResult, TimeWindow};
use std::sync::Arc;

#[derive(Clone)]
pub struct EfficiencyService {
    api: Arc<dyn TelemetryApi>,
    odometer_diagnostic: String,
    fuel_diagnostic: String,
}

impl EfficiencyService {
    pub fn new(api: Arc<dyn TelemetryApi>, odometer_diagnostic: String, fuel_diagnostic: String) -> Self {
        Self {
            api,
            odometer_diagnostic,
            fuel_diagnostic,
        }
    }

    /// L/100km over the last `window_hours`. `Ok(None)` when there is not
    /// enough data or the vehicle did not move.
    pub async fn compute_efficiency(
        &self,
        device_id: &str,
        window_hours: i64,
    ) -> Result<Option<EfficiencyResult>, ApiError> {
        let window = TimeWindow::trailing_hours(window_hours);
        let diagnostics = [self.odometer_diagnostic.clone(), self.fuel_diagnostic.clone()];

        let mut series = self
            .api
            .status_data_batch(device_id, &diagnostics, &window)
            .await
            .inspect_err(|e| tracing::warn!("Efficiency fetch failed for device {}: {}", device_id, e))?;

        if series.len() != diagnostics.len() {
            return Err(ApiError::Decode(format!(
                "expected {} series, got {}",
                diagnostics.len(),
                series.len()
            )));
        }
        let fuel = series.pop().unwrap_or_default();
        let odometer = series.pop().unwrap_or_default();

        let result = compute_efficiency(&odometer, &fuel, window_hours);
        if result.is_none() {
            tracing::debug!(
                "No efficiency for device {} ({} odometer, {} fuel samples)",
                device_id,
                odometer.len(),
                fuel.len()
            );
        }
        Ok(result)
    }
}
