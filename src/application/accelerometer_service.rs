// Accelerometer service - tri-axis fetch with a single-axis fallback
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::accelerometer::{fuse, single_axis, AccelerometerReport, Provenance};
use crate::domain::telemetry::{DiagnosticSeries, TimeWindow};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AccelerometerDiagnostics {
    pub x: String,
    pub y: String,
    pub z: String,
    /// Single-axis diagnostics tried when the tri-axis set has no data
    pub fallback: Vec<String>,
}

#[derive(Clone)]
pub struct AccelerometerService {
    api: Arc<dyn TelemetryApi>,
    diagnostics: AccelerometerDiagnostics,
}

impl AccelerometerService {
    pub fn new(api: Arc<dyn TelemetryApi>, diagnostics: AccelerometerDiagnostics) -> Self {
        Self { api, diagnostics }
    }

    /// Fused accelerometer samples for the window.
    ///
    /// `Ok(None)` when neither the tri-axis set nor any fallback diagnostic
    /// has samples. An error is returned only when both paths failed.
    pub async fn accelerometer_report(
        &self,
        device_id: &str,
        window: &TimeWindow,
    ) -> Result<Option<AccelerometerReport>, ApiError> {
        let primary_error = match self.primary(device_id, window).await {
            Ok(Some(report)) => return Ok(Some(report)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Tri-axis accelerometer fetch failed for device {}: {}", device_id, e);
                Some(e)
            }
        };

        match self.fallback(device_id, window).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::warn!("Fallback accelerometer fetch failed for device {}: {}", device_id, e);
                match primary_error {
                    Some(primary) => Err(primary),
                    None => Ok(None),
                }
            }
        }
    }

    async fn primary(&self, device_id: &str, window: &TimeWindow) -> Result<Option<AccelerometerReport>, ApiError> {
        let ids = [
            self.diagnostics.x.clone(),
            self.diagnostics.y.clone(),
            self.diagnostics.z.clone(),
        ];
        let series = self.api.status_data_batch(device_id, &ids, window).await?;

        let [x, y, z] = <[DiagnosticSeries; 3]>::try_from(series)
            .map_err(|s| ApiError::Decode(format!("expected 3 accelerometer series, got {}", s.len())))?;
        if x.is_empty() && y.is_empty() && z.is_empty() {
            return Ok(None);
        }

        Ok(Some(AccelerometerReport::new(Provenance::TriAxis, fuse(&x, &y, &z))))
    }

    async fn fallback(&self, device_id: &str, window: &TimeWindow) -> Result<Option<AccelerometerReport>, ApiError> {
        if self.diagnostics.fallback.is_empty() {
            return Ok(None);
        }

        let series = self
            .api
            .status_data_batch(device_id, &self.diagnostics.fallback, window)
            .await?;

        // Most samples wins; ties keep the earlier diagnostic
        let best = self
            .diagnostics
            .fallback
            .iter()
            .zip(series.iter())
            .filter(|(_, s)| !s.is_empty())
            .fold(None, |best: Option<(&String, &DiagnosticSeries)>, candidate| match best {
                Some(b) if b.1.len() >= candidate.1.len() => Some(b),
                _ => Some(candidate),
            });

        let Some((diagnostic_id, samples)) = best else {
            return Ok(None);
        };

        tracing::info!(
            "Using single-axis accelerometer fallback {} for device {}",
            diagnostic_id,
            device_id
        );
        Ok(Some(AccelerometerReport::new(
            Provenance::SingleAxisFallback {
                diagnostic_id: diagnostic_id.clone(),
            },
            single_axis(samples),
        )))
    }
}
