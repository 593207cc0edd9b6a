// Diagnostic resolver - first non-null reading across ranked candidate diagnostics
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::telemetry::{latest_reading, FuelSnapshot, TelemetrySample, TimeWindow};
use std::sync::Arc;

/// Substrings that decide which fuel slot a diagnostic fills
#[derive(Debug, Clone)]
pub struct FuelMarkers {
    pub total: Vec<String>,
    pub level: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FuelSlot {
    Total,
    Level,
}

impl FuelMarkers {
    fn classify(&self, diagnostic_id: &str) -> Option<FuelSlot> {
        if self.total.iter().any(|m| diagnostic_id.contains(m.as_str())) {
            Some(FuelSlot::Total)
        } else if self.level.iter().any(|m| diagnostic_id.contains(m.as_str())) {
            Some(FuelSlot::Level)
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct DiagnosticResolver {
    api: Arc<dyn TelemetryApi>,
}

impl DiagnosticResolver {
    pub fn new(api: Arc<dyn TelemetryApi>) -> Self {
        Self { api }
    }

    /// Latest non-null value from the first candidate that has one.
    ///
    /// Candidates are queried one at a time in priority order and the loop
    /// stops at the first hit. A failed candidate is logged and skipped; an
    /// error is returned only when every candidate failed.
    pub async fn resolve_latest_reading(
        &self,
        device_id: &str,
        candidates: &[String],
        window: &TimeWindow,
    ) -> Result<Option<f64>, ApiError> {
        let sample = self.resolve_latest_sample(device_id, candidates, window).await?;
        Ok(sample.and_then(|s| s.data))
    }

    pub async fn resolve_latest_sample(
        &self,
        device_id: &str,
        candidates: &[String],
        window: &TimeWindow,
    ) -> Result<Option<TelemetrySample>, ApiError> {
        let mut outcome = CandidateOutcome::default();

        for diagnostic_id in candidates {
            let Some(sample) = self.latest_for(device_id, diagnostic_id, window, &mut outcome).await else {
                continue;
            };
            tracing::debug!(
                "Resolved {} for device {} from {}",
                sample.data.unwrap_or_default(),
                device_id,
                diagnostic_id
            );
            return Ok(Some(sample));
        }

        outcome.finish(None)
    }

    /// Fill the total-fuel and fuel-level slots from ranked candidates.
    ///
    /// Each candidate is routed to a slot by substring match on its id. The
    /// first reading for a slot wins; candidates for a filled slot are not
    /// queried.
    pub async fn resolve_fuel(
        &self,
        device_id: &str,
        candidates: &[String],
        markers: &FuelMarkers,
        window: &TimeWindow,
    ) -> Result<FuelSnapshot, ApiError> {
        let mut snapshot = FuelSnapshot::default();
        let mut outcome = CandidateOutcome::default();

        for diagnostic_id in candidates {
            if snapshot.is_complete() {
                break;
            }

            let Some(slot) = markers.classify(diagnostic_id) else {
                tracing::warn!("Fuel diagnostic {} matches no slot, skipping", diagnostic_id);
                continue;
            };
            let filled = match slot {
                FuelSlot::Total => snapshot.total_fuel.is_some(),
                FuelSlot::Level => snapshot.fuel_level.is_some(),
            };
            if filled {
                continue;
            }

            if let Some(sample) = self.latest_for(device_id, diagnostic_id, window, &mut outcome).await {
                match slot {
                    FuelSlot::Total => snapshot.total_fuel = sample.data,
                    FuelSlot::Level => snapshot.fuel_level = sample.data,
                }
                snapshot.touch(sample.date_time);
            }
        }

        outcome.finish(snapshot)
    }

    async fn latest_for(
        &self,
        device_id: &str,
        diagnostic_id: &str,
        window: &TimeWindow,
        outcome: &mut CandidateOutcome,
    ) -> Option<TelemetrySample> {
        match self.api.status_data(device_id, diagnostic_id, window).await {
            Ok(series) => {
                outcome.succeeded = true;
                latest_reading(&series).cloned()
            }
            Err(e) => {
                tracing::warn!(
                    "Diagnostic {} failed for device {}: {}",
                    diagnostic_id,
                    device_id,
                    e
                );
                outcome.last_error = Some(e);
                None
            }
        }
    }
}

/// Tracks whether any candidate query got through
#[derive(Default)]
struct CandidateOutcome {
    succeeded: bool,
    last_error: Option<ApiError>,
}

impl CandidateOutcome {
    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        match (self.succeeded, self.last_error) {
            (false, Some(e)) => Err(e),
            _ => Ok(value),
        }
    }
}
