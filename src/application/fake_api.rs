// In-memory TelemetryApi for service tests
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::fault::FaultEvent;
use crate::domain::geo::Position;
use crate::domain::telemetry::{DiagnosticSeries, TelemetrySample, TimeWindow};
use crate::domain::vehicle::{Device, PathPoint, Trip, VehicleStatus};
use crate::domain::zone::Zone;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 10, minute, 0).unwrap()
}

pub fn sample(id: &str, minute: u32, data: Option<f64>) -> TelemetrySample {
    TelemetrySample::new(id, at(minute), data)
}

pub fn status(device_id: &str, position: Position, odometer: Option<f64>) -> VehicleStatus {
    VehicleStatus {
        device_id: device_id.to_string(),
        position,
        speed: Some(42.0),
        bearing: Some(90.0),
        date_time: Some(at(0)),
        is_communicating: true,
        odometer,
    }
}

#[derive(Default)]
pub struct FakeTelemetryApi {
    pub devices: Vec<Device>,
    pub statuses: HashMap<String, VehicleStatus>,
    pub series: HashMap<String, DiagnosticSeries>,
    pub failing_diagnostics: Vec<String>,
    pub fail_batches: bool,
    pub zones: Vec<Zone>,
    pub faults: Vec<FaultEvent>,
    pub fault_error: Option<ApiError>,
    pub trips: Vec<Trip>,
    pub log_records: Vec<PathPoint>,
    /// Runs inside `device_status`, before it answers
    pub status_hook: Option<Box<dyn Fn() + Send + Sync>>,
    queried: Mutex<Vec<String>>,
    batch_calls: AtomicUsize,
}

impl FakeTelemetryApi {
    pub fn with_series(mut self, diagnostic_id: &str, series: DiagnosticSeries) -> Self {
        self.series.insert(diagnostic_id.to_string(), series);
        self
    }

    pub fn failing(mut self, diagnostic_id: &str) -> Self {
        self.failing_diagnostics.push(diagnostic_id.to_string());
        self
    }

    pub fn failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.statuses.insert(status.device_id.clone(), status);
        self
    }

    /// Diagnostics requested through single `status_data` calls, in order
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, diagnostic_id: &str) -> Result<DiagnosticSeries, ApiError> {
        if self.failing_diagnostics.iter().any(|d| d == diagnostic_id) {
            return Err(ApiError::Timeout);
        }
        Ok(self.series.get(diagnostic_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TelemetryApi for FakeTelemetryApi {
    async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
        Ok(self.devices.clone())
    }

    async fn device_status(&self, device_id: &str) -> Result<Option<VehicleStatus>, ApiError> {
        if let Some(hook) = &self.status_hook {
            hook();
        }
        Ok(self.statuses.get(device_id).cloned())
    }

    async fn status_data(
        &self,
        _device_id: &str,
        diagnostic_id: &str,
        _window: &TimeWindow,
    ) -> Result<DiagnosticSeries, ApiError> {
        self.queried.lock().unwrap().push(diagnostic_id.to_string());
        self.lookup(diagnostic_id)
    }

    async fn status_data_batch(
        &self,
        _device_id: &str,
        diagnostic_ids: &[String],
        _window: &TimeWindow,
    ) -> Result<Vec<DiagnosticSeries>, ApiError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batches {
            return Err(ApiError::upstream("MultiCall rejected"));
        }
        diagnostic_ids.iter().map(|id| self.lookup(id)).collect()
    }

    async fn zones(&self) -> Result<Vec<Zone>, ApiError> {
        Ok(self.zones.clone())
    }

    async fn fault_data(&self, _device_id: &str, _window: &TimeWindow) -> Result<Vec<FaultEvent>, ApiError> {
        match &self.fault_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.faults.clone()),
        }
    }

    async fn trips(&self, _device_id: &str, _window: &TimeWindow) -> Result<Vec<Trip>, ApiError> {
        Ok(self.trips.clone())
    }

    async fn log_records(&self, _device_id: &str, _window: &TimeWindow) -> Result<Vec<PathPoint>, ApiError> {
        Ok(self.log_records.clone())
    }
}
