// TelemetryApi implementation over the JSON-RPC client
use crate::application::telemetry_api::{ApiError, TelemetryApi};
use crate::domain::fault::FaultEvent;
use crate::domain::telemetry::{DiagnosticSeries, TimeWindow};
use crate::domain::vehicle::{Device, PathPoint, Trip, VehicleStatus};
use crate::domain::zone::Zone;
use crate::infrastructure::rpc_client::{JsonRpcClient, RpcCall};
use crate::infrastructure::wire::{
    WireDevice, WireDeviceStatusInfo, WireFaultData, WireLogRecord, WireStatusData, WireTrip, WireZone,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub struct RpcTelemetryApi {
    client: JsonRpcClient,
}

impl RpcTelemetryApi {
    pub fn new(client: JsonRpcClient) -> Self {
        Self { client }
    }

    async fn get_list<T: DeserializeOwned>(&self, type_name: &str, search: Value) -> Result<Vec<T>, ApiError> {
        let result = self.client.get(type_name, search).await?;
        decode_list(type_name, result)
    }
}

fn decode_list<T: DeserializeOwned>(type_name: &str, value: Value) -> Result<Vec<T>, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{}: {}", type_name, e)))
}

fn status_data_search(device_id: &str, diagnostic_id: &str, window: &TimeWindow) -> Value {
    json!({
        "deviceSearch": { "id": device_id },
        "diagnosticSearch": { "id": diagnostic_id },
        "fromDate": window.from.to_rfc3339(),
        "toDate": window.to.to_rfc3339(),
    })
}

fn device_window_search(device_id: &str, window: &TimeWindow) -> Value {
    json!({
        "deviceSearch": { "id": device_id },
        "fromDate": window.from.to_rfc3339(),
        "toDate": window.to.to_rfc3339(),
    })
}

fn into_series(diagnostic_id: &str, records: Vec<WireStatusData>) -> DiagnosticSeries {
    records.into_iter().map(|r| r.into_sample(diagnostic_id)).collect()
}

#[async_trait]
impl TelemetryApi for RpcTelemetryApi {
    async fn list_devices(&self) -> Result<Vec<Device>, ApiError> {
        let devices: Vec<WireDevice> = self.get_list("Device", json!({})).await?;
        Ok(devices.into_iter().map(Device::from).collect())
    }

    async fn device_status(&self, device_id: &str) -> Result<Option<VehicleStatus>, ApiError> {
        let infos: Vec<WireDeviceStatusInfo> = self
            .get_list("DeviceStatusInfo", json!({ "deviceSearch": { "id": device_id } }))
            .await?;

        Ok(infos.into_iter().find_map(|info| info.into_status(device_id)))
    }

    async fn status_data(
        &self,
        device_id: &str,
        diagnostic_id: &str,
        window: &TimeWindow,
    ) -> Result<DiagnosticSeries, ApiError> {
        let records: Vec<WireStatusData> = self
            .get_list("StatusData", status_data_search(device_id, diagnostic_id, window))
            .await?;

        tracing::debug!(
            "StatusData {} for device {}: {} samples",
            diagnostic_id,
            device_id,
            records.len()
        );
        Ok(into_series(diagnostic_id, records))
    }

    async fn status_data_batch(
        &self,
        device_id: &str,
        diagnostic_ids: &[String],
        window: &TimeWindow,
    ) -> Result<Vec<DiagnosticSeries>, ApiError> {
        let calls = diagnostic_ids
            .iter()
            .map(|id| RpcCall::get("StatusData", status_data_search(device_id, id, window)))
            .collect();

        let results = self.client.multi_call(calls).await?;

        diagnostic_ids
            .iter()
            .zip(results)
            .map(|(id, value)| -> Result<DiagnosticSeries, ApiError> {
                let records: Vec<WireStatusData> = decode_list("StatusData", value)?;
                Ok(into_series(id, records))
            })
            .collect()
    }

    async fn zones(&self) -> Result<Vec<Zone>, ApiError> {
        let zones: Vec<WireZone> = self.get_list("Zone", json!({})).await?;
        Ok(zones.into_iter().map(Zone::from).collect())
    }

    async fn fault_data(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<FaultEvent>, ApiError> {
        let faults: Vec<WireFaultData> = self
            .get_list("FaultData", device_window_search(device_id, window))
            .await?;
        Ok(faults.into_iter().map(FaultEvent::from).collect())
    }

    async fn trips(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<Trip>, ApiError> {
        let trips: Vec<WireTrip> = self.get_list("Trip", device_window_search(device_id, window)).await?;
        Ok(trips.into_iter().map(|t| t.into_trip(device_id)).collect())
    }

    async fn log_records(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<PathPoint>, ApiError> {
        let records: Vec<WireLogRecord> = self
            .get_list("LogRecord", device_window_search(device_id, window))
            .await?;
        Ok(records.into_iter().map(PathPoint::from).collect())
    }
}
