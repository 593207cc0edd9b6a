// Live feed - periodic polling of the selected vehicle
use crate::application::fault_service::FaultService;
use crate::application::geofence_service::GeofenceService;
use crate::application::selection::{RequestToken, SelectionTracker};
use crate::application::telemetry_api::ApiError;
use crate::application::vehicle_service::VehicleService;
use crate::domain::fault::FaultGroup;
use crate::domain::telemetry::FuelSnapshot;
use crate::domain::vehicle::VehicleStatus;
use crate::domain::zone::{evaluate, GeofenceStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Outcome of one fetch, keeping "failed" apart from "nothing there"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum FetchState<T> {
    Ready(T),
    Empty,
    Failed(String),
}

impl<T> From<Result<Option<T>, ApiError>> for FetchState<T> {
    fn from(result: Result<Option<T>, ApiError>) -> Self {
        match result {
            Ok(Some(value)) => FetchState::Ready(value),
            Ok(None) => FetchState::Empty,
            Err(e) => FetchState::Failed(e.to_string()),
        }
    }
}

impl<T> FetchState<Vec<T>> {
    fn from_list(result: Result<Vec<T>, ApiError>) -> Self {
        FetchState::from(result.map(|items| (!items.is_empty()).then_some(items)))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    pub device_id: String,
    pub captured_at: DateTime<Utc>,
    pub status: FetchState<VehicleStatus>,
    pub fuel: FetchState<FuelSnapshot>,
    pub geofence: FetchState<GeofenceStatus>,
    pub faults: FetchState<Vec<FaultGroup>>,
}

pub struct LiveFeed {
    vehicles: VehicleService,
    geofence: GeofenceService,
    faults: FaultService,
    selection: Arc<SelectionTracker>,
    poll_interval: Duration,
    fault_days: i64,
}

impl LiveFeed {
    pub fn new(
        vehicles: VehicleService,
        geofence: GeofenceService,
        faults: FaultService,
        selection: Arc<SelectionTracker>,
        poll_interval: Duration,
        fault_days: i64,
    ) -> Self {
        Self {
            vehicles,
            geofence,
            faults,
            selection,
            poll_interval,
            fault_days,
        }
    }

    /// Fetch everything for the selected vehicle. `None` when nothing is
    /// selected or the selection changed while the fetch was in flight.
    pub async fn poll_once(&self) -> Option<VehicleSnapshot> {
        let token = self.selection.issue()?;
        let snapshot = self.fetch(&token).await;
        self.selection.accept(&token, snapshot)
    }

    async fn fetch(&self, token: &RequestToken) -> VehicleSnapshot {
        let device_id = token.vehicle_id.as_str();

        // Independent derivations, no shared state between them
        let (status, fuel, zones, faults) = tokio::join!(
            self.vehicles.current_status(device_id),
            self.vehicles.fuel_snapshot(device_id),
            self.geofence.zones(),
            self.faults.fault_summary(device_id, self.fault_days),
        );

        let geofence = match (&status, &zones) {
            (Ok(Some(current)), Ok(zones)) => FetchState::Ready(evaluate(current.position, zones)),
            (Ok(None), _) => FetchState::Empty,
            (Err(e), _) | (_, Err(e)) => FetchState::Failed(e.to_string()),
        };

        VehicleSnapshot {
            device_id: device_id.to_string(),
            captured_at: Utc::now(),
            status: status.into(),
            fuel: fuel.into(),
            geofence,
            faults: FetchState::from_list(faults),
        }
    }

    /// Poll on a fixed interval until the receiver is dropped or the
    /// selection is cleared
    pub fn spawn(self: Arc<Self>) -> mpsc::Receiver<VehicleSnapshot> {
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tx.is_closed() || self.selection.issue().is_none() {
                    break;
                }

                if let Some(snapshot) = self.poll_once().await {
                    if tx.send(snapshot).await.is_err() {
                        break;
                    }
                }
            }

            self.selection.clear();
            tracing::debug!("Live feed stopped");
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostic_resolver::FuelMarkers;
    use crate::application::fake_api::{sample, status, FakeTelemetryApi};
    use crate::application::selection::SelectionRegistry;
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::application::telemetry_api::TelemetryApi;
    use crate::application::vehicle_service::StatusDiagnostics;
    use crate::domain::geo::Position;

    fn feed(api: Arc<dyn TelemetryApi>, selection: Arc<SelectionTracker>) -> LiveFeed {
        let diagnostics = StatusDiagnostics {
            odometer: vec!["Odo".to_string()],
            fuel: vec!["DiagnosticFuelLevelId".to_string()],
            fuel_markers: FuelMarkers {
                total: vec!["TotalFuel".to_string()],
                level: vec!["FuelLevel".to_string()],
            },
        };
        LiveFeed::new(
            VehicleService::new(api.clone(), diagnostics),
            GeofenceService::new(api.clone()),
            FaultService::new(api),
            selection,
            Duration::from_millis(10),
            7,
        )
    }

    #[tokio::test]
    async fn test_nothing_selected() {
        let live = feed(Arc::new(FakeTelemetryApi::default()), Arc::new(SelectionTracker::default()));
        assert!(live.poll_once().await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_states() {
        let api = FakeTelemetryApi::default()
            .with_status(status("b1", Position::new(1.0, 1.0), Some(1000.0)))
            .with_series("DiagnosticFuelLevelId", vec![sample("l", 1, Some(40.0))]);
        let selection = Arc::new(SelectionTracker::default());
        selection.select("b1");

        let snapshot = feed(Arc::new(api), selection).poll_once().await.unwrap();
        assert_eq!(snapshot.device_id, "b1");
        assert!(matches!(snapshot.status, FetchState::Ready(ref s) if s.odometer == Some(1000.0)));
        assert!(matches!(snapshot.fuel, FetchState::Ready(ref f) if f.fuel_level == Some(40.0)));
        assert_eq!(snapshot.geofence, FetchState::Ready(GeofenceStatus::NoZonesConfigured));
        assert_eq!(snapshot.faults, FetchState::Empty);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_reported() {
        let mut api = FakeTelemetryApi::default();
        api.fault_error = Some(ApiError::Timeout);
        let selection = Arc::new(SelectionTracker::default());
        selection.select("b1");

        let snapshot = feed(Arc::new(api), selection).poll_once().await.unwrap();
        assert_eq!(snapshot.status, FetchState::Empty);
        assert_eq!(snapshot.geofence, FetchState::Empty);
        assert_eq!(snapshot.faults, FetchState::Failed("Request timed out".to_string()));
    }

    #[tokio::test]
    async fn test_switch_during_fetch_discards_snapshot() {
        let selection = Arc::new(SelectionTracker::default());
        selection.select("b1");

        let switcher = selection.clone();
        let mut api = FakeTelemetryApi::default().with_status(status("b1", Position::new(0.0, 0.0), Some(1.0)));
        api.status_hook = Some(Box::new(move || {
            switcher.select("b2");
        }));

        let live = feed(Arc::new(api), selection.clone());
        assert!(live.poll_once().await.is_none());
        assert_eq!(selection.issue().unwrap().vehicle_id, "b2");
    }

    #[tokio::test]
    async fn test_spawned_feed_emits_snapshots() {
        let api = FakeTelemetryApi::default().with_status(status("b1", Position::new(0.0, 0.0), Some(1.0)));
        let selection = Arc::new(SelectionTracker::default());
        selection.select("b1");

        let mut rx = Arc::new(feed(Arc::new(api), selection)).spawn();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.device_id, "b1");
    }

    #[tokio::test]
    async fn test_dropped_receiver_clears_selection() {
        let selection = Arc::new(SelectionTracker::default());
        selection.select("b1");

        let rx = Arc::new(feed(Arc::new(FakeTelemetryApi::default()), selection.clone())).spawn();
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), async {
            while selection.issue().is_some() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_retarget_mid_fetch_drops_old_vehicle() {
        let registry = Arc::new(SelectionRegistry::default());
        let selection = registry.attach("c1", "b1");

        let switcher = registry.clone();
        let switched = AtomicBool::new(false);
        let mut api = FakeTelemetryApi::default().with_status(status("b1", Position::new(0.0, 0.0), Some(1.0)));
        api.status_hook = Some(Box::new(move || {
            if !switched.swap(true, Ordering::SeqCst) {
                switcher.retarget("c1", "b2");
            }
        }));

        let live = feed(Arc::new(api), selection);
        assert!(live.poll_once().await.is_none());

        let snapshot = live.poll_once().await.unwrap();
        assert_eq!(snapshot.device_id, "b2");
    }

    #[tokio::test]
    async fn test_replaced_feed_stops() {
        let registry = SelectionRegistry::default();
        let selection = registry.attach("c1", "b1");

        let mut rx = Arc::new(feed(Arc::new(FakeTelemetryApi::default()), selection)).spawn();
        registry.attach("c1", "b2");

        let finished = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(finished.is_ok());
    }
}
