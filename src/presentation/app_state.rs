// Application state for HTTP handlers
use crate::application::accelerometer_service::AccelerometerService;
use crate::application::efficiency_service::EfficiencyService;
use crate::application::fault_service::FaultService;
use crate::application::geofence_service::GeofenceService;
use crate::application::selection::SelectionRegistry;
use crate::application::vehicle_service::VehicleService;
use crate::infrastructure::config::LiveSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub vehicle_service: VehicleService,
    pub efficiency_service: EfficiencyService,
    pub geofence_service: GeofenceService,
    pub fault_service: FaultService,
    pub accelerometer_service: AccelerometerService,
    pub live: LiveSettings,
    pub selections: Arc<SelectionRegistry>,
}
