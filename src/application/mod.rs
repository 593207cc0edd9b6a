// Application layer - Use cases over the telemetry API
pub mod accelerometer_service;
pub mod diagnostic_resolver;
pub mod efficiency_service;
pub mod fault_service;
pub mod geofence_service;
pub mod live_feed;
pub mod selection;
pub mod telemetry_api;
pub mod vehicle_service;

#[cfg(test)]
pub mod fake_api;
