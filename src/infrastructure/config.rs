use crate::application::accelerometer_service::AccelerometerDiagnostics;
use crate::application::diagnostic_resolver::FuelMarkers;
use crate::application::vehicle_service::StatusDiagnostics;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub live: LiveSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Host name such as `my.geotab.com`, or a full base URL
    pub server: String,
    pub database: String,
    pub user_name: String,
    pub password: Option<String>,
    /// Pre-issued session; skips authentication when present
    pub session_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    pub bind: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveSettings {
    pub poll_interval_secs: u64,
    pub fault_days: i64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            fault_days: 7,
        }
    }
}

impl LiveSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Candidate diagnostic ids, in priority order where order matters
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub odometer: Vec<String>,
    pub fuel: Vec<String>,
    pub total_fuel_markers: Vec<String>,
    pub fuel_level_markers: Vec<String>,
    pub efficiency_odometer: String,
    pub efficiency_fuel: String,
    pub accelerometer_x: String,
    pub accelerometer_y: String,
    pub accelerometer_z: String,
    pub accelerometer_fallback: Vec<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            odometer: strings(&[
                "DiagnosticOdometerAdjustmentId",
                "DiagnosticOdometerId",
                "DiagnosticRawOdometerId",
            ]),
            fuel: strings(&[
                "DiagnosticDeviceTotalFuelId",
                "DiagnosticTotalFuelUsedId",
                "DiagnosticFuelLevelId",
            ]),
            total_fuel_markers: strings(&["TotalFuel", "FuelUsed"]),
            fuel_level_markers: strings(&["FuelLevel"]),
            efficiency_odometer: "DiagnosticOdometerAdjustmentId".to_string(),
            efficiency_fuel: "DiagnosticDeviceTotalFuelId".to_string(),
            accelerometer_x: "DiagnosticAccelerationForwardBrakingId".to_string(),
            accelerometer_y: "DiagnosticAccelerationSideToSideId".to_string(),
            accelerometer_z: "DiagnosticAccelerationUpDownId".to_string(),
            accelerometer_fallback: strings(&[
                "DiagnosticAccelerometerForwardBrakingId",
                "DiagnosticHarshAccelerationId",
                "DiagnosticHarshBrakingId",
            ]),
        }
    }
}

impl DiagnosticsConfig {
    pub fn status_diagnostics(&self) -> StatusDiagnostics {
        StatusDiagnostics {
            odometer: self.odometer.clone(),
            fuel: self.fuel.clone(),
            fuel_markers: FuelMarkers {
                total: self.total_fuel_markers.clone(),
                level: self.fuel_level_markers.clone(),
            },
        }
    }

    pub fn accelerometer_diagnostics(&self) -> AccelerometerDiagnostics {
        AccelerometerDiagnostics {
            x: self.accelerometer_x.clone(),
            y: self.accelerometer_y.clone(),
            z: self.accelerometer_z.clone(),
            fallback: self.accelerometer_fallback.clone(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/fleet"))
        .add_source(config::Environment::with_prefix("FLEET").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_diagnostics_config() -> anyhow::Result<DiagnosticsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/diagnostics").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}
