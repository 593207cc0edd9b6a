// Wire shapes of the upstream API and their mapping to domain types
use crate::domain::fault::{DiagnosticRef, FaultEvent, FaultLamps, FaultState};
use crate::domain::geo::Position;
use crate::domain::telemetry::TelemetrySample;
use crate::domain::vehicle::{Device, PathPoint, Trip, VehicleStatus};
use crate::domain::zone::{Zone, ZoneGeometry};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Entity references come back either as a bare id string or an object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireRef {
    Id(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        code: Option<i64>,
    },
}

impl WireRef {
    fn id(&self) -> Option<&str> {
        match self {
            WireRef::Id(id) => Some(id.as_str()),
            WireRef::Object { id, .. } => id.as_deref(),
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            WireRef::Id(_) => None,
            WireRef::Object { name, .. } => name.as_deref(),
        }
    }

    fn code(&self) -> Option<i64> {
        match self {
            WireRef::Id(_) => None,
            WireRef::Object { code, .. } => *code,
        }
    }
}

/// Zone vertices and centers: x is longitude, y is latitude
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

impl From<WirePoint> for Position {
    fn from(p: WirePoint) -> Self {
        Position::new(p.y, p.x)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireColor {
    Rgba { r: u8, g: u8, b: u8 },
    Css(String),
}

impl WireColor {
    fn to_css(&self) -> String {
        match self {
            WireColor::Rgba { r, g, b } => format!("#{:02x}{:02x}{:02x}", r, g, b),
            WireColor::Css(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStatusData {
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub data: Option<f64>,
    #[serde(default)]
    pub diagnostic: Option<WireRef>,
}

impl WireStatusData {
    /// Tagged with the diagnostic it was requested for
    pub fn into_sample(self, requested_diagnostic: &str) -> TelemetrySample {
        let diagnostic_id = self
            .diagnostic
            .as_ref()
            .and_then(WireRef::id)
            .unwrap_or(requested_diagnostic);
        TelemetrySample::new(diagnostic_id, self.date_time, self.data)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub vehicle_identification_number: Option<String>,
}

impl From<WireDevice> for Device {
    fn from(w: WireDevice) -> Self {
        Device {
            serial_number: w.serial_number.filter(|s| !s.is_empty()),
            license_plate: w.license_plate.filter(|s| !s.is_empty()),
            vin: w.vehicle_identification_number.filter(|s| !s.is_empty()),
            ..Device::new(w.id, w.name)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDeviceStatusInfo {
    #[serde(default)]
    pub device: Option<WireRef>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub bearing: Option<f64>,
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_device_communicating: Option<bool>,
    #[serde(default)]
    pub odometer: Option<f64>,
}

impl WireDeviceStatusInfo {
    /// `None` without a usable position
    pub fn into_status(self, requested_device: &str) -> Option<VehicleStatus> {
        let position = Position::new(self.latitude?, self.longitude?);
        let device_id = self
            .device
            .as_ref()
            .and_then(WireRef::id)
            .unwrap_or(requested_device)
            .to_string();

        Some(VehicleStatus {
            device_id,
            position,
            speed: self.speed,
            bearing: self.bearing,
            date_time: self.date_time,
            is_communicating: self.is_device_communicating.unwrap_or(false),
            odometer: self.odometer,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireZone {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// "polygon" or "circle"; inferred from the fields present when absent
    #[serde(default, alias = "geometryType")]
    pub shape: Option<String>,
    #[serde(default)]
    pub points: Option<Vec<WirePoint>>,
    #[serde(default)]
    pub center: Option<WirePoint>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub fill_color: Option<WireColor>,
}

impl From<WireZone> for Zone {
    fn from(w: WireZone) -> Self {
        let is_circle = match w.shape.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("circle") => true,
            Some(_) => false,
            None => w.points.is_none() && (w.center.is_some() || w.radius.is_some()),
        };

        let geometry = if is_circle {
            ZoneGeometry::Circle {
                center: w.center.map(Position::from),
                radius: w.radius,
            }
        } else {
            ZoneGeometry::Polygon {
                points: w.points.map(|ps| ps.into_iter().map(Position::from).collect()),
            }
        };

        Zone {
            name: w.name.unwrap_or_else(|| w.id.clone()),
            id: w.id,
            color: w.fill_color.as_ref().map(WireColor::to_css),
            geometry,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFaultData {
    pub id: String,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub fault_state: Option<String>,
    #[serde(default)]
    pub diagnostic: Option<WireRef>,
    #[serde(default)]
    pub controller: Option<WireRef>,
    #[serde(default)]
    pub failure_mode: Option<WireRef>,
    #[serde(default)]
    pub source_address: Option<i64>,
    #[serde(default)]
    pub dismiss_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dismiss_user: Option<WireRef>,
    #[serde(default)]
    pub amber_warning_lamp: Option<bool>,
    #[serde(default)]
    pub red_stop_lamp: Option<bool>,
    #[serde(default)]
    pub protect_warning_lamp: Option<bool>,
}

impl From<WireFaultData> for FaultEvent {
    fn from(w: WireFaultData) -> Self {
        // Anything other than an explicit "Active" counts as inactive
        let fault_state = match w.fault_state.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("active") => FaultState::Active,
            _ => FaultState::Inactive,
        };

        let diagnostic = w.diagnostic.as_ref().map(|d| DiagnosticRef {
            id: d.id().map(str::to_string),
            name: d.name().map(str::to_string),
            code: d.code(),
        });

        FaultEvent {
            id: w.id,
            date_time: w.date_time,
            fault_state,
            spn: diagnostic.as_ref().and_then(|d| d.code),
            fmi: w.failure_mode.as_ref().and_then(WireRef::code),
            diagnostic,
            source_address: w.source_address,
            controller: w.controller.as_ref().and_then(|c| c.name().or(c.id()).map(str::to_string)),
            failure_mode: w.failure_mode.as_ref().and_then(|f| f.name().or(f.id()).map(str::to_string)),
            dismiss_date_time: w.dismiss_date_time,
            dismiss_user: w.dismiss_user.as_ref().and_then(|u| u.name().or(u.id()).map(str::to_string)),
            lamps: FaultLamps {
                amber: w.amber_warning_lamp.unwrap_or(false),
                red_stop: w.red_stop_lamp.unwrap_or(false),
                protect: w.protect_warning_lamp.unwrap_or(false),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrip {
    pub id: String,
    #[serde(default)]
    pub device: Option<WireRef>,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub driving_duration: Option<String>,
    #[serde(default)]
    pub maximum_speed: Option<f64>,
    #[serde(default)]
    pub stop_point: Option<WirePoint>,
}

impl WireTrip {
    pub fn into_trip(self, requested_device: &str) -> Trip {
        Trip {
            device_id: self
                .device
                .as_ref()
                .and_then(WireRef::id)
                .unwrap_or(requested_device)
                .to_string(),
            id: self.id,
            start: self.start,
            stop: self.stop,
            distance_km: self.distance,
            driving_seconds: self.driving_duration.as_deref().and_then(parse_timespan),
            maximum_speed: self.maximum_speed,
            stop_point: self.stop_point.map(Position::from),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLogRecord {
    pub date_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl From<WireLogRecord> for PathPoint {
    fn from(w: WireLogRecord) -> Self {
        PathPoint {
            date_time: w.date_time,
            position: Position::new(w.latitude, w.longitude),
            speed: w.speed,
        }
    }
}

/// Parse a .NET style timespan (`[d.]hh:mm:ss[.fffffff]`) into whole seconds
pub fn parse_timespan(value: &str) -> Option<i64> {
    let (days, clock) = match value.split_once('.') {
        Some((d, rest)) if !d.contains(':') => (d.parse::<i64>().ok()?, rest),
        _ => (0, value),
    };

    let mut parts = clock.splitn(3, ':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds = parts.next()?;
    let seconds: i64 = seconds.split('.').next()?.parse().ok()?;

    Some(((days * 24 + hours) * 60 + minutes) * 60 + seconds)
}
