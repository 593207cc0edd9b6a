// Vehicle, status and trip domain models
use super::geo::{path_length_meters, Position};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub serial_number: Option<String>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
}

impl Device {
    pub fn new(id: String, name: Option<String>) -> Self {
        // Unnamed devices show their id
        let name = name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| id.clone());
        Self {
            id,
            name,
            serial_number: None,
            license_plate: None,
            vin: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatus {
    pub device_id: String,
    pub position: Position,
    /// km/h
    pub speed: Option<f64>,
    pub bearing: Option<f64>,
    pub date_time: Option<DateTime<Utc>>,
    pub is_communicating: bool,
    /// Meters. Absent when the status feed does not carry it and no
    /// odometer diagnostic produced a reading.
    pub odometer: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub device_id: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub distance_km: Option<f64>,
    pub driving_seconds: Option<i64>,
    pub maximum_speed: Option<f64>,
    pub stop_point: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub date_time: DateTime<Utc>,
    pub position: Position,
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPath {
    pub device_id: String,
    pub points: Vec<PathPoint>,
    pub distance_meters: f64,
}

impl TripPath {
    /// Orders points chronologically and measures the path
    pub fn new(device_id: String, mut points: Vec<PathPoint>) -> Self {
        points.sort_by(|a, b| a.date_time.cmp(&b.date_time));
        let positions: Vec<Position> = points.iter().map(|p| p.position).collect();
        let distance_meters = path_length_meters(&positions);
        Self {
            device_id,
            points,
            distance_meters,
        }
    }
}
