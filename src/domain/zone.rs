// Geofence zones and containment evaluation
use super::geo::{distance_meters, point_in_polygon, Position};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "geometryType", rename_all = "camelCase")]
pub enum ZoneGeometry {
    /// Implicitly closed ring; `None` when the upstream zone carried no points
    Polygon { points: Option<Vec<Position>> },
    /// Radius in meters
    Circle {
        center: Option<Position>,
        radius: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    #[serde(flatten)]
    pub geometry: ZoneGeometry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "zoneName", rename_all = "camelCase")]
pub enum GeofenceStatus {
    Inside(String),
    Outside,
    NoZonesConfigured,
}

impl Zone {
    /// Containment test for this zone. `None` means the zone lacks the
    /// geometry its type requires and cannot be evaluated.
    pub fn contains(&self, position: Position) -> Option<bool> {
        match &self.geometry {
            ZoneGeometry::Polygon { points } => {
                let ring = points.as_ref()?;
                if ring.len() < 3 {
                    return None;
                }
                Some(point_in_polygon(position, ring))
            }
            ZoneGeometry::Circle { center, radius } => {
                let (center, radius) = ((*center)?, (*radius)?);
                Some(distance_meters(position, center) <= radius)
            }
        }
    }
}

/// Find the zone containing `position`.
///
/// Zones are tried in input order and the first match wins. Zones missing
/// their geometry are skipped.
pub fn evaluate(position: Position, zones: &[Zone]) -> GeofenceStatus {
    if zones.is_empty() {
        return GeofenceStatus::NoZonesConfigured;
    }

    for zone in zones {
        match zone.contains(position) {
            Some(true) => return GeofenceStatus::Inside(zone.name.clone()),
            Some(false) => {}
            None => {
                tracing::debug!("Skipping zone {} - incomplete geometry", zone.id);
            }
        }
    }

    GeofenceStatus::Outside
}
