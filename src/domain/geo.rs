// Geospatial primitives - great-circle distance and polygon containment
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two positions using the haversine formula.
///
/// Returns meters. Symmetric in its arguments and zero for identical positions.
pub fn distance_meters(a: Position, b: Position) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points
    let c = 2.0 * h.min(1.0).sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Ray-casting containment test on the (longitude, latitude) plane.
///
/// The ring is implicitly closed. Edges use a half-open crossing rule: a point
/// on a left or bottom edge counts as inside, one on a right or top edge as
/// outside. Rings with fewer than 3 vertices never contain anything.
pub fn point_in_polygon(p: Position, ring: &[Position]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (x, y) = (p.longitude, p.latitude);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);

        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Total length of a path, summing consecutive great-circle legs
pub fn path_length_meters(points: &[Position]) -> f64 {
    points
        .windows(2)
        .map(|leg| distance_meters(leg[0], leg[1]))
        .sum()
}
