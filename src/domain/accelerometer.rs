// Accelerometer fusion and G-force derivation
use super::telemetry::{DiagnosticSeries, TelemetrySample};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const STANDARD_GRAVITY: f64 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccelerometerSample {
    pub date_time: DateTime<Utc>,
    /// m/s²
    pub acceleration_x: f64,
    pub acceleration_y: f64,
    pub acceleration_z: f64,
}

impl AccelerometerSample {
    fn empty(date_time: DateTime<Utc>) -> Self {
        Self {
            date_time,
            acceleration_x: 0.0,
            acceleration_y: 0.0,
            acceleration_z: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GForceSample {
    pub date_time: DateTime<Utc>,
    pub g_force_x: f64,
    pub g_force_y: f64,
    pub g_force_z: f64,
    pub total_g_force: f64,
}

impl GForceSample {
    /// Copy rounded to 3 decimals for display
    pub fn rounded(&self) -> Self {
        Self {
            date_time: self.date_time,
            g_force_x: round3(self.g_force_x),
            g_force_y: round3(self.g_force_y),
            g_force_z: round3(self.g_force_z),
            total_g_force: round3(self.total_g_force),
        }
    }
}

/// Where the fused samples came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Provenance {
    TriAxis,
    /// A single diagnostic mapped onto X with Y and Z zeroed
    #[serde(rename_all = "camelCase")]
    SingleAxisFallback { diagnostic_id: String },
}

impl Provenance {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Provenance::SingleAxisFallback { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GForceStats {
    pub max_total: f64,
    pub min_total: f64,
    pub mean_total: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccelerometerReport {
    pub provenance: Provenance,
    pub samples: Vec<AccelerometerSample>,
    /// Rounded for display
    pub g_force: Vec<GForceSample>,
    /// Computed from unrounded values
    pub stats: Option<GForceStats>,
}

impl AccelerometerReport {
    pub fn new(provenance: Provenance, samples: Vec<AccelerometerSample>) -> Self {
        let full: Vec<GForceSample> = samples.iter().map(to_g_force).collect();
        let stats = g_force_stats(&full);
        Self {
            provenance,
            samples,
            g_force: full.iter().map(GForceSample::rounded).collect(),
            stats,
        }
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
    Z,
}

/// Merge three single-axis series into tri-axis samples.
///
/// Samples only combine when their timestamps are the same instant (parsed,
/// so `...00Z` and `...00.000Z` match); axes with no reading at a timestamp
/// stay at 0. Output is ascending by time.
pub fn fuse(
    x_series: &DiagnosticSeries,
    y_series: &DiagnosticSeries,
    z_series: &DiagnosticSeries,
) -> Vec<AccelerometerSample> {
    let mut merged: BTreeMap<DateTime<Utc>, AccelerometerSample> = BTreeMap::new();

    for (series, axis) in [(x_series, Axis::X), (y_series, Axis::Y), (z_series, Axis::Z)] {
        for sample in series {
            let entry = merged
                .entry(sample.date_time)
                .or_insert_with(|| AccelerometerSample::empty(sample.date_time));
            let value = sample.data.unwrap_or(0.0);
            match axis {
                Axis::X => entry.acceleration_x = value,
                Axis::Y => entry.acceleration_y = value,
                Axis::Z => entry.acceleration_z = value,
            }
        }
    }

    merged.into_values().collect()
}

/// Degraded path: one series becomes the X axis
pub fn single_axis(series: &[TelemetrySample]) -> Vec<AccelerometerSample> {
    let mut samples: Vec<AccelerometerSample> = series
        .iter()
        .map(|s| AccelerometerSample {
            acceleration_x: s.data.unwrap_or(0.0),
            ..AccelerometerSample::empty(s.date_time)
        })
        .collect();
    samples.sort_by(|a, b| a.date_time.cmp(&b.date_time));
    samples
}

pub fn to_g_force(sample: &AccelerometerSample) -> GForceSample {
    let gx = sample.acceleration_x / STANDARD_GRAVITY;
    let gy = sample.acceleration_y / STANDARD_GRAVITY;
    let gz = sample.acceleration_z / STANDARD_GRAVITY;
    GForceSample {
        date_time: sample.date_time,
        g_force_x: gx,
        g_force_y: gy,
        g_force_z: gz,
        total_g_force: (gx * gx + gy * gy + gz * gz).sqrt(),
    }
}

pub fn g_force_stats(samples: &[GForceSample]) -> Option<GForceStats> {
    if samples.is_empty() {
        return None;
    }

    let totals = samples.iter().map(|s| s.total_g_force);
    let max_total = totals.clone().fold(f64::NEG_INFINITY, f64::max);
    let min_total = totals.clone().fold(f64::INFINITY, f64::min);
    let mean_total = totals.sum::<f64>() / samples.len() as f64;

    Some(GForceStats {
        max_total,
        min_total,
        mean_total,
        sample_count: samples.len(),
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
