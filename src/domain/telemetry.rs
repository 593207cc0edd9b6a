// Telemetry sample domain models and fuel derivations
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Longest trailing window a caller can ask for (ten years)
pub const MAX_TRAILING_HOURS: i64 = 24 * 3653;

/// Half-open query window `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn trailing_hours(hours: i64) -> Self {
        Self::trailing_hours_from(Utc::now(), hours)
    }

    /// `hours` is clamped to `0..=MAX_TRAILING_HOURS`
    pub fn trailing_hours_from(to: DateTime<Utc>, hours: i64) -> Self {
        let span = Duration::hours(hours.clamp(0, MAX_TRAILING_HOURS));
        Self {
            from: to.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC),
            to,
        }
    }

    pub fn trailing_days(days: i64) -> Self {
        Self::trailing_hours(days.saturating_mul(24))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub diagnostic_id: String,
    pub date_time: DateTime<Utc>,
    pub data: Option<f64>,
}

impl TelemetrySample {
    pub fn new(diagnostic_id: impl Into<String>, date_time: DateTime<Utc>, data: Option<f64>) -> Self {
        Self {
            diagnostic_id: diagnostic_id.into(),
            date_time,
            data,
        }
    }
}

/// Samples for one diagnostic over a window. Upstream order is not trusted.
pub type DiagnosticSeries = Vec<TelemetrySample>;

/// Most recent sample that actually carries a value
pub fn latest_reading(series: &DiagnosticSeries) -> Option<&TelemetrySample> {
    series
        .iter()
        .filter(|s| s.data.is_some())
        .rev()
        .max_by(|a, b| a.date_time.cmp(&b.date_time))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FuelLevelUnit {
    Percent,
    Liters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSnapshot {
    /// Liters
    pub total_fuel: Option<f64>,
    pub fuel_level: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl FuelSnapshot {
    pub fn is_empty(&self) -> bool {
        self.total_fuel.is_none() && self.fuel_level.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.total_fuel.is_some() && self.fuel_level.is_some()
    }

    /// Levels up to 100 are read as a percentage, anything above as liters
    pub fn level_unit(&self) -> Option<FuelLevelUnit> {
        self.fuel_level.map(|level| {
            if level <= 100.0 {
                FuelLevelUnit::Percent
            } else {
                FuelLevelUnit::Liters
            }
        })
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_updated = Some(self.last_updated.map_or(at, |prev| prev.max(at)));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyResult {
    #[serde(rename = "efficiencyLper100km")]
    pub efficiency_l_per_100km: f64,
    pub distance_km: f64,
    pub fuel_used_liters: f64,
    pub period_hours: i64,
}

/// Fuel consumption over a window from odometer (meters) and total fuel
/// (liters) series.
///
/// Samples without data are ignored. Returns `None` when either series is
/// empty or the vehicle did not move forward.
pub fn compute_efficiency(
    odometer: &DiagnosticSeries,
    fuel: &DiagnosticSeries,
    period_hours: i64,
) -> Option<EfficiencyResult> {
    let (odo_first, odo_last) = value_span(odometer)?;
    let (fuel_first, fuel_last) = value_span(fuel)?;

    let distance_km = (odo_last - odo_first) / 1000.0;
    if distance_km <= 0.0 {
        return None;
    }

    let fuel_used_liters = fuel_last - fuel_first;

    Some(EfficiencyResult {
        efficiency_l_per_100km: fuel_used_liters / distance_km * 100.0,
        distance_km,
        fuel_used_liters,
        period_hours,
    })
}

/// First and last values in chronological order
fn value_span(series: &DiagnosticSeries) -> Option<(f64, f64)> {
    let mut values: Vec<(DateTime<Utc>, f64)> = series
        .iter()
        .filter_map(|s| s.data.map(|v| (s.date_time, v)))
        .collect();
    values.sort_by(|a, b| a.0.cmp(&b.0));

    let first = values.first()?.1;
    let last = values.last()?.1;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn sample(id: &str, hour: u32, data: Option<f64>) -> TelemetrySample {
        TelemetrySample::new(id, at(hour), data)
    }

    #[test]
    fn test_efficiency_ten_km_one_liter() {
        let odometer = vec![sample("odo", 1, Some(1000.0)), sample("odo", 2, Some(11000.0))];
        let fuel = vec![sample("fuel", 1, Some(5.0)), sample("fuel", 2, Some(6.0))];

        let result = compute_efficiency(&odometer, &fuel, 24).unwrap();
        assert_eq!(result.distance_km, 10.0);
        assert_eq!(result.fuel_used_liters, 1.0);
        assert_eq!(result.efficiency_l_per_100km, 10.0);
        assert_eq!(result.period_hours, 24);
    }

    #[test]
    fn test_efficiency_sorts_unordered_input() {
        let odometer = vec![sample("odo", 3, Some(21000.0)), sample("odo", 1, Some(1000.0))];
        let fuel = vec![sample("fuel", 3, Some(7.0)), sample("fuel", 1, Some(5.0))];

        let result = compute_efficiency(&odometer, &fuel, 6).unwrap();
        assert_eq!(result.distance_km, 20.0);
        assert_eq!(result.efficiency_l_per_100km, 10.0);
    }

    #[test]
    fn test_stationary_vehicle_has_no_efficiency() {
        let odometer = vec![sample("odo", 1, Some(5000.0)), sample("odo", 2, Some(5000.0))];
        let fuel = vec![sample("fuel", 1, Some(5.0)), sample("fuel", 2, Some(50.0))];
        assert!(compute_efficiency(&odometer, &fuel, 24).is_none());
    }

    #[test]
    fn test_odometer_going_backwards_has_no_efficiency() {
        let odometer = vec![sample("odo", 1, Some(9000.0)), sample("odo", 2, Some(4000.0))];
        let fuel = vec![sample("fuel", 1, Some(5.0)), sample("fuel", 2, Some(6.0))];
        assert!(compute_efficiency(&odometer, &fuel, 24).is_none());
    }

    #[test]
    fn test_empty_series_has_no_efficiency() {
        let odometer = vec![sample("odo", 1, Some(1000.0)), sample("odo", 2, Some(2000.0))];
        assert!(compute_efficiency(&odometer, &vec![], 24).is_none());
        assert!(compute_efficiency(&vec![], &odometer, 24).is_none());

        let nulls = vec![sample("fuel", 1, None)];
        assert!(compute_efficiency(&odometer, &nulls, 24).is_none());
    }

    #[test]
    fn test_latest_reading_skips_nulls() {
        let series = vec![
            sample("odo", 1, Some(1.0)),
            sample("odo", 5, None),
            sample("odo", 3, Some(3.0)),
        ];
        assert_eq!(latest_reading(&series).and_then(|s| s.data), Some(3.0));
        assert!(latest_reading(&vec![sample("odo", 1, None)]).is_none());
    }

    #[test]
    fn test_latest_reading_tie_keeps_first() {
        let series = vec![
            sample("odo", 4, Some(10.0)),
            sample("odo", 4, Some(20.0)),
            sample("odo", 2, Some(30.0)),
        ];
        assert_eq!(latest_reading(&series).and_then(|s| s.data), Some(10.0));
    }

    #[test]
    fn test_oversized_windows_are_clamped() {
        let window = TimeWindow::trailing_hours_from(at(12), 10_000_000_000);
        assert_eq!(window.to - window.from, Duration::hours(MAX_TRAILING_HOURS));

        let window = TimeWindow::trailing_days(i64::MAX / 2);
        assert_eq!(window.to - window.from, Duration::hours(MAX_TRAILING_HOURS));

        let window = TimeWindow::trailing_hours_from(at(12), -5);
        assert_eq!(window.from, window.to);
    }

    #[test]
    fn test_trailing_window() {
        let window = TimeWindow::trailing_hours_from(at(12), 6);
        assert_eq!(window.from, at(6));
        assert_eq!(window.to, at(12));
    }

    #[test]
    fn test_fuel_level_unit() {
        let mut snapshot = FuelSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.level_unit(), None);

        snapshot.fuel_level = Some(64.0);
        assert_eq!(snapshot.level_unit(), Some(FuelLevelUnit::Percent));
        snapshot.fuel_level = Some(100.0);
        assert_eq!(snapshot.level_unit(), Some(FuelLevelUnit::Percent));
        snapshot.fuel_level = Some(320.0);
        assert_eq!(snapshot.level_unit(), Some(FuelLevelUnit::Liters));
    }

    #[test]
    fn test_touch_keeps_latest() {
        let mut snapshot = FuelSnapshot::default();
        snapshot.touch(at(4));
        snapshot.touch(at(2));
        assert_eq!(snapshot.last_updated, Some(at(4)));
    }
}
