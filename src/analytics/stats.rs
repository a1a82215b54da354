//! Statistics engine
//!
//! Average, minimum, maximum, latest value and a short-horizon trend for one
//! metric over a time-ordered window of records. Empty input never fails: every
//! statistic becomes the `N/A` sentinel and the trend is neutral.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::metric::{Metric, Precision};
use crate::models::HealthRecord;

/// Number of most recent samples the trend line is fitted to
pub const TREND_POINTS: usize = 3;

/// Marker reported in place of a statistic when there is nothing to compute
pub const NO_DATA: &str = "N/A";

/// Direction of recent change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Neutral => "neutral",
        }
    }
}

/// One reported statistic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Whole(i64),
    Decimal(f64),
    /// Systolic/diastolic
    Pair(i64, i64),
    NoData,
}

impl StatValue {
    fn rounded(value: f64, precision: Precision) -> Self {
        match precision {
            Precision::Whole => StatValue::Whole(value.round() as i64),
            Precision::OneDecimal => StatValue::Decimal(precision.round(value)),
        }
    }

    fn pair(systolic: f64, diastolic: f64) -> Self {
        StatValue::Pair(systolic.round() as i64, diastolic.round() as i64)
    }

    /// Numeric value for single-valued statistics
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Whole(v) => Some(*v as f64),
            StatValue::Decimal(v) => Some(*v),
            StatValue::Pair(..) | StatValue::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, StatValue::NoData)
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Whole(v) => write!(f, "{}", v),
            StatValue::Decimal(v) => write!(f, "{:.1}", v),
            StatValue::Pair(s, d) => write!(f, "{}/{}", s, d),
            StatValue::NoData => f.write_str(NO_DATA),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatValue::Whole(v) => serializer.serialize_i64(*v),
            StatValue::Decimal(v) => serializer.serialize_f64(*v),
            StatValue::Pair(..) => serializer.collect_str(self),
            StatValue::NoData => serializer.serialize_str(NO_DATA),
        }
    }
}

/// Statistics for one metric over one window
#[derive(Debug, Clone, Serialize)]
pub struct TrendResult {
    pub metric: String,
    pub unit: &'static str,
    pub sample_count: usize,
    pub average: StatValue,
    pub minimum: StatValue,
    pub maximum: StatValue,
    pub latest: StatValue,
    pub trend: Trend,
}

impl TrendResult {
    pub fn empty(metric: &str, unit: &'static str) -> Self {
        Self {
            metric: metric.to_string(),
            unit,
            sample_count: 0,
            average: StatValue::NoData,
            minimum: StatValue::NoData,
            maximum: StatValue::NoData,
            latest: StatValue::NoData,
            trend: Trend::Neutral,
        }
    }

    pub fn has_data(&self) -> bool {
        self.sample_count > 0
    }
}

struct Summary {
    mean: f64,
    min: f64,
    max: f64,
    last: f64,
}

fn summarize(values: &[f64]) -> Option<Summary> {
    let last = *values.last()?;
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some(Summary { mean, min, max, last })
}

/// Slope of the least-squares line through `(i, values[i])`.
///
/// Samples are weighted equally regardless of the time between them.
pub fn least_squares_slope(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let (numerator, denominator) = values.iter().enumerate().fold(
        (0.0, 0.0),
        |(num, den), (i, y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        },
    );

    let slope = numerator / denominator;
    slope.is_finite().then_some(slope)
}

/// Classify the last `TREND_POINTS` values of a series
pub fn calculate_trend(values: &[f64], threshold: f64) -> Trend {
    if values.len() < TREND_POINTS {
        return Trend::Neutral;
    }

    let recent = &values[values.len() - TREND_POINTS..];
    match least_squares_slope(recent) {
        Some(slope) if slope > threshold => Trend::Up,
        Some(slope) if slope < -threshold => Trend::Down,
        Some(_) => Trend::Neutral,
        None => {
            tracing::warn!(?recent, "Trend fit produced no finite slope, reporting neutral");
            Trend::Neutral
        }
    }
}

/// Compute statistics for `metric` over records ordered oldest first
pub fn compute_statistics(records: &[HealthRecord], metric: Metric) -> TrendResult {
    let spec = metric.spec();

    if metric.is_composite() {
        return blood_pressure_statistics(records);
    }

    let values: Vec<f64> = records.iter().filter_map(spec.value).collect();
    let Some(summary) = summarize(&values) else {
        return TrendResult::empty(spec.name, spec.unit);
    };

    TrendResult {
        metric: spec.name.to_string(),
        unit: spec.unit,
        sample_count: values.len(),
        average: StatValue::rounded(summary.mean, spec.average_precision),
        minimum: StatValue::rounded(summary.min, spec.value_precision),
        maximum: StatValue::rounded(summary.max, spec.value_precision),
        latest: StatValue::rounded(summary.last, spec.value_precision),
        trend: calculate_trend(&values, spec.trend_threshold),
    }
}

/// Compute statistics for a metric given by name. Unknown names produce the
/// empty result.
pub fn compute_statistics_by_name(records: &[HealthRecord], metric: &str) -> TrendResult {
    match Metric::from_str(metric) {
        Some(m) => compute_statistics(records, m),
        None => {
            tracing::warn!(metric, "Statistics requested for unknown metric");
            TrendResult::empty(metric, "")
        }
    }
}

fn blood_pressure_statistics(records: &[HealthRecord]) -> TrendResult {
    let spec = Metric::BloodPressure.spec();

    let (systolic, diastolic): (Vec<f64>, Vec<f64>) = records
        .iter()
        .filter_map(|r| match (r.blood_pressure_systolic, r.blood_pressure_diastolic) {
            (Some(s), Some(d)) => Some((s as f64, d as f64)),
            _ => None,
        })
        .unzip();

    let (Some(sys), Some(dia)) = (summarize(&systolic), summarize(&diastolic)) else {
        return TrendResult::empty(spec.name, spec.unit);
    };

    TrendResult {
        metric: spec.name.to_string(),
        unit: spec.unit,
        sample_count: systolic.len(),
        average: StatValue::pair(sys.mean, dia.mean),
        minimum: StatValue::pair(sys.min, dia.min),
        maximum: StatValue::pair(sys.max, dia.max),
        latest: StatValue::pair(sys.last, dia.last),
        trend: calculate_trend(&systolic, spec.trend_threshold),
    }
}
