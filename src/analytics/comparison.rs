//! Week-over-week comparison
//!
//! Compares one metric between the most recent record and the most recent
//! record older than a week.

use serde::Serialize;

use super::metric::{Metric, Precision};
use super::stats::Trend;
use crate::models::HealthRecord;

/// How far back the comparison record must be
pub const COMPARISON_DAYS: u64 = 7;

/// Metrics shown on the dashboard comparison panel
pub const DASHBOARD_COMPARISONS: [Metric; 6] = [
    Metric::Weight,
    Metric::BloodPressure,
    Metric::HeartRate,
    Metric::OxygenSaturation,
    Metric::Temperature,
    Metric::SleepDuration,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodComparison {
    /// Absolute change, current minus previous
    pub value: f64,
    /// Change relative to the previous value, in percent
    pub percentage: f64,
    pub direction: Trend,
}

impl PeriodComparison {
    pub fn unchanged() -> Self {
        Self {
            value: 0.0,
            percentage: 0.0,
            direction: Trend::Neutral,
        }
    }

    fn between(current: f64, previous: f64, precision: Precision) -> Self {
        let diff = current - previous;
        let percentage = if previous != 0.0 {
            diff / previous * 100.0
        } else {
            0.0
        };
        Self::from_parts(precision.round(diff), Precision::OneDecimal.round(percentage))
    }

    fn from_parts(value: f64, percentage: f64) -> Self {
        let direction = if value > 0.0 {
            Trend::Up
        } else if value < 0.0 {
            Trend::Down
        } else {
            Trend::Neutral
        };
        Self {
            value,
            percentage,
            direction,
        }
    }
}

/// Compare `metric` between two records. Missing records or values give
/// an unchanged result.
pub fn compare_records(
    metric: Metric,
    current: Option<&HealthRecord>,
    previous: Option<&HealthRecord>,
) -> PeriodComparison {
    let (Some(current), Some(previous)) = (current, previous) else {
        return PeriodComparison::unchanged();
    };

    if metric.is_composite() {
        return compare_blood_pressure(current, previous);
    }

    match (metric.value(current), metric.value(previous)) {
        (Some(now), Some(then)) => {
            PeriodComparison::between(now, then, metric.spec().value_precision)
        }
        _ => PeriodComparison::unchanged(),
    }
}

fn compare_blood_pressure(current: &HealthRecord, previous: &HealthRecord) -> PeriodComparison {
    let pairs = (
        current.blood_pressure_systolic,
        current.blood_pressure_diastolic,
        previous.blood_pressure_systolic,
        previous.blood_pressure_diastolic,
    );
    let (Some(sys_now), Some(dia_now), Some(sys_then), Some(dia_then)) = pairs else {
        return PeriodComparison::unchanged();
    };

    let one_dp = Precision::OneDecimal;
    let systolic = PeriodComparison::between(sys_now as f64, sys_then as f64, one_dp);
    let diastolic = PeriodComparison::between(dia_now as f64, dia_then as f64, one_dp);

    PeriodComparison::from_parts(
        Precision::OneDecimal.round((systolic.value + diastolic.value) / 2.0),
        Precision::OneDecimal.round((systolic.percentage + diastolic.percentage) / 2.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: &str) -> HealthRecord {
        HealthRecord::empty(1, timestamp)
    }

    #[test]
    fn test_weight_loss_is_down() {
        let previous = HealthRecord {
            weight: Some(80.0),
            ..record("2024-03-01T08:00:00")
        };
        let current = HealthRecord {
            weight: Some(78.0),
            ..record("2024-03-10T08:00:00")
        };

        let cmp = compare_records(Metric::Weight, Some(&current), Some(&previous));
        assert_eq!(cmp.value, -2.0);
        assert_eq!(cmp.percentage, -2.5);
        assert_eq!(cmp.direction, Trend::Down);
    }

    #[test]
    fn test_heart_rate_difference_is_whole() {
        let previous = HealthRecord {
            heart_rate: Some(70),
            ..record("2024-03-01T08:00:00")
        };
        let current = HealthRecord {
            heart_rate: Some(77),
            ..record("2024-03-10T08:00:00")
        };

        let cmp = compare_records(Metric::HeartRate, Some(&current), Some(&previous));
        assert_eq!(cmp.value, 7.0);
        assert_eq!(cmp.percentage, 10.0);
        assert_eq!(cmp.direction, Trend::Up);
    }

    #[test]
    fn test_blood_pressure_averages_both_readings() {
        let previous = HealthRecord {
            blood_pressure_systolic: Some(120),
            blood_pressure_diastolic: Some(80),
            ..record("2024-03-01T08:00:00")
        };
        let current = HealthRecord {
            blood_pressure_systolic: Some(126),
            blood_pressure_diastolic: Some(84),
            ..record("2024-03-10T08:00:00")
        };

        let cmp = compare_records(Metric::BloodPressure, Some(&current), Some(&previous));
        // (6 + 4) / 2
        assert_eq!(cmp.value, 5.0);
        // (5.0% + 5.0%) / 2
        assert_eq!(cmp.percentage, 5.0);
        assert_eq!(cmp.direction, Trend::Up);
    }

    #[test]
    fn test_missing_previous_record_is_unchanged() {
        let current = HealthRecord {
            weight: Some(78.0),
            ..record("2024-03-10T08:00:00")
        };
        assert_eq!(
            compare_records(Metric::Weight, Some(&current), None),
            PeriodComparison::unchanged()
        );
        assert_eq!(compare_records(Metric::Weight, None, None), PeriodComparison::unchanged());
    }

    #[test]
    fn test_missing_value_is_unchanged() {
        let previous = record("2024-03-01T08:00:00");
        let current = HealthRecord {
            temperature: Some(36.8),
            ..record("2024-03-10T08:00:00")
        };
        assert_eq!(
            compare_records(Metric::Temperature, Some(&current), Some(&previous)),
            PeriodComparison::unchanged()
        );
    }

    #[test]
    fn test_zero_previous_value_has_zero_percentage() {
        let previous = HealthRecord {
            steps: Some(0),
            ..record("2024-03-01T08:00:00")
        };
        let current = HealthRecord {
            steps: Some(5000),
            ..record("2024-03-10T08:00:00")
        };

        let cmp = compare_records(Metric::Steps, Some(&current), Some(&previous));
        assert_eq!(cmp.value, 5000.0);
        assert_eq!(cmp.percentage, 0.0);
        assert_eq!(cmp.direction, Trend::Up);
    }
}
