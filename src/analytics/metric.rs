//! Metric table
//!
//! Every trackable metric has one static `MetricSpec` entry holding its accessor,
//! unit, rounding and trend threshold. Callers resolve a `Metric` once and read
//! everything else from its spec.

use serde::{Deserialize, Serialize};

use crate::models::HealthRecord;

/// A named health measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Weight = 0,
    BloodPressure = 1,
    HeartRate = 2,
    Temperature = 3,
    OxygenSaturation = 4,
    Steps = 5,
    ExerciseDuration = 6,
    CaloriesBurned = 7,
    SleepDuration = 8,
    SleepQuality = 9,
    WaterIntake = 10,
    CalorieIntake = 11,
    StressLevel = 12,
}

/// Rounding applied to a reported statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Whole,
    OneDecimal,
}

impl Precision {
    /// Round half away from zero
    pub fn round(self, value: f64) -> f64 {
        match self {
            Precision::Whole => value.round(),
            Precision::OneDecimal => (value * 10.0).round() / 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    Line,
    Bar,
}

/// Static description of one metric
pub struct MetricSpec {
    pub metric: Metric,
    pub name: &'static str,
    pub display_name: &'static str,
    pub unit: &'static str,
    /// Column in `health_records` holding the (primary) value
    pub column: &'static str,
    /// Primary value of a record. For blood pressure this is the systolic reading.
    pub value: fn(&HealthRecord) -> Option<f64>,
    pub average_precision: Precision,
    pub value_precision: Precision,
    /// Minimum slope per sample for a trend to count as up or down
    pub trend_threshold: f64,
    pub chart_style: ChartStyle,
    pub color: (u8, u8, u8),
}

pub static METRICS: [MetricSpec; 13] = [
    MetricSpec {
        metric: Metric::Weight,
        name: "weight",
        display_name: "Weight",
        unit: "kg",
        column: "weight",
        value: |r: &HealthRecord| r.weight,
        average_precision: Precision::OneDecimal,
        value_precision: Precision::OneDecimal,
        trend_threshold: 0.1,
        chart_style: ChartStyle::Line,
        color: (0, 0, 255),
    },
    MetricSpec {
        metric: Metric::BloodPressure,
        name: "blood_pressure",
        display_name: "Blood Pressure",
        unit: "mmHg",
        column: "blood_pressure_systolic",
        value: |r: &HealthRecord| r.blood_pressure_systolic.map(|v| v as f64),
        average_precision: Precision::Whole,
        value_precision: Precision::Whole,
        trend_threshold: 1.0,
        chart_style: ChartStyle::Line,
        color: (255, 0, 0),
    },
    MetricSpec {
        metric: Metric::HeartRate,
        name: "heart_rate",
        display_name: "Heart Rate",
        unit: "bpm",
        column: "heart_rate",
        value: |r: &HealthRecord| r.heart_rate.map(|v| v as f64),
        average_precision: Precision::Whole,
        value_precision: Precision::Whole,
        trend_threshold: 1.0,
        chart_style: ChartStyle::Line,
        color: (0, 128, 0),
    },
    MetricSpec {
        metric: Metric::Temperature,
        name: "temperature",
        display_name: "Temperature",
        unit: "°C",
        column: "temperature",
        value: |r: &HealthRecord| r.temperature,
        average_precision: Precision::OneDecimal,
        value_precision: Precision::OneDecimal,
        trend_threshold: 0.1,
        chart_style: ChartStyle::Line,
        color: (220, 20, 60),
    },
    MetricSpec {
        metric: Metric::OxygenSaturation,
        name: "oxygen_saturation",
        display_name: "Oxygen Saturation",
        unit: "%",
        column: "oxygen_saturation",
        value: |r: &HealthRecord| r.oxygen_saturation,
        average_precision: Precision::OneDecimal,
        value_precision: Precision::OneDecimal,
        trend_threshold: 0.5,
        chart_style: ChartStyle::Line,
        color: (0, 112, 192),
    },
    MetricSpec {
        metric: Metric::Steps,
        name: "steps",
        display_name: "Steps",
        unit: "steps",
        column: "steps",
        value: |r: &HealthRecord| r.steps.map(|v| v as f64),
        average_precision: Precision::Whole,
        value_precision: Precision::Whole,
        trend_threshold: 100.0,
        chart_style: ChartStyle::Bar,
        color: (255, 165, 0),
    },
    MetricSpec {
        metric: Metric::ExerciseDuration,
        name: "exercise_duration",
        display_name: "Exercise Duration",
        unit: "minutes",
        column: "exercise_duration",
        value: |r: &HealthRecord| r.exercise_duration.map(|v| v as f64),
        average_precision: Precision::Whole,
        value_precision: Precision::Whole,
        trend_threshold: 5.0,
        chart_style: ChartStyle::Bar,
        color: (0, 176, 80),
    },
    MetricSpec {
        metric: Metric::CaloriesBurned,
        name: "calories_burned",
        display_name: "Calories Burned",
        unit: "kcal",
        column: "calories_burned",
        value: |r: &HealthRecord| r.calories_burned.map(|v| v as f64),
        average_precision: Precision::Whole,
        value_precision: Precision::Whole,
        trend_threshold: 50.0,
        chart_style: ChartStyle::Bar,
        color: (255, 99, 71),
    },
    MetricSpec {
        metric: Metric::SleepDuration,
        name: "sleep_duration",
        display_name: "Sleep Duration",
        unit: "hours",
        column: "sleep_duration",
        value: |r: &HealthRecord| r.sleep_duration,
        average_precision: Precision::OneDecimal,
        value_precision: Precision::OneDecimal,
        trend_threshold: 0.2,
        chart_style: ChartStyle::Line,
        color: (128, 0, 128),
    },
    MetricSpec {
        metric: Metric::SleepQuality,
        name: "sleep_quality",
        display_name: "Sleep Quality",
        unit: "/10",
        column: "sleep_quality",
        value: |r: &HealthRecord| r.sleep_quality.map(|v| v as f64),
        average_precision: Precision::OneDecimal,
        value_precision: Precision::Whole,
        trend_threshold: 0.5,
        chart_style: ChartStyle::Line,
        color: (112, 48, 160),
    },
    MetricSpec {
        metric: Metric::WaterIntake,
        name: "water_intake",
        display_name: "Water Intake",
        unit: "liters",
        column: "water_intake",
        value: |r: &HealthRecord| r.water_intake,
        average_precision: Precision::OneDecimal,
        value_precision: Precision::OneDecimal,
        trend_threshold: 0.1,
        chart_style: ChartStyle::Bar,
        color: (135, 206, 235),
    },
    MetricSpec {
        metric: Metric::CalorieIntake,
        name: "calorie_intake",
        display_name: "Calorie Intake",
        unit: "kcal",
        column: "calorie_intake",
        value: |r: &HealthRecord| r.calorie_intake.map(|v| v as f64),
        average_precision: Precision::Whole,
        value_precision: Precision::Whole,
        trend_threshold: 50.0,
        chart_style: ChartStyle::Bar,
        color: (165, 42, 42),
    },
    MetricSpec {
        metric: Metric::StressLevel,
        name: "stress_level",
        display_name: "Stress Level",
        unit: "/10",
        column: "stress_level",
        value: |r: &HealthRecord| r.stress_level.map(|v| v as f64),
        average_precision: Precision::OneDecimal,
        value_precision: Precision::Whole,
        trend_threshold: 0.5,
        chart_style: ChartStyle::Line,
        color: (255, 0, 0),
    },
];

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::Weight,
        Metric::BloodPressure,
        Metric::HeartRate,
        Metric::Temperature,
        Metric::OxygenSaturation,
        Metric::Steps,
        Metric::ExerciseDuration,
        Metric::CaloriesBurned,
        Metric::SleepDuration,
        Metric::SleepQuality,
        Metric::WaterIntake,
        Metric::CalorieIntake,
        Metric::StressLevel,
    ];

    pub fn spec(self) -> &'static MetricSpec {
        &METRICS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    pub fn display_name(self) -> &'static str {
        self.spec().display_name
    }

    pub fn unit(self) -> &'static str {
        self.spec().unit
    }

    /// Blood pressure is reported as a systolic/diastolic pair
    pub fn is_composite(self) -> bool {
        matches!(self, Metric::BloodPressure)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "weight" => Some(Metric::Weight),
            "blood_pressure" | "bp" => Some(Metric::BloodPressure),
            "heart_rate" | "hr" | "pulse" => Some(Metric::HeartRate),
            "temperature" | "temp" => Some(Metric::Temperature),
            "oxygen_saturation" | "spo2" | "o2" | "oxygen" => Some(Metric::OxygenSaturation),
            "steps" => Some(Metric::Steps),
            "exercise_duration" | "exercise" => Some(Metric::ExerciseDuration),
            "calories_burned" => Some(Metric::CaloriesBurned),
            "sleep_duration" | "sleep" => Some(Metric::SleepDuration),
            "sleep_quality" => Some(Metric::SleepQuality),
            "water_intake" | "water" => Some(Metric::WaterIntake),
            "calorie_intake" | "calories" => Some(Metric::CalorieIntake),
            "stress_level" | "stress" => Some(Metric::StressLevel),
            _ => None,
        }
    }

    /// Value of this metric in a record (systolic for blood pressure)
    pub fn value(self, record: &HealthRecord) -> Option<f64> {
        (self.spec().value)(record)
    }

    /// Comma separated list of canonical names, for error messages
    pub fn valid_names() -> String {
        Metric::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
