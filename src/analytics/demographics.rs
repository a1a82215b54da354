//! Demographic reference data
//!
//! Age bucketing, gender parsing and the reference ranges seeded into the
//! baseline table.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::metric::Metric;

/// Fictional cohort size recorded with each seeded baseline
pub const REFERENCE_SAMPLE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer_not_to_say",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            "prefer_not_to_say" => Some(Gender::PreferNotToSay),
            _ => None,
        }
    }
}

/// Age bucket used to key baselines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-29")]
    From18To29,
    #[serde(rename = "30-39")]
    From30To39,
    #[serde(rename = "40-49")]
    From40To49,
    #[serde(rename = "50-59")]
    From50To59,
    #[serde(rename = "60-69")]
    From60To69,
    #[serde(rename = "70+")]
    From70,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::From18To29,
        AgeGroup::From30To39,
        AgeGroup::From40To49,
        AgeGroup::From50To59,
        AgeGroup::From60To69,
        AgeGroup::From70,
    ];

    /// Bucket for an age in whole years. Minors have no bucket.
    pub fn from_age(age: i32) -> Option<Self> {
        if age < 18 {
            None
        } else if age < 30 {
            Some(AgeGroup::From18To29)
        } else if age < 40 {
            Some(AgeGroup::From30To39)
        } else if age < 50 {
            Some(AgeGroup::From40To49)
        } else if age < 60 {
            Some(AgeGroup::From50To59)
        } else if age < 70 {
            Some(AgeGroup::From60To69)
        } else {
            Some(AgeGroup::From70)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::From18To29 => "18-29",
            AgeGroup::From30To39 => "30-39",
            AgeGroup::From40To49 => "40-49",
            AgeGroup::From50To59 => "50-59",
            AgeGroup::From60To69 => "60-69",
            AgeGroup::From70 => "70+",
        }
    }
}

/// Whole years between `date_of_birth` and `on`; `None` if born after `on`
pub fn age_on(date_of_birth: NaiveDate, on: NaiveDate) -> Option<i32> {
    if date_of_birth > on {
        return None;
    }
    let mut age = on.year() - date_of_birth.year();
    if (on.month(), on.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    Some(age)
}

/// Derived statistics stored alongside each baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetadata {
    pub percentile_25: f64,
    pub percentile_75: f64,
    pub standard_deviation: f64,
    pub sample_size: u32,
    pub last_updated: String,
}

impl BaselineMetadata {
    pub fn derive(avg: f64, min: f64, max: f64, last_updated: String) -> Self {
        Self {
            percentile_25: min + (avg - min) * 0.5,
            percentile_75: avg + (max - avg) * 0.5,
            standard_deviation: (max - min) / 4.0,
            sample_size: REFERENCE_SAMPLE_SIZE,
            last_updated,
        }
    }
}

/// One seeded reference range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub metric: Metric,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// (avg, min, max) per age group, youngest first
type AgeTable = [(f64, f64, f64); 6];

const WEIGHT_MALE: AgeTable = [
    (75.0, 60.0, 90.0),
    (78.0, 63.0, 93.0),
    (80.0, 65.0, 95.0),
    (82.0, 67.0, 97.0),
    (80.0, 65.0, 95.0),
    (77.0, 62.0, 92.0),
];
const WEIGHT_FEMALE: AgeTable = [
    (62.0, 50.0, 74.0),
    (64.0, 52.0, 77.0),
    (66.0, 53.0, 79.0),
    (68.0, 55.0, 81.0),
    (67.0, 54.0, 80.0),
    (65.0, 52.0, 78.0),
];

const HEART_RATE_MALE: AgeTable = [
    (70.0, 60.0, 100.0),
    (72.0, 60.0, 100.0),
    (74.0, 60.0, 100.0),
    (76.0, 60.0, 100.0),
    (78.0, 60.0, 100.0),
    (80.0, 60.0, 100.0),
];
const HEART_RATE_FEMALE: AgeTable = [
    (74.0, 60.0, 100.0),
    (76.0, 60.0, 100.0),
    (78.0, 60.0, 100.0),
    (80.0, 60.0, 100.0),
    (82.0, 60.0, 100.0),
    (84.0, 60.0, 100.0),
];

// Systolic
const BLOOD_PRESSURE_MALE: AgeTable = [
    (120.0, 90.0, 140.0),
    (122.0, 90.0, 140.0),
    (125.0, 90.0, 140.0),
    (127.0, 90.0, 140.0),
    (130.0, 90.0, 140.0),
    (135.0, 90.0, 150.0),
];
const BLOOD_PRESSURE_FEMALE: AgeTable = [
    (115.0, 90.0, 140.0),
    (118.0, 90.0, 140.0),
    (122.0, 90.0, 140.0),
    (125.0, 90.0, 140.0),
    (130.0, 90.0, 140.0),
    (135.0, 90.0, 150.0),
];

const STEPS_MALE: AgeTable = [
    (9000.0, 7000.0, 12000.0),
    (8500.0, 6500.0, 11000.0),
    (8000.0, 6000.0, 10000.0),
    (7500.0, 5500.0, 9500.0),
    (6500.0, 5000.0, 8500.0),
    (5500.0, 4000.0, 7500.0),
];
const STEPS_FEMALE: AgeTable = [
    (8500.0, 6500.0, 11000.0),
    (8000.0, 6000.0, 10500.0),
    (7500.0, 5500.0, 10000.0),
    (7000.0, 5000.0, 9000.0),
    (6000.0, 4500.0, 8000.0),
    (5000.0, 3500.0, 7000.0),
];

const SLEEP_MALE: AgeTable = [
    (7.5, 7.0, 9.0),
    (7.2, 7.0, 8.5),
    (7.0, 6.5, 8.0),
    (6.8, 6.0, 8.0),
    (6.5, 5.5, 7.5),
    (6.2, 5.0, 7.0),
];
const SLEEP_FEMALE: AgeTable = [
    (7.8, 7.0, 9.0),
    (7.5, 7.0, 8.5),
    (7.2, 6.5, 8.0),
    (7.0, 6.0, 8.0),
    (6.8, 5.5, 7.5),
    (6.5, 5.0, 7.0),
];

const REFERENCE_TABLES: [(Metric, Gender, &AgeTable); 10] = [
    (Metric::Weight, Gender::Male, &WEIGHT_MALE),
    (Metric::Weight, Gender::Female, &WEIGHT_FEMALE),
    (Metric::HeartRate, Gender::Male, &HEART_RATE_MALE),
    (Metric::HeartRate, Gender::Female, &HEART_RATE_FEMALE),
    (Metric::BloodPressure, Gender::Male, &BLOOD_PRESSURE_MALE),
    (Metric::BloodPressure, Gender::Female, &BLOOD_PRESSURE_FEMALE),
    (Metric::Steps, Gender::Male, &STEPS_MALE),
    (Metric::Steps, Gender::Female, &STEPS_FEMALE),
    (Metric::SleepDuration, Gender::Male, &SLEEP_MALE),
    (Metric::SleepDuration, Gender::Female, &SLEEP_FEMALE),
];

/// Every reference range to seed
pub fn reference_ranges() -> Vec<ReferenceRange> {
    REFERENCE_TABLES
        .iter()
        .flat_map(|(metric, gender, table)| {
            AgeGroup::ALL
                .iter()
                .zip(table.iter())
                .map(|(age_group, (avg, min, max))| ReferenceRange {
                    metric: *metric,
                    gender: *gender,
                    age_group: *age_group,
                    avg: *avg,
                    min: *min,
                    max: *max,
                })
        })
        .collect()
}
