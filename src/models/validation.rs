//! Input validation
//!
//! Field-level checks shared by the user and health record models.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::analytics::{DATE_FORMAT, TIMESTAMP_FORMAT};

/// Rejected input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Blood pressure needs both systolic and diastolic values")]
    IncompleteBloodPressure,

    #[error("Invalid timestamp '{0}', expected YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD")]
    InvalidTimestamp(String),

    #[error("Invalid mood '{0}', valid moods: {1}")]
    InvalidMood(String, String),

    #[error("Invalid gender '{0}', valid values: male, female, other, prefer_not_to_say")]
    InvalidGender(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Date of birth {0} is in the future")]
    FutureDateOfBirth(String),

    #[error("Invalid period '{0}', valid periods: week, month, quarter")]
    InvalidPeriod(String),

    #[error("Invalid username '{0}': use 3-64 letters, digits, '.', '_' or '-'")]
    InvalidUsername(String),

    #[error("Invalid email '{0}'")]
    InvalidEmail(String),
}

const TIMESTAMP_INPUT_FORMATS: [&str; 4] = [
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub(crate) fn check_range_f64(
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value: v,
        }),
        _ => Ok(()),
    }
}

pub(crate) fn check_range_i64(
    field: &'static str,
    value: Option<i64>,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    check_range_f64(field, value.map(|v| v as f64), min as f64, max as f64)
}

/// Normalize a timestamp to storage format. A bare date means midnight.
pub fn normalize_timestamp(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();

    let parsed = TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .map(crate::analytics::window::start_of_day)
        });

    parsed
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

/// Date of birth must parse and must not be after `today`
pub fn validate_date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let dob = parse_date(raw)?;
    if dob > today {
        return Err(ValidationError::FutureDateOfBirth(raw.trim().to_string()));
    }
    Ok(dob)
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if (3..=64).contains(&len) && allowed {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername(username.to_string()))
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = email.len() <= 120
        && !email.chars().any(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.contains('@')
            });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Strip NUL bytes and surrounding whitespace; empty text becomes `None`
pub fn sanitize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(|n| n.replace('\0', "").trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_timestamp_forms() {
        assert_eq!(normalize_timestamp("2024-03-15T08:30:00").unwrap(), "2024-03-15T08:30:00");
        assert_eq!(normalize_timestamp("2024-03-15 08:30:00").unwrap(), "2024-03-15T08:30:00");
        assert_eq!(normalize_timestamp("2024-03-15T08:30").unwrap(), "2024-03-15T08:30:00");
        assert_eq!(normalize_timestamp(" 2024-03-15 ").unwrap(), "2024-03-15T00:00:00");
        assert!(matches!(
            normalize_timestamp("yesterday"),
            Err(ValidationError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_range_checks() {
        assert!(check_range_f64("weight", Some(500.0), 0.0, 500.0).is_ok());
        assert!(check_range_f64("weight", None, 0.0, 500.0).is_ok());
        assert!(check_range_i64("heart_rate", Some(29), 30, 220).is_err());

        let err = check_range_i64("sleep_quality", Some(11), 1, 10).unwrap_err();
        assert_eq!(err.to_string(), "sleep_quality must be between 1 and 10, got 11");
    }

    #[test]
    fn test_date_of_birth() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(validate_date_of_birth("1980-06-15", today).is_ok());
        assert!(matches!(
            validate_date_of_birth("2030-01-01", today),
            Err(ValidationError::FutureDateOfBirth(_))
        ));
        assert!(matches!(
            validate_date_of_birth("15/06/1980", today),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_username_and_email() {
        assert!(validate_username("jane_doe").is_ok());
        assert!(validate_username("jd").is_err());
        assert!(validate_username("jane doe").is_err());

        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("jane.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@localhost").is_err());
    }

    #[test]
    fn test_sanitize_notes() {
        assert_eq!(sanitize_notes(Some("  felt good\0 ")), Some("felt good".to_string()));
        assert_eq!(sanitize_notes(Some("   ")), None);
        assert_eq!(sanitize_notes(None), None);
    }
}
