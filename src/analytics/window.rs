//! Time-window selection
//!
//! Turns a reference date and a named period into an inclusive, day-aligned
//! date range plus navigation anchors for the previous and next windows.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Storage format for record timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Named window length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
}

impl Period {
    pub fn days(self) -> u64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Week => "1 Week",
            Period::Month => "1 Month",
            Period::Quarter => "3 Months",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" | "7d" => Some(Period::Week),
            "month" | "1m" | "30d" => Some(Period::Month),
            "quarter" | "3m" | "90d" => Some(Period::Quarter),
            _ => None,
        }
    }

    /// Parse a period name. A missing name gives `fallback`; an unrecognized
    /// one gives `Month` and is logged.
    pub fn parse_or(name: Option<&str>, fallback: Period) -> Self {
        match name.map(str::trim).filter(|s| !s.is_empty()) {
            None => fallback,
            Some(s) => Period::from_str(s).unwrap_or_else(|| {
                tracing::warn!(period = s, "Unknown period, using month");
                Period::Month
            }),
        }
    }

    pub fn parse_or_default(name: Option<&str>) -> Self {
        Period::parse_or(name, Period::default())
    }
}

/// Parse a `YYYY-MM-DD` reference date, falling back to `today` when missing
/// or malformed
pub fn parse_reference_date(reference: Option<&str>, today: NaiveDate) -> NaiveDate {
    let Some(raw) = reference.map(str::trim).filter(|s| !s.is_empty()) else {
        return today;
    };

    let parsed = (raw.len() == 10)
        .then(|| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
        .flatten();

    parsed.unwrap_or_else(|| {
        tracing::warn!(reference_date = raw, "Invalid reference date, using today");
        today
    })
}

/// Current local time in storage format
pub fn now_timestamp() -> String {
    chrono::Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| start_of_day(date))
}

/// An inclusive date range ending on the reference date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub period: Period,
    pub period_label: &'static str,
    pub reference_date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub previous_anchor: NaiveDate,
    pub next_anchor: NaiveDate,
    /// e.g. "Mar 09 - Mar 15, 2024"
    pub label: String,
}

impl TimeWindow {
    pub fn new(reference_date: NaiveDate, period: Period) -> Self {
        let days = period.days();
        let first_day = reference_date
            .checked_sub_days(Days::new(days - 1))
            .unwrap_or(reference_date);

        let start = start_of_day(first_day);
        let end = end_of_day(reference_date);

        Self {
            period,
            period_label: period.label(),
            reference_date,
            start,
            end,
            previous_anchor: reference_date
                .checked_sub_days(Days::new(days))
                .unwrap_or(reference_date),
            next_anchor: reference_date
                .checked_add_days(Days::new(days))
                .unwrap_or(reference_date),
            label: format!("{} - {}", start.format("%b %d"), end.format("%b %d, %Y")),
        }
    }

    /// Window start in storage format, for range queries
    pub fn start_timestamp(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Window end in storage format, for range queries
    pub fn end_timestamp(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Resolve a window from raw request parameters against a given `today`
pub fn resolve_window_at(
    reference: Option<&str>,
    period: Option<&str>,
    today: NaiveDate,
) -> TimeWindow {
    let reference_date = parse_reference_date(reference, today);
    TimeWindow::new(reference_date, Period::parse_or_default(period))
}

/// Resolve a window from raw request parameters, anchored on the local date
pub fn resolve_window(reference: Option<&str>, period: Option<&str>) -> TimeWindow {
    resolve_window_at(reference, period, chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_week_window() {
        let window = resolve_window_at(Some("2024-03-15"), Some("week"), date("2000-01-01"));

        assert_eq!(window.start_timestamp(), "2024-03-09T00:00:00");
        assert_eq!(window.end_timestamp(), "2024-03-15T23:59:59");
        assert_eq!(window.next_anchor, date("2024-03-22"));
        assert_eq!(window.previous_anchor, date("2024-03-08"));
        assert_eq!(window.label, "Mar 09 - Mar 15, 2024");
        assert_eq!(window.period_label, "1 Week");
    }

    #[test]
    fn test_month_and_quarter_lengths() {
        let month = TimeWindow::new(date("2024-03-30"), Period::Month);
        assert_eq!(month.start, start_of_day(date("2024-03-01")));

        let quarter = TimeWindow::new(date("2024-03-30"), Period::Quarter);
        assert_eq!(quarter.start, start_of_day(date("2024-01-01")));
        assert_eq!(quarter.next_anchor, date("2024-06-28"));
    }

    #[test]
    fn test_unknown_period_falls_back_to_month() {
        let window = resolve_window_at(Some("2024-03-15"), Some("fortnight"), date("2000-01-01"));
        assert_eq!(window.period, Period::Month);
        assert_eq!(window.start, start_of_day(date("2024-02-15")));
    }

    #[test]
    fn test_missing_period_defaults_to_month() {
        let window = resolve_window_at(Some("2024-03-15"), None, date("2000-01-01"));
        assert_eq!(window.period, Period::Month);
    }

    #[test]
    fn test_parse_or_uses_fallback_only_when_missing() {
        assert_eq!(Period::parse_or(None, Period::Week), Period::Week);
        assert_eq!(Period::parse_or(Some(""), Period::Quarter), Period::Quarter);
        assert_eq!(Period::parse_or(Some("7d"), Period::Quarter), Period::Week);
        assert_eq!(Period::parse_or(Some("bogus"), Period::Week), Period::Month);
    }

    #[test]
    fn test_bad_reference_date_falls_back_to_today() {
        let today = date("2025-06-01");
        assert_eq!(parse_reference_date(Some("15/03/2024"), today), today);
        assert_eq!(parse_reference_date(Some("2024-02-30"), today), today);
        assert_eq!(parse_reference_date(Some("2024-3-5"), today), today);
        assert_eq!(parse_reference_date(None, today), today);
        assert_eq!(parse_reference_date(Some("2024-03-05"), today), date("2024-03-05"));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let window = TimeWindow::new(date("2024-03-15"), Period::Week);
        assert!(window.contains(start_of_day(date("2024-03-09"))));
        assert!(window.contains(end_of_day(date("2024-03-15"))));
        assert!(!window.contains(end_of_day(date("2024-03-08"))));
        assert!(!window.contains(start_of_day(date("2024-03-16"))));
    }
}
