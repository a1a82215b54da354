//! Statistics MCP Tools
//!
//! Windowed metric statistics, demographic baselines and the dashboard summary.

use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use super::users::{parse_gender, require_user};
use crate::analytics::window::parse_reference_date;
use crate::analytics::{
    compare_records, compute_statistics_by_name, Metric, Period, PeriodComparison, TimeWindow,
    TrendResult, COMPARISON_DAYS, DASHBOARD_COMPARISONS, TIMESTAMP_FORMAT,
};
use crate::db::Database;
use crate::models::{BaselineRange, DemographicBaseline, HealthRecord, User};

/// Records shown on the dashboard
pub const DASHBOARD_RECENT_RECORDS: i64 = 5;

/// Metrics with a baseline panel on the dashboard
pub const DASHBOARD_BASELINES: [Metric; 3] = [Metric::Weight, Metric::HeartRate, Metric::Steps];

/// Window description returned with statistics and charts
#[derive(Debug, Serialize)]
pub struct WindowSummary {
    pub period: Period,
    pub period_label: &'static str,
    pub label: String,
    pub reference_date: NaiveDate,
    pub start: String,
    pub end: String,
    pub previous_anchor: NaiveDate,
    pub next_anchor: NaiveDate,
}

impl From<&TimeWindow> for WindowSummary {
    fn from(window: &TimeWindow) -> Self {
        Self {
            period: window.period,
            period_label: window.period_label,
            label: window.label.clone(),
            reference_date: window.reference_date,
            start: window.start_timestamp(),
            end: window.end_timestamp(),
            previous_anchor: window.previous_anchor,
            next_anchor: window.next_anchor,
        }
    }
}

/// Response for get_metric_statistics
#[derive(Debug, Serialize)]
pub struct MetricStatisticsResponse {
    pub user_id: i64,
    pub window: WindowSummary,
    pub statistics: TrendResult,
    pub no_data: bool,
    pub baseline: Option<BaselineRange>,
}

/// Latest recorded value of one metric
#[derive(Debug, Serialize)]
pub struct LatestReading {
    pub value: f64,
    pub unit: &'static str,
    pub timestamp: String,
}

/// Week-over-week change of one metric
#[derive(Debug, Serialize)]
pub struct MetricComparison {
    pub metric: &'static str,
    #[serde(flatten)]
    pub change: PeriodComparison,
}

/// Response for get_dashboard
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user_id: i64,
    pub username: String,
    pub record_count: i64,
    pub recent_records: Vec<HealthRecord>,
    pub latest_weight: Option<LatestReading>,
    pub latest_steps: Option<LatestReading>,
    pub latest_heart_rate: Option<LatestReading>,
    pub baselines: Vec<BaselineRange>,
    pub comparisons: Vec<MetricComparison>,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_metric(metric: &str) -> Result<Metric, String> {
    Metric::from_str(metric).ok_or_else(|| {
        format!(
            "Invalid metric: '{}'. Valid metrics: {}",
            metric,
            Metric::valid_names()
        )
    })
}

/// Resolve the window for a user's request. A missing period falls back to
/// the user's default.
pub(crate) fn user_window(
    user: &User,
    period: Option<&str>,
    reference_date: Option<&str>,
    today: NaiveDate,
) -> TimeWindow {
    let period = Period::parse_or(period, user.default_period);
    TimeWindow::new(parse_reference_date(reference_date, today), period)
}

pub(crate) fn records_in_window(
    conn: &Connection,
    user_id: i64,
    window: &TimeWindow,
) -> Result<Vec<HealthRecord>, String> {
    HealthRecord::list_in_range(conn, user_id, &window.start_timestamp(), &window.end_timestamp())
        .map_err(|e| format!("Failed to load records: {}", e))
}

/// Baseline for the user's demographic, when their profile allows one
fn user_baseline(
    conn: &Connection,
    user: &User,
    metric: Metric,
    today: NaiveDate,
) -> Result<Option<BaselineRange>, String> {
    let (Some(gender), Some(age)) = (user.gender, user.age_on(today)) else {
        return Ok(None);
    };

    DemographicBaseline::lookup(conn, gender, age, metric)
        .map_err(|e| format!("Failed to look up baseline: {}", e))
}

fn latest_reading(
    conn: &Connection,
    user_id: i64,
    metric: Metric,
) -> Result<Option<LatestReading>, String> {
    let record = HealthRecord::latest_with_metric(conn, user_id, metric)
        .map_err(|e| format!("Failed to load latest {}: {}", metric.as_str(), e))?;

    Ok(record.and_then(|r| {
        metric.value(&r).map(|value| LatestReading {
            value,
            unit: metric.unit(),
            timestamp: r.timestamp,
        })
    }))
}

/// Statistics and trend for one metric over a window
pub fn get_metric_statistics(
    db: &Database,
    user_id: i64,
    metric: &str,
    period: Option<&str>,
    reference_date: Option<&str>,
) -> Result<MetricStatisticsResponse, String> {
    let today = today();
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = require_user(&conn, user_id)?;

    let window = user_window(&user, period, reference_date, today);
    let records = records_in_window(&conn, user_id, &window)?;
    let statistics = compute_statistics_by_name(&records, metric);

    let baseline = match Metric::from_str(metric) {
        Some(m) if user.show_baselines => user_baseline(&conn, &user, m, today)?,
        _ => None,
    };

    tracing::debug!(
        user_id,
        metric,
        period = window.period.as_str(),
        samples = statistics.sample_count,
        "Computed metric statistics"
    );

    Ok(MetricStatisticsResponse {
        user_id,
        window: WindowSummary::from(&window),
        no_data: !statistics.has_data(),
        statistics,
        baseline,
    })
}

/// Reference range for a demographic
pub fn lookup_baseline(
    db: &Database,
    gender: &str,
    age: i32,
    metric: &str,
) -> Result<Option<BaselineRange>, String> {
    let gender = parse_gender(gender)?;
    let metric = parse_metric(metric)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    DemographicBaseline::lookup(&conn, gender, age, metric)
        .map_err(|e| format!("Failed to look up baseline: {}", e))
}

/// Overview of a user's recent data
pub fn get_dashboard(db: &Database, user_id: i64) -> Result<DashboardResponse, String> {
    let now = chrono::Local::now().naive_local();
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let user = require_user(&conn, user_id)?;

    let record_count = HealthRecord::count_for_user(&conn, user_id)
        .map_err(|e| format!("Failed to count records: {}", e))?;
    let recent_records = HealthRecord::list_recent(&conn, user_id, DASHBOARD_RECENT_RECORDS)
        .map_err(|e| format!("Failed to load recent records: {}", e))?;

    let mut baselines = Vec::new();
    if user.show_baselines {
        for metric in DASHBOARD_BASELINES {
            if let Some(b) = user_baseline(&conn, &user, metric, now.date())? {
                baselines.push(b);
            }
        }
    }

    let cutoff = now
        .checked_sub_days(Days::new(COMPARISON_DAYS))
        .unwrap_or(now)
        .format(TIMESTAMP_FORMAT)
        .to_string();
    let previous = HealthRecord::latest_before(&conn, user_id, &cutoff)
        .map_err(|e| format!("Failed to load comparison record: {}", e))?;
    let current = recent_records.first();

    let comparisons = DASHBOARD_COMPARISONS
        .iter()
        .map(|metric| MetricComparison {
            metric: metric.as_str(),
            change: compare_records(*metric, current, previous.as_ref()),
        })
        .collect();

    Ok(DashboardResponse {
        user_id,
        username: user.username.clone(),
        record_count,
        latest_weight: latest_reading(&conn, user_id, Metric::Weight)?,
        latest_steps: latest_reading(&conn, user_id, Metric::Steps)?,
        latest_heart_rate: latest_reading(&conn, user_id, Metric::HeartRate)?,
        recent_records,
        baselines,
        comparisons,
    })
}
