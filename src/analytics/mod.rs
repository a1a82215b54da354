//! Health analytics
//!
//! Pure computations over request-scoped records: the metric table, the
//! statistics engine, time windows, demographic buckets and week-over-week
//! comparison. Nothing in here touches the database.

pub mod comparison;
pub mod demographics;
pub mod metric;
pub mod stats;
pub mod window;

pub use comparison::{compare_records, PeriodComparison, COMPARISON_DAYS, DASHBOARD_COMPARISONS};
pub use demographics::{age_on, AgeGroup, BaselineMetadata, Gender};
pub use metric::{ChartStyle, Metric, MetricSpec, Precision, METRICS};
pub use stats::{
    calculate_trend, compute_statistics, compute_statistics_by_name, least_squares_slope,
    StatValue, Trend, TrendResult, NO_DATA,
};
pub use window::{now_timestamp, resolve_window, Period, TimeWindow, DATE_FORMAT, TIMESTAMP_FORMAT};
