//! Health Monitor Status Tool
//!
//! Runtime status of the service plus the usage guide served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# Health Monitor Usage Instructions

The Health Monitor stores daily health measurements per user and reports
statistics, trends and demographic reference ranges over time windows.

## Users

Every record belongs to a user. Create one first:

```
create_user(username: "jane", email: "jane@example.com",
            gender: "female", date_of_birth: "1980-06-15")
```

Gender (`male`, `female`, `other`, `prefer_not_to_say`) and date of birth are
optional, but baselines are only available when both are set. Update them later
with `update_user_profile`. Display settings (`show_baselines`,
`default_period`) live in `update_user_settings`.

## Logging Records

```
add_health_record(user_id: 1, weight: 72.4,
                  blood_pressure_systolic: 121, blood_pressure_diastolic: 79,
                  heart_rate: 64, sleep_duration: 7.5, mood: "calm")
```

- Every metric is optional; omit what was not measured. Never send 0 for
  "not measured".
- Systolic and diastolic must be sent together.
- `timestamp` accepts `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` or
  `YYYY-MM-DD` and defaults to now.
- Records can only be read, changed or deleted by the user who owns them.
- `list_health_history(user_id: 1, page: 2)` pages through records newest
  first; `page_size` overrides the server default.

### Accepted Ranges

| Field | Range |
|-------|-------|
| weight (kg) | 0 - 500 |
| blood_pressure_systolic (mmHg) | 60 - 250 |
| blood_pressure_diastolic (mmHg) | 40 - 150 |
| heart_rate (bpm) | 30 - 220 |
| temperature (C) | 35 - 42 |
| oxygen_saturation (%) | 70 - 100 |
| steps | 0 - 100000 |
| exercise_duration (min) | 0 - 1440 |
| calories_burned (kcal) | 0 - 10000 |
| sleep_duration (h) | 0 - 24 |
| sleep_quality | 1 - 10 |
| water_intake (l) | 0 - 10 |
| calorie_intake (kcal) | 0 - 10000 |
| stress_level | 1 - 10 |

Moods: happy, energetic, calm, neutral, tired, stressed, sad, anxious.

## Statistics and Trends

```
get_metric_statistics(user_id: 1, metric: "weight", period: "week",
                      reference_date: "2024-03-15")
```

- Periods: `week` (7 days), `month` (30 days), `quarter` (90 days). The window
  ends on `reference_date` (default today) and includes it.
- Without a period the user's `default_period` is used.
- Results include average, minimum, maximum, latest value and a trend
  (`up`, `down`, `neutral`) fitted to the last three readings.
- `N/A` means nothing was recorded in the window.
- Blood pressure is reported as `systolic/diastolic`; its trend follows
  systolic only.
- `previous_anchor` and `next_anchor` are the reference dates of the
  neighbouring windows.

## Charts

`generate_metric_chart` takes the same window parameters plus a `file_path`
and writes a PNG there.

## Baselines

`lookup_baseline(gender: "male", age: 45, metric: "weight")` returns the
reference range for that demographic. Baselines exist for weight, heart_rate,
blood_pressure, steps and sleep_duration, for male and female, ages 18 and up.

## Dashboard

`get_dashboard(user_id: 1)` returns recent records, the latest weight, steps
and heart rate, applicable baselines and week-over-week changes.
"#;

/// Runtime status of the Health Monitor service
#[derive(Debug, Clone, Serialize)]
pub struct HealthMonitorStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> HealthMonitorStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        HealthMonitorStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/health_monitor.db"));
        let status = tracker.get_status();

        assert_eq!(status.process_id, std::process::id());
        assert!(status.database_size_bytes.is_none());
        assert!(status.database_path.ends_with("health_monitor.db"));
    }

    #[test]
    fn test_instructions_cover_every_metric() {
        for metric in crate::analytics::Metric::ALL {
            if !metric.is_composite() {
                assert!(
                    USAGE_INSTRUCTIONS.contains(metric.as_str()),
                    "{} missing from instructions",
                    metric.as_str()
                );
            }
        }
    }
}
