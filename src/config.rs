//! Runtime configuration
//!
//! Read once from the environment at startup.

use std::path::PathBuf;

use crate::analytics::Period;

pub const DATABASE_PATH_VAR: &str = "HEALTH_MONITOR_DATABASE_PATH";
pub const DEFAULT_PERIOD_VAR: &str = "HEALTH_MONITOR_DEFAULT_PERIOD";
pub const HISTORY_PAGE_SIZE_VAR: &str = "HEALTH_MONITOR_HISTORY_PAGE_SIZE";

/// Records per page in the history listing
pub const DEFAULT_HISTORY_PAGE_SIZE: i64 = 10;
pub const MAX_HISTORY_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Period new users start with as their default view
    pub default_period: Period,
    pub history_page_size: i64,
}

impl AppConfig {
    /// Build the configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            database_path: database_path_from_env(),
            default_period: parse_default_period(std::env::var(DEFAULT_PERIOD_VAR).ok()),
            history_page_size: parse_history_page_size(std::env::var(HISTORY_PAGE_SIZE_VAR).ok()),
        }
    }
}

/// Unset gives `month`; an unknown name also gives `month`, with a warning
fn parse_default_period(raw: Option<String>) -> Period {
    Period::parse_or_default(raw.as_deref())
}

/// Unset, non-numeric or non-positive values give the default; large values
/// are capped at `MAX_HISTORY_PAGE_SIZE`
fn parse_history_page_size(raw: Option<String>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_HISTORY_PAGE_SIZE;
    };

    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => n.min(MAX_HISTORY_PAGE_SIZE),
        _ => {
            tracing::warn!(
                value = %raw,
                "Invalid {}, using {}",
                HISTORY_PAGE_SIZE_VAR,
                DEFAULT_HISTORY_PAGE_SIZE
            );
            DEFAULT_HISTORY_PAGE_SIZE
        }
    }
}

/// Get the database path from environment or use `<project root>/data/health_monitor.db`
fn database_path_from_env() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("health_monitor.db");
            path
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period_parsing() {
        assert_eq!(parse_default_period(None), Period::Month);
        assert_eq!(parse_default_period(Some("week".to_string())), Period::Week);
        assert_eq!(parse_default_period(Some(" Quarter ".to_string())), Period::Quarter);
        assert_eq!(parse_default_period(Some("7d".to_string())), Period::Week);
        assert_eq!(parse_default_period(Some("fortnight".to_string())), Period::Month);
        assert_eq!(parse_default_period(Some(String::new())), Period::Month);
    }

    #[test]
    fn test_history_page_size_parsing() {
        assert_eq!(parse_history_page_size(None), DEFAULT_HISTORY_PAGE_SIZE);
        assert_eq!(parse_history_page_size(Some("25".to_string())), 25);
        assert_eq!(parse_history_page_size(Some(" 5 ".to_string())), 5);
        assert_eq!(parse_history_page_size(Some("0".to_string())), DEFAULT_HISTORY_PAGE_SIZE);
        assert_eq!(parse_history_page_size(Some("-3".to_string())), DEFAULT_HISTORY_PAGE_SIZE);
        assert_eq!(parse_history_page_size(Some("lots".to_string())), DEFAULT_HISTORY_PAGE_SIZE);
        assert_eq!(parse_history_page_size(Some("5000".to_string())), MAX_HISTORY_PAGE_SIZE);
    }

    #[test]
    fn test_default_database_file_name() {
        let path = database_path_from_env();
        if std::env::var(DATABASE_PATH_VAR).is_err() {
            assert!(path.ends_with("data/health_monitor.db"));
        }
    }
}
