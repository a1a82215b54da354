//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;
use crate::models::DemographicBaseline;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version,
/// then seed reference data that is still missing
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    let seeded = DemographicBaseline::seed_defaults(conn)?;
    if seeded > 0 {
        tracing::info!(rows = seeded, "Seeded demographic baselines");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- USERS
        -- Profile data used for baseline comparison
        -- ============================================
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            gender TEXT CHECK(gender IN ('male', 'female', 'other', 'prefer_not_to_say')),
            date_of_birth TEXT,                  -- ISO date: "1980-05-17"

            -- Settings
            show_baselines INTEGER NOT NULL DEFAULT 1,
            default_period TEXT NOT NULL DEFAULT 'month'
                CHECK(default_period IN ('week', 'month', 'quarter')),

            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S', 'now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S', 'now', 'localtime'))
        );

        -- ============================================
        -- HEALTH RECORDS
        -- One row per logged entry; every metric is optional
        -- ============================================
        CREATE TABLE health_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            timestamp TEXT NOT NULL,             -- "2024-03-15T08:30:00"

            -- Physical measurements
            weight REAL,                         -- kg
            blood_pressure_systolic INTEGER,     -- mmHg
            blood_pressure_diastolic INTEGER,    -- mmHg
            heart_rate INTEGER,                  -- bpm
            temperature REAL,                    -- Celsius
            oxygen_saturation REAL,              -- percent

            -- Activity
            steps INTEGER,
            exercise_duration INTEGER,           -- minutes
            calories_burned INTEGER,

            -- Sleep
            sleep_duration REAL,                 -- hours
            sleep_quality INTEGER,               -- 1-10

            -- Nutrition
            water_intake REAL,                   -- liters
            calorie_intake INTEGER,

            -- Mental health
            stress_level INTEGER,                -- 1-10
            mood TEXT CHECK(mood IN ('happy', 'energetic', 'calm', 'neutral', 'tired', 'stressed', 'sad', 'anxious')),

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S', 'now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S', 'now', 'localtime')),

            -- Blood pressure is recorded as a pair or not at all
            CHECK ((blood_pressure_systolic IS NULL) = (blood_pressure_diastolic IS NULL))
        );

        CREATE INDEX idx_health_records_user_timestamp ON health_records(user_id, timestamp);

        -- ============================================
        -- DEMOGRAPHIC BASELINES
        -- Read-only reference ranges by gender x age group x metric
        -- ============================================
        CREATE TABLE demographic_baselines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            gender TEXT NOT NULL,
            age_group TEXT NOT NULL,             -- "18-29" .. "70+"
            metric_type TEXT NOT NULL,
            avg_value REAL NOT NULL,
            min_value REAL NOT NULL,
            max_value REAL NOT NULL,
            metadata_json TEXT,                  -- percentiles, stddev, sample size

            UNIQUE(gender, age_group, metric_type)
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
