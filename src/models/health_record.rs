//! Health record model
//!
//! One timestamped entry per row. Every metric is optional; a missing value
//! means "not recorded", never zero.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::validation::{
    check_range_f64, check_range_i64, normalize_timestamp, sanitize_notes, ValidationError,
};
use crate::analytics::{now_timestamp, Metric};
use crate::db::DbResult;

/// Self-reported mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Energetic,
    Calm,
    Neutral,
    Tired,
    Stressed,
    Sad,
    Anxious,
}

impl Mood {
    pub const ALL: [Mood; 8] = [
        Mood::Happy,
        Mood::Energetic,
        Mood::Calm,
        Mood::Neutral,
        Mood::Tired,
        Mood::Stressed,
        Mood::Sad,
        Mood::Anxious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
            Mood::Tired => "tired",
            Mood::Stressed => "stressed",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Mood::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Parse a mood name, rejecting anything outside the fixed set
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Mood::from_str(s).ok_or_else(|| {
            let valid = Mood::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
            ValidationError::InvalidMood(s.to_string(), valid)
        })
    }
}

/// A logged health record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: String,
    pub weight: Option<f64>,
    pub blood_pressure_systolic: Option<i64>,
    pub blood_pressure_diastolic: Option<i64>,
    pub heart_rate: Option<i64>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub steps: Option<i64>,
    pub exercise_duration: Option<i64>,
    pub calories_burned: Option<i64>,
    pub sleep_duration: Option<f64>,
    pub sleep_quality: Option<i64>,
    pub water_intake: Option<f64>,
    pub calorie_intake: Option<i64>,
    pub stress_level: Option<i64>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Metric values shared by create and update requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub weight: Option<f64>,
    pub blood_pressure_systolic: Option<i64>,
    pub blood_pressure_diastolic: Option<i64>,
    pub heart_rate: Option<i64>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<f64>,
    pub steps: Option<i64>,
    pub exercise_duration: Option<i64>,
    pub calories_burned: Option<i64>,
    pub sleep_duration: Option<f64>,
    pub sleep_quality: Option<i64>,
    pub water_intake: Option<f64>,
    pub calorie_intake: Option<i64>,
    pub stress_level: Option<i64>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
}

impl HealthMetrics {
    /// Check every present value against its accepted range
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range_f64("weight", self.weight, 0.0, 500.0)?;
        check_range_i64("blood_pressure_systolic", self.blood_pressure_systolic, 60, 250)?;
        check_range_i64("blood_pressure_diastolic", self.blood_pressure_diastolic, 40, 150)?;
        check_range_i64("heart_rate", self.heart_rate, 30, 220)?;
        check_range_f64("temperature", self.temperature, 35.0, 42.0)?;
        check_range_f64("oxygen_saturation", self.oxygen_saturation, 70.0, 100.0)?;
        check_range_i64("steps", self.steps, 0, 100_000)?;
        check_range_i64("exercise_duration", self.exercise_duration, 0, 1440)?;
        check_range_i64("calories_burned", self.calories_burned, 0, 10_000)?;
        check_range_f64("sleep_duration", self.sleep_duration, 0.0, 24.0)?;
        check_range_i64("sleep_quality", self.sleep_quality, 1, 10)?;
        check_range_f64("water_intake", self.water_intake, 0.0, 10.0)?;
        check_range_i64("calorie_intake", self.calorie_intake, 0, 10_000)?;
        check_range_i64("stress_level", self.stress_level, 1, 10)?;

        if self.blood_pressure_systolic.is_some() != self.blood_pressure_diastolic.is_some() {
            return Err(ValidationError::IncompleteBloodPressure);
        }

        Ok(())
    }

    fn sanitized(mut self) -> Self {
        self.notes = sanitize_notes(self.notes.as_deref());
        self
    }
}

/// Data for creating a new health record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthRecordCreate {
    /// Defaults to the current local time
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub metrics: HealthMetrics,
}

impl HealthRecordCreate {
    /// Validate ranges and normalize the timestamp and notes
    pub fn validated(self) -> Result<Self, ValidationError> {
        self.metrics.validate()?;
        let timestamp = self
            .timestamp
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(normalize_timestamp)
            .transpose()?;

        Ok(Self {
            timestamp,
            metrics: self.metrics.sanitized(),
        })
    }
}

/// Data for updating a health record; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthRecordUpdate {
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub metrics: HealthMetrics,
}

impl HealthRecordUpdate {
    pub fn validated(self) -> Result<Self, ValidationError> {
        self.metrics.validate()?;
        let timestamp = self.timestamp.as_deref().map(normalize_timestamp).transpose()?;
        let notes_given = self.metrics.notes.is_some();
        let mut metrics = self.metrics.sanitized();
        // Blank notes on update clear the field
        if notes_given && metrics.notes.is_none() {
            metrics.notes = Some(String::new());
        }
        Ok(Self { timestamp, metrics })
    }
}

impl HealthRecord {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let mood: Option<String> = row.get("mood")?;

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            timestamp: row.get("timestamp")?,
            weight: row.get("weight")?,
            blood_pressure_systolic: row.get("blood_pressure_systolic")?,
            blood_pressure_diastolic: row.get("blood_pressure_diastolic")?,
            heart_rate: row.get("heart_rate")?,
            temperature: row.get("temperature")?,
            oxygen_saturation: row.get("oxygen_saturation")?,
            steps: row.get("steps")?,
            exercise_duration: row.get("exercise_duration")?,
            calories_burned: row.get("calories_burned")?,
            sleep_duration: row.get("sleep_duration")?,
            sleep_quality: row.get("sleep_quality")?,
            water_intake: row.get("water_intake")?,
            calorie_intake: row.get("calorie_intake")?,
            stress_level: row.get("stress_level")?,
            mood: mood.as_deref().and_then(Mood::from_str),
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Blank record for building test fixtures
    #[cfg(test)]
    pub(crate) fn empty(user_id: i64, timestamp: &str) -> Self {
        Self {
            id: 0,
            user_id,
            timestamp: timestamp.to_string(),
            weight: None,
            blood_pressure_systolic: None,
            blood_pressure_diastolic: None,
            heart_rate: None,
            temperature: None,
            oxygen_saturation: None,
            steps: None,
            exercise_duration: None,
            calories_burned: None,
            sleep_duration: None,
            sleep_quality: None,
            water_intake: None,
            calorie_intake: None,
            stress_level: None,
            mood: None,
            notes: None,
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
        }
    }

    /// Create a new health record. Expects input that has been through
    /// `HealthRecordCreate::validated`.
    pub fn create(conn: &Connection, user_id: i64, data: &HealthRecordCreate) -> DbResult<Self> {
        let now = now_timestamp();
        let timestamp = data.timestamp.clone().unwrap_or_else(|| now.clone());
        let m = &data.metrics;

        conn.execute(
            r#"
            INSERT INTO health_records (
                user_id, timestamp, weight, blood_pressure_systolic, blood_pressure_diastolic,
                heart_rate, temperature, oxygen_saturation, steps, exercise_duration,
                calories_burned, sleep_duration, sleep_quality, water_intake, calorie_intake,
                stress_level, mood, notes, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                    ?19, ?19)
            "#,
            params![
                user_id,
                timestamp,
                m.weight,
                m.blood_pressure_systolic,
                m.blood_pressure_diastolic,
                m.heart_rate,
                m.temperature,
                m.oxygen_saturation,
                m.steps,
                m.exercise_duration,
                m.calories_burned,
                m.sleep_duration,
                m.sleep_quality,
                m.water_intake,
                m.calorie_intake,
                m.stress_level,
                m.mood.map(|mood| mood.as_str()),
                m.notes,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a health record by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM health_records WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Records for a user within `[start, end]`, oldest first
    pub fn list_in_range(
        conn: &Connection,
        user_id: i64,
        start: &str,
        end: &str,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM health_records
            WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            ORDER BY timestamp ASC, id ASC
            "#,
        )?;
        let records = stmt
            .query_map(params![user_id, start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Most recent records for a user, newest first
    pub fn list_recent(conn: &Connection, user_id: i64, limit: i64) -> DbResult<Vec<Self>> {
        Self::list_page(conn, user_id, limit, 0)
    }

    /// One page of a user's history, newest first
    pub fn list_page(
        conn: &Connection,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM health_records
            WHERE user_id = ?1
            ORDER BY timestamp DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let records = stmt
            .query_map(params![user_id, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count_for_user(conn: &Connection, user_id: i64) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM health_records WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Latest record that has `metric` recorded
    pub fn latest_with_metric(
        conn: &Connection,
        user_id: i64,
        metric: Metric,
    ) -> DbResult<Option<Self>> {
        // Column names come from the static metric table
        let sql = format!(
            "SELECT * FROM health_records WHERE user_id = ?1 AND {} IS NOT NULL \
             ORDER BY timestamp DESC, id DESC LIMIT 1",
            metric.spec().column
        );
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Latest record strictly before `timestamp`
    pub fn latest_before(
        conn: &Connection,
        user_id: i64,
        timestamp: &str,
    ) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM health_records
            WHERE user_id = ?1 AND timestamp < ?2
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )?;

        let result = stmt.query_row(params![user_id, timestamp], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a health record. Expects input that has been through
    /// `HealthRecordUpdate::validated`.
    pub fn update(conn: &Connection, id: i64, data: &HealthRecordUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        let mut set = |column: &str, value: Box<dyn rusqlite::ToSql>| {
            updates.push(format!("{} = ?{}", column, params_vec.len() + 1));
            params_vec.push(value);
        };

        let m = &data.metrics;
        if let Some(ref ts) = data.timestamp {
            set("timestamp", Box::new(ts.clone()));
        }
        if let Some(v) = m.weight {
            set("weight", Box::new(v));
        }
        if let Some(v) = m.blood_pressure_systolic {
            set("blood_pressure_systolic", Box::new(v));
        }
        if let Some(v) = m.blood_pressure_diastolic {
            set("blood_pressure_diastolic", Box::new(v));
        }
        if let Some(v) = m.heart_rate {
            set("heart_rate", Box::new(v));
        }
        if let Some(v) = m.temperature {
            set("temperature", Box::new(v));
        }
        if let Some(v) = m.oxygen_saturation {
            set("oxygen_saturation", Box::new(v));
        }
        if let Some(v) = m.steps {
            set("steps", Box::new(v));
        }
        if let Some(v) = m.exercise_duration {
            set("exercise_duration", Box::new(v));
        }
        if let Some(v) = m.calories_burned {
            set("calories_burned", Box::new(v));
        }
        if let Some(v) = m.sleep_duration {
            set("sleep_duration", Box::new(v));
        }
        if let Some(v) = m.sleep_quality {
            set("sleep_quality", Box::new(v));
        }
        if let Some(v) = m.water_intake {
            set("water_intake", Box::new(v));
        }
        if let Some(v) = m.calorie_intake {
            set("calorie_intake", Box::new(v));
        }
        if let Some(v) = m.stress_level {
            set("stress_level", Box::new(v));
        }
        if let Some(mood) = m.mood {
            set("mood", Box::new(mood.as_str()));
        }
        if let Some(ref notes) = m.notes {
            let value: Option<String> = (!notes.is_empty()).then(|| notes.clone());
            set("notes", Box::new(value));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push(format!("updated_at = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(now_timestamp()));

        let sql = format!(
            "UPDATE health_records SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a health record
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM health_records WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Whether any metric is recorded on this entry
    pub fn has_any_metric(&self) -> bool {
        Metric::ALL.iter().any(|m| m.value(self).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email) VALUES ('jane', 'jane@example.com')",
            [],
        )
        .unwrap();
        conn
    }

    fn create_at(conn: &Connection, timestamp: &str, metrics: HealthMetrics) -> HealthRecord {
        let data = HealthRecordCreate {
            timestamp: Some(timestamp.to_string()),
            metrics,
        }
        .validated()
        .unwrap();
        HealthRecord::create(conn, 1, &data).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let conn = setup();
        let record = create_at(
            &conn,
            "2024-03-15 08:30:00",
            HealthMetrics {
                weight: Some(72.5),
                blood_pressure_systolic: Some(120),
                blood_pressure_diastolic: Some(80),
                mood: Some(Mood::Calm),
                notes: Some("  morning \0".to_string()),
                ..Default::default()
            },
        );

        let fetched = HealthRecord::get_by_id(&conn, record.id).unwrap().unwrap();
        assert_eq!(fetched.timestamp, "2024-03-15T08:30:00");
        assert_eq!(fetched.weight, Some(72.5));
        assert_eq!(fetched.blood_pressure_diastolic, Some(80));
        assert_eq!(fetched.heart_rate, None);
        assert_eq!(fetched.mood, Some(Mood::Calm));
        assert_eq!(fetched.notes.as_deref(), Some("morning"));
        assert!(fetched.has_any_metric());
    }

    #[test]
    fn test_create_defaults_timestamp_to_now() {
        let conn = setup();
        let data = HealthRecordCreate {
            timestamp: None,
            metrics: HealthMetrics {
                steps: Some(4000),
                ..Default::default()
            },
        }
        .validated()
        .unwrap();
        let record = HealthRecord::create(&conn, 1, &data).unwrap();
        assert!(normalize_timestamp(&record.timestamp).is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range_and_half_pairs() {
        let too_fast = HealthMetrics {
            heart_rate: Some(250),
            ..Default::default()
        };
        assert!(matches!(
            too_fast.validate(),
            Err(ValidationError::OutOfRange { field: "heart_rate", .. })
        ));

        let half_bp = HealthMetrics {
            blood_pressure_systolic: Some(120),
            ..Default::default()
        };
        assert_eq!(half_bp.validate(), Err(ValidationError::IncompleteBloodPressure));

        let bad_ts = HealthRecordCreate {
            timestamp: Some("15/03/2024".to_string()),
            metrics: HealthMetrics::default(),
        };
        assert!(matches!(bad_ts.validated(), Err(ValidationError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_mood_parsing() {
        assert_eq!(Mood::parse("Happy").unwrap(), Mood::Happy);
        let err = Mood::parse("ecstatic").unwrap_err();
        assert!(err.to_string().contains("anxious"));
    }

    #[test]
    fn test_range_query_is_inclusive_and_ordered() {
        let conn = setup();
        create_at(&conn, "2024-03-15T23:59:59", HealthMetrics::default());
        create_at(&conn, "2024-03-09T00:00:00", HealthMetrics::default());
        create_at(&conn, "2024-03-08T23:59:59", HealthMetrics::default());
        create_at(&conn, "2024-03-12T12:00:00", HealthMetrics::default());

        let records =
            HealthRecord::list_in_range(&conn, 1, "2024-03-09T00:00:00", "2024-03-15T23:59:59")
                .unwrap();
        let stamps: Vec<&str> = records.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(
            stamps,
            vec!["2024-03-09T00:00:00", "2024-03-12T12:00:00", "2024-03-15T23:59:59"]
        );
    }

    #[test]
    fn test_paging_and_latest_queries() {
        let conn = setup();
        for day in 1..=12 {
            let metrics = HealthMetrics {
                weight: (day % 2 == 0).then_some(70.0 + day as f64),
                ..Default::default()
            };
            create_at(&conn, &format!("2024-03-{:02}T08:00:00", day), metrics);
        }

        assert_eq!(HealthRecord::count_for_user(&conn, 1).unwrap(), 12);

        let first = HealthRecord::list_page(&conn, 1, 10, 0).unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].timestamp, "2024-03-12T08:00:00");
        let second = HealthRecord::list_page(&conn, 1, 10, 10).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].timestamp, "2024-03-01T08:00:00");

        let latest_weight = HealthRecord::latest_with_metric(&conn, 1, Metric::Weight)
            .unwrap()
            .unwrap();
        assert_eq!(latest_weight.weight, Some(82.0));

        let none = HealthRecord::latest_with_metric(&conn, 1, Metric::Steps).unwrap();
        assert!(none.is_none());

        let before = HealthRecord::latest_before(&conn, 1, "2024-03-05T08:00:00")
            .unwrap()
            .unwrap();
        assert_eq!(before.timestamp, "2024-03-04T08:00:00");
    }

    #[test]
    fn test_update_touches_only_given_fields() {
        let conn = setup();
        let record = create_at(
            &conn,
            "2024-03-15T08:00:00",
            HealthMetrics {
                weight: Some(72.0),
                steps: Some(8000),
                notes: Some("walk".to_string()),
                ..Default::default()
            },
        );

        let update = HealthRecordUpdate {
            metrics: HealthMetrics {
                steps: Some(9500),
                notes: Some("   ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
        .validated()
        .unwrap();

        let updated = HealthRecord::update(&conn, record.id, &update).unwrap().unwrap();
        assert_eq!(updated.steps, Some(9500));
        assert_eq!(updated.weight, Some(72.0));
        assert_eq!(updated.notes, None);
    }

    #[test]
    fn test_delete() {
        let conn = setup();
        let record = create_at(&conn, "2024-03-15T08:00:00", HealthMetrics::default());
        assert!(HealthRecord::delete(&conn, record.id).unwrap());
        assert!(!HealthRecord::delete(&conn, record.id).unwrap());
        assert!(HealthRecord::get_by_id(&conn, record.id).unwrap().is_none());
    }

    #[test]
    fn test_audit_timestamps_use_storage_format() {
        let conn = setup();
        let record = create_at(&conn, "2024-03-15T08:30:00", HealthMetrics::default());
        let parses = |ts: &str| {
            chrono::NaiveDateTime::parse_from_str(ts, crate::analytics::TIMESTAMP_FORMAT).is_ok()
        };
        assert!(parses(&record.created_at), "{}", record.created_at);

        let update = HealthRecordUpdate {
            metrics: HealthMetrics {
                heart_rate: Some(62),
                ..Default::default()
            },
            ..Default::default()
        };
        let updated = HealthRecord::update(&conn, record.id, &update).unwrap().unwrap();
        assert!(parses(&updated.updated_at), "{}", updated.updated_at);
        assert!(updated.updated_at >= record.created_at);
    }
}
