//! User model
//!
//! Profile data used for baseline comparison plus per-user display settings.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::validation::{
    validate_date_of_birth, validate_email, validate_username, ValidationError,
};
use crate::analytics::{age_on, now_timestamp, Gender, Period, DATE_FORMAT};
use crate::db::DbResult;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub show_baselines: bool,
    pub default_period: Period,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub default_period: Period,
}

impl UserCreate {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if let Some(ref dob) = self.date_of_birth {
            validate_date_of_birth(dob, today)?;
        }
        Ok(())
    }
}

impl User {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let gender: Option<String> = row.get("gender")?;
        let default_period: String = row.get("default_period")?;

        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            gender: gender.as_deref().and_then(Gender::from_str),
            date_of_birth: row.get("date_of_birth")?,
            show_baselines: row.get("show_baselines")?,
            default_period: Period::from_str(&default_period).unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a new user. Expects input that passed `UserCreate::validate`.
    pub fn create(conn: &Connection, data: &UserCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO users (
                username, email, gender, date_of_birth, default_period, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                data.username,
                data.email,
                data.gender.map(|g| g.as_str()),
                data.date_of_birth.as_deref().map(str::trim),
                data.default_period.as_str(),
                now_timestamp(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a user by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by username (case-insensitive)
    pub fn get_by_username(conn: &Connection, username: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE username = ?1 COLLATE NOCASE")?;

        let result = stmt.query_row([username], Self::from_row);
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a username or email is already registered
    pub fn exists(conn: &Connection, username: &str, email: &str) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users \
             WHERE username = ?1 COLLATE NOCASE OR email = ?2 COLLATE NOCASE",
            params![username, email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Update gender and date of birth; `None` leaves a field untouched
    pub fn update_profile(
        conn: &Connection,
        id: i64,
        gender: Option<Gender>,
        date_of_birth: Option<&str>,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(g) = gender {
            updates.push(format!("gender = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(g.as_str()));
        }
        if let Some(dob) = date_of_birth {
            updates.push(format!("date_of_birth = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(dob.trim().to_string()));
        }

        Self::apply_update(conn, id, updates, params_vec)
    }

    /// Update display settings; `None` leaves a field untouched
    pub fn update_settings(
        conn: &Connection,
        id: i64,
        show_baselines: Option<bool>,
        default_period: Option<Period>,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(show) = show_baselines {
            updates.push(format!("show_baselines = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(show));
        }
        if let Some(period) = default_period {
            updates.push(format!("default_period = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(period.as_str()));
        }

        Self::apply_update(conn, id, updates, params_vec)
    }

    fn apply_update(
        conn: &Connection,
        id: i64,
        mut updates: Vec<String>,
        mut params_vec: Vec<Box<dyn rusqlite::ToSql>>,
    ) -> DbResult<Option<Self>> {
        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push(format!("updated_at = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(now_timestamp()));

        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a user; their health records go with them
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    pub fn date_of_birth_parsed(&self) -> Option<NaiveDate> {
        self.date_of_birth
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
    }

    /// Age in whole years on `on`, if the date of birth is known
    pub fn age_on(&self, on: NaiveDate) -> Option<i32> {
        self.date_of_birth_parsed().and_then(|dob| age_on(dob, on))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::TIMESTAMP_FORMAT;
    use crate::db::migrations::run_migrations;
    use crate::models::{HealthMetrics, HealthRecord, HealthRecordCreate};
    use chrono::NaiveDateTime;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn jane() -> UserCreate {
        UserCreate {
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            gender: Some(Gender::Female),
            date_of_birth: Some("1980-06-15".to_string()),
            default_period: Period::Month,
        }
    }

    #[test]
    fn test_create_with_defaults() {
        let conn = setup();
        let user = User::create(&conn, &jane()).unwrap();

        assert_eq!(user.username, "jane");
        assert_eq!(user.gender, Some(Gender::Female));
        assert!(user.show_baselines);
        assert_eq!(user.default_period, Period::Month);

        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        assert_eq!(user.age_on(today), Some(43));
    }

    #[test]
    fn test_duplicate_detection() {
        let conn = setup();
        User::create(&conn, &jane()).unwrap();

        assert!(User::exists(&conn, "JANE", "other@example.com").unwrap());
        assert!(User::exists(&conn, "someone", "jane@example.com").unwrap());
        assert!(!User::exists(&conn, "someone", "else@example.com").unwrap());
        assert!(User::create(&conn, &jane()).is_err());
    }

    #[test]
    fn test_validation() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(jane().validate(today).is_ok());

        let bad_email = UserCreate {
            email: "not-an-email".to_string(),
            ..jane()
        };
        assert!(matches!(bad_email.validate(today), Err(ValidationError::InvalidEmail(_))));

        let unborn = UserCreate {
            date_of_birth: Some("2025-01-01".to_string()),
            ..jane()
        };
        assert!(matches!(unborn.validate(today), Err(ValidationError::FutureDateOfBirth(_))));
    }

    #[test]
    fn test_update_profile_and_settings() {
        let conn = setup();
        let user = User::create(&conn, &jane()).unwrap();

        let updated = User::update_profile(&conn, user.id, None, Some("1990-01-01"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.gender, Some(Gender::Female));
        assert_eq!(updated.date_of_birth.as_deref(), Some("1990-01-01"));

        let updated = User::update_settings(&conn, user.id, Some(false), Some(Period::Week))
            .unwrap()
            .unwrap();
        assert!(!updated.show_baselines);
        assert_eq!(updated.default_period, Period::Week);

        assert!(User::update_settings(&conn, 999, Some(true), None).unwrap().is_none());
    }

    #[test]
    fn test_delete_cascades_to_records() {
        let conn = setup();
        let user = User::create(&conn, &jane()).unwrap();
        let data = HealthRecordCreate {
            timestamp: Some("2024-03-15T08:00:00".to_string()),
            metrics: HealthMetrics {
                weight: Some(65.0),
                ..Default::default()
            },
        };
        HealthRecord::create(&conn, user.id, &data).unwrap();

        assert!(User::delete(&conn, user.id).unwrap());
        assert_eq!(HealthRecord::count_for_user(&conn, user.id).unwrap(), 0);
        assert!(User::get_by_id(&conn, user.id).unwrap().is_none());
    }

    #[test]
    fn test_audit_timestamps_use_storage_format() {
        let conn = setup();
        let user = User::create(&conn, &jane()).unwrap();
        let updated = User::update_settings(&conn, user.id, Some(false), None)
            .unwrap()
            .unwrap();

        for ts in [&user.created_at, &updated.updated_at] {
            let parsed = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT);
            assert!(parsed.is_ok(), "{}", ts);
        }
    }
}
