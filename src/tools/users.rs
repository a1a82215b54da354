//! User MCP Tools
//!
//! Tools for registering users and managing their profile and settings.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::analytics::{Gender, Period};
use crate::db::Database;
use crate::models::{HealthRecord, User, UserCreate, ValidationError};

/// Confirmation phrase required by delete_user
pub const DELETE_CONFIRMATION: &str = "DELETE";

/// User detail with computed fields
#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub age: Option<i32>,
    pub show_baselines: bool,
    pub default_period: Period,
    pub record_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Response for delete_user
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub deleted_records: i64,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn parse_gender(gender: &str) -> Result<Gender, String> {
    Gender::from_str(gender)
        .ok_or_else(|| ValidationError::InvalidGender(gender.to_string()).to_string())
}

/// Fetch a user or fail with a not-found message
pub(crate) fn require_user(conn: &Connection, id: i64) -> Result<User, String> {
    User::get_by_id(conn, id)
        .map_err(|e| format!("Failed to get user: {}", e))?
        .ok_or_else(|| format!("User not found with id: {}", id))
}

fn user_detail(conn: &Connection, user: User) -> Result<UserDetail, String> {
    let record_count = HealthRecord::count_for_user(conn, user.id)
        .map_err(|e| format!("Failed to count records: {}", e))?;
    let age = user.age_on(today());

    Ok(UserDetail {
        id: user.id,
        username: user.username,
        email: user.email,
        gender: user.gender,
        date_of_birth: user.date_of_birth,
        age,
        show_baselines: user.show_baselines,
        default_period: user.default_period,
        record_count,
        created_at: user.created_at,
        updated_at: user.updated_at,
    })
}

/// Register a new user. `default_period` seeds their period setting.
pub fn create_user(
    db: &Database,
    username: &str,
    email: &str,
    gender: Option<&str>,
    date_of_birth: Option<&str>,
    default_period: Period,
) -> Result<UserDetail, String> {
    let data = UserCreate {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        gender: gender.map(parse_gender).transpose()?,
        date_of_birth: date_of_birth.map(|d| d.trim().to_string()),
        default_period,
    };
    data.validate(today()).map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let taken = User::exists(&conn, &data.username, &data.email)
        .map_err(|e| format!("Failed to check existing users: {}", e))?;
    if taken {
        return Err(format!(
            "A user with username '{}' or email '{}' already exists",
            data.username, data.email
        ));
    }

    let user = User::create(&conn, &data).map_err(|e| format!("Failed to create user: {}", e))?;
    tracing::info!(user_id = user.id, username = %user.username, "Created user");

    user_detail(&conn, user)
}

/// Get a user with computed age and record count
pub fn get_user(db: &Database, id: i64) -> Result<Option<UserDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = User::get_by_id(&conn, id).map_err(|e| format!("Failed to get user: {}", e))?;

    user.map(|u| user_detail(&conn, u)).transpose()
}

/// Update gender and/or date of birth
pub fn update_user_profile(
    db: &Database,
    id: i64,
    gender: Option<&str>,
    date_of_birth: Option<&str>,
) -> Result<Option<UserDetail>, String> {
    let gender = gender.map(parse_gender).transpose()?;
    if let Some(dob) = date_of_birth {
        crate::models::validation::validate_date_of_birth(dob, today())
            .map_err(|e| e.to_string())?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = User::update_profile(&conn, id, gender, date_of_birth)
        .map_err(|e| format!("Failed to update user profile: {}", e))?;

    user.map(|u| user_detail(&conn, u)).transpose()
}

/// Update display settings
pub fn update_user_settings(
    db: &Database,
    id: i64,
    show_baselines: Option<bool>,
    default_period: Option<&str>,
) -> Result<Option<UserDetail>, String> {
    let default_period = default_period
        .map(|p| {
            Period::from_str(p)
                .ok_or_else(|| ValidationError::InvalidPeriod(p.to_string()).to_string())
        })
        .transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let user = User::update_settings(&conn, id, show_baselines, default_period)
        .map_err(|e| format!("Failed to update user settings: {}", e))?;

    user.map(|u| user_detail(&conn, u)).transpose()
}

/// Delete a user and every record they own
pub fn delete_user(db: &Database, id: i64, confirm: &str) -> Result<DeleteUserResponse, String> {
    if confirm != DELETE_CONFIRMATION {
        return Err(format!(
            "Deleting a user removes all of their health records. Pass confirm=\"{}\" to proceed.",
            DELETE_CONFIRMATION
        ));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    require_user(&conn, id)?;
    let deleted_records = HealthRecord::count_for_user(&conn, id)
        .map_err(|e| format!("Failed to count records: {}", e))?;

    let deleted = User::delete(&conn, id).map_err(|e| format!("Failed to delete user: {}", e))?;
    if deleted {
        tracing::info!(user_id = id, deleted_records, "Deleted user");
    }

    Ok(DeleteUserResponse {
        success: deleted,
        deleted_id: id,
        deleted_records,
    })
}
