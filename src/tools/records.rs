//! Health Record MCP Tools
//!
//! Tools for logging, reading, editing and paging through health records.
//! Every record operation is scoped to the owning user.

use rusqlite::Connection;
use serde::Serialize;

use super::users::require_user;
use crate::config::MAX_HISTORY_PAGE_SIZE;
use crate::db::Database;
use crate::models::{HealthRecord, HealthRecordCreate, HealthRecordUpdate};

/// Response for delete_health_record
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// One page of history, newest first
#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub user_id: i64,
    pub records: Vec<HealthRecord>,
    pub page: i64,
    pub page_size: i64,
    pub total_records: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Fetch a record owned by `user_id`. Another user's record is a permission
/// error, a missing record is `None`.
fn owned_record(conn: &Connection, user_id: i64, id: i64) -> Result<Option<HealthRecord>, String> {
    let record = HealthRecord::get_by_id(conn, id)
        .map_err(|e| format!("Failed to get health record: {}", e))?;

    match record {
        Some(r) if r.user_id != user_id => {
            tracing::warn!(record_id = id, user_id, "Rejected access to another user's record");
            Err(format!(
                "Permission denied: health record {} does not belong to user {}",
                id, user_id
            ))
        }
        other => Ok(other),
    }
}

/// Log a new health record
pub fn add_health_record(
    db: &Database,
    user_id: i64,
    data: HealthRecordCreate,
) -> Result<HealthRecord, String> {
    let data = data.validated().map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    require_user(&conn, user_id)?;

    let record = HealthRecord::create(&conn, user_id, &data)
        .map_err(|e| format!("Failed to create health record: {}", e))?;

    if !record.has_any_metric() {
        tracing::debug!(record_id = record.id, "Logged record without any metric");
    }

    Ok(record)
}

/// Get one of the user's records
pub fn get_health_record(
    db: &Database,
    user_id: i64,
    id: i64,
) -> Result<Option<HealthRecord>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    owned_record(&conn, user_id, id)
}

/// Update one of the user's records; fields left out are untouched
pub fn update_health_record(
    db: &Database,
    user_id: i64,
    id: i64,
    data: HealthRecordUpdate,
) -> Result<Option<HealthRecord>, String> {
    let data = data.validated().map_err(|e| e.to_string())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    if owned_record(&conn, user_id, id)?.is_none() {
        return Ok(None);
    }

    HealthRecord::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update health record: {}", e))
}

/// Delete one of the user's records
pub fn delete_health_record(
    db: &Database,
    user_id: i64,
    id: i64,
) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if owned_record(&conn, user_id, id)?.is_none() {
        return Err(format!("Health record not found with id: {}", id));
    }

    let deleted = HealthRecord::delete(&conn, id)
        .map_err(|e| format!("Failed to delete health record: {}", e))?;

    Ok(DeleteResponse {
        success: deleted,
        deleted_id: id,
    })
}

/// Page through the user's records, newest first. Pages start at 1; anything
/// lower is treated as 1. Page size is clamped to `1..=MAX_HISTORY_PAGE_SIZE`.
pub fn list_health_history(
    db: &Database,
    user_id: i64,
    page: i64,
    page_size: i64,
) -> Result<HistoryPage, String> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_HISTORY_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(page_size);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    require_user(&conn, user_id)?;

    let total_records = HealthRecord::count_for_user(&conn, user_id)
        .map_err(|e| format!("Failed to count records: {}", e))?;
    let records = HealthRecord::list_page(&conn, user_id, page_size, offset)
        .map_err(|e| format!("Failed to list records: {}", e))?;

    let total_pages = (total_records + page_size - 1) / page_size;

    Ok(HistoryPage {
        user_id,
        records,
        page,
        page_size,
        total_records,
        total_pages,
        has_previous: page > 1,
        has_next: page < total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Period;
    use crate::db::migrations::run_migrations;
    use crate::models::HealthMetrics;
    use crate::tools::users::create_user;

    fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();
        let jane = create_user(&db, "jane", "jane@example.com", None, None, Period::Month).unwrap();
        let john = create_user(&db, "john", "john@example.com", None, None, Period::Month).unwrap();
        (db, jane.id, john.id)
    }

    fn weight_at(timestamp: &str, weight: f64) -> HealthRecordCreate {
        HealthRecordCreate {
            timestamp: Some(timestamp.to_string()),
            metrics: HealthMetrics {
                weight: Some(weight),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_add_and_get_own_record() {
        let (db, jane, _) = setup();
        let record = add_health_record(&db, jane, weight_at("2024-03-15", 64.2)).unwrap();
        assert_eq!(record.timestamp, "2024-03-15T00:00:00");

        let fetched = get_health_record(&db, jane, record.id).unwrap().unwrap();
        assert_eq!(fetched.weight, Some(64.2));
        assert!(get_health_record(&db, jane, 999).unwrap().is_none());
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let (db, jane, _) = setup();
        let bad = HealthRecordCreate {
            metrics: HealthMetrics {
                oxygen_saturation: Some(50.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = add_health_record(&db, jane, bad).unwrap_err();
        assert!(err.contains("oxygen_saturation"));

        assert!(add_health_record(&db, 999, weight_at("2024-03-15", 64.2)).is_err());
    }

    #[test]
    fn test_other_users_records_are_off_limits() {
        let (db, jane, john) = setup();
        let record = add_health_record(&db, jane, weight_at("2024-03-15", 64.2)).unwrap();

        let err = get_health_record(&db, john, record.id).unwrap_err();
        assert!(err.contains("Permission denied"));
        assert!(update_health_record(&db, john, record.id, HealthRecordUpdate::default()).is_err());
        assert!(delete_health_record(&db, john, record.id).is_err());

        // Still there for the owner
        assert!(get_health_record(&db, jane, record.id).unwrap().is_some());
    }

    #[test]
    fn test_update_and_delete_own_record() {
        let (db, jane, _) = setup();
        let record = add_health_record(&db, jane, weight_at("2024-03-15", 64.2)).unwrap();

        let update = HealthRecordUpdate {
            metrics: HealthMetrics {
                heart_rate: Some(61),
                ..Default::default()
            },
            ..Default::default()
        };
        let updated = update_health_record(&db, jane, record.id, update).unwrap().unwrap();
        assert_eq!(updated.heart_rate, Some(61));
        assert_eq!(updated.weight, Some(64.2));

        assert!(delete_health_record(&db, jane, record.id).unwrap().success);
        assert!(delete_health_record(&db, jane, record.id).is_err());
    }

    #[test]
    fn test_history_paging() {
        let (db, jane, john) = setup();
        for day in 1..=23 {
            add_health_record(&db, jane, weight_at(&format!("2024-03-{:02}", day), 64.0)).unwrap();
        }
        add_health_record(&db, john, weight_at("2024-03-31", 80.0)).unwrap();

        let first = list_health_history(&db, jane, 0, 10).unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.records.len(), 10);
        assert_eq!(first.records[0].timestamp, "2024-03-23T00:00:00");
        assert_eq!(first.total_records, 23);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let last = list_health_history(&db, jane, 3, 10).unwrap();
        assert_eq!(last.records.len(), 3);
        assert!(!last.has_next);

        let beyond = list_health_history(&db, jane, 9, 10).unwrap();
        assert!(beyond.records.is_empty());
    }

    #[test]
    fn test_history_paging_extremes() {
        let (db, jane, _) = setup();
        for day in 1..=3 {
            add_health_record(&db, jane, weight_at(&format!("2024-03-{:02}", day), 64.0)).unwrap();
        }

        let far = list_health_history(&db, jane, i64::MAX, 10).unwrap();
        assert!(far.records.is_empty());
        assert_eq!(far.total_records, 3);
        assert!(!far.has_next);
        assert!(far.has_previous);

        let huge = list_health_history(&db, jane, 1, i64::MAX).unwrap();
        assert_eq!(huge.page_size, MAX_HISTORY_PAGE_SIZE);
        assert_eq!(huge.records.len(), 3);
        assert_eq!(huge.total_pages, 1);

        let tiny = list_health_history(&db, jane, 2, -5).unwrap();
        assert_eq!(tiny.page_size, 1);
        assert_eq!(tiny.records.len(), 1);
        assert_eq!(tiny.total_pages, 3);
    }
}
