//! Demographic baseline model
//!
//! Read-only reference ranges keyed by (gender, age group, metric).

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::analytics::demographics::reference_ranges;
use crate::analytics::{now_timestamp, AgeGroup, BaselineMetadata, Gender, Metric};
use crate::db::DbResult;

/// A stored baseline row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemographicBaseline {
    pub id: i64,
    pub gender: String,
    pub age_group: String,
    pub metric_type: String,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub metadata_json: Option<String>,
}

/// Baseline returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineRange {
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub metric: Metric,
    pub unit: &'static str,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BaselineMetadata>,
}

impl DemographicBaseline {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            gender: row.get("gender")?,
            age_group: row.get("age_group")?,
            metric_type: row.get("metric_type")?,
            avg_value: row.get("avg_value")?,
            min_value: row.get("min_value")?,
            max_value: row.get("max_value")?,
            metadata_json: row.get("metadata_json")?,
        })
    }

    /// Parsed metadata; malformed JSON is ignored
    pub fn metadata(&self) -> Option<BaselineMetadata> {
        let raw = self.metadata_json.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(id = self.id, error = %e, "Ignoring malformed baseline metadata");
                None
            }
        }
    }

    /// Insert the reference ranges if the table is empty. Returns the number
    /// of rows written.
    pub fn seed_defaults(conn: &Connection) -> DbResult<usize> {
        let existing: i64 =
            conn.query_row("SELECT COUNT(*) FROM demographic_baselines", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let seeded_at = now_timestamp();
        let tx = conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO demographic_baselines
                    (gender, age_group, metric_type, avg_value, min_value, max_value, metadata_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;

            for range in reference_ranges() {
                let metadata =
                    BaselineMetadata::derive(range.avg, range.min, range.max, seeded_at.clone());
                written += stmt.execute(params![
                    range.gender.as_str(),
                    range.age_group.as_str(),
                    range.metric.as_str(),
                    range.avg,
                    range.min,
                    range.max,
                    serde_json::to_string(&metadata).ok(),
                ])?;
            }
        }
        tx.commit()?;

        Ok(written)
    }

    /// Find the baseline row for an exact (gender, age group, metric) key
    pub fn find(
        conn: &Connection,
        gender: Gender,
        age_group: AgeGroup,
        metric: Metric,
    ) -> DbResult<Option<Self>> {
        let baseline = conn
            .query_row(
                r#"
                SELECT * FROM demographic_baselines
                WHERE gender = ?1 AND age_group = ?2 AND metric_type = ?3
                "#,
                params![gender.as_str(), age_group.as_str(), metric.as_str()],
                Self::from_row,
            )
            .optional()?;
        Ok(baseline)
    }

    /// Reference range for a person of `gender` aged `age`. Minors and
    /// combinations without seeded data have none.
    pub fn lookup(
        conn: &Connection,
        gender: Gender,
        age: i32,
        metric: Metric,
    ) -> DbResult<Option<BaselineRange>> {
        let Some(age_group) = AgeGroup::from_age(age) else {
            return Ok(None);
        };

        let range = Self::find(conn, gender, age_group, metric)?.map(|row| BaselineRange {
            gender,
            age_group,
            metric,
            unit: metric.unit(),
            average: row.avg_value,
            minimum: row.min_value,
            maximum: row.max_value,
            metadata: row.metadata(),
        });
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_lookup_male_45_weight() {
        let conn = setup();
        let range = DemographicBaseline::lookup(&conn, Gender::Male, 45, Metric::Weight)
            .unwrap()
            .unwrap();

        assert_eq!(range.age_group, AgeGroup::From40To49);
        assert_eq!(range.average, 80.0);
        assert_eq!(range.minimum, 65.0);
        assert_eq!(range.maximum, 95.0);

        let meta = range.metadata.unwrap();
        assert_eq!(meta.percentile_25, 72.5);
        assert_eq!(meta.sample_size, 1000);
    }

    #[test]
    fn test_lookup_not_found_cases() {
        let conn = setup();
        // Minor
        assert!(DemographicBaseline::lookup(&conn, Gender::Male, 17, Metric::Weight)
            .unwrap()
            .is_none());
        // Unseeded metric
        assert!(DemographicBaseline::lookup(&conn, Gender::Male, 45, Metric::StressLevel)
            .unwrap()
            .is_none());
        // Unseeded gender
        assert!(DemographicBaseline::lookup(&conn, Gender::Other, 45, Metric::Weight)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_metadata_is_ignored() {
        let conn = setup();
        conn.execute(
            "UPDATE demographic_baselines SET metadata_json = '{not json' \
             WHERE gender = 'female' AND age_group = '70+' AND metric_type = 'steps'",
            [],
        )
        .unwrap();

        let range = DemographicBaseline::lookup(&conn, Gender::Female, 82, Metric::Steps)
            .unwrap()
            .unwrap();
        assert_eq!(range.average, 5000.0);
        assert!(range.metadata.is_none());
    }

    #[test]
    fn test_seed_is_skipped_when_present() {
        let conn = setup();
        assert_eq!(DemographicBaseline::seed_defaults(&conn).unwrap(), 0);
    }
}
