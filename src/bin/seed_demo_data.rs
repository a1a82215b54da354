//! Utility to fill the database with a demo user and a month of records

use chrono::{Duration, Local, Timelike};
use rand::Rng;

use health_monitor::config::AppConfig;
use health_monitor::db::{migrations, Database};
use health_monitor::models::{HealthMetrics, HealthRecordCreate, Mood, User};
use health_monitor::tools::{records, users};

const DEMO_USERNAME: &str = "demo";
const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_RECORDS: i64 = 25;
const DEMO_DAYS: i64 = 30;

fn demo_metrics(rng: &mut impl Rng, day: i64, weight: &mut f64) -> HealthMetrics {
    // Slow downward drift with daily noise
    *weight = (*weight - 0.05 + rng.gen_range(-0.3..0.3)).clamp(60.0, 90.0);
    let systolic = rng.gen_range(112..132);

    HealthMetrics {
        weight: Some((*weight * 10.0).round() / 10.0),
        blood_pressure_systolic: Some(systolic),
        blood_pressure_diastolic: Some(systolic - rng.gen_range(35..48)),
        heart_rate: Some(rng.gen_range(58..78)),
        temperature: Some((rng.gen_range(36.3..37.1_f64) * 10.0).round() / 10.0),
        oxygen_saturation: Some(rng.gen_range(95..=99) as f64),
        steps: Some(rng.gen_range(4_000..13_000) + day * 40),
        exercise_duration: Some(rng.gen_range(0..75)),
        calories_burned: Some(rng.gen_range(150..650)),
        sleep_duration: Some((rng.gen_range(5.5..8.5_f64) * 10.0).round() / 10.0),
        sleep_quality: Some(rng.gen_range(4..=9)),
        water_intake: Some((rng.gen_range(1.2..3.2_f64) * 10.0).round() / 10.0),
        calorie_intake: Some(rng.gen_range(1_700..2_700)),
        stress_level: Some(rng.gen_range(2..=8)),
        mood: Some(Mood::ALL[rng.gen_range(0..Mood::ALL.len())]),
        notes: None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    let db_path = config.database_path.clone();
    println!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&db_path)?;
    database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let existing = database.with_conn(|conn| User::get_by_username(conn, DEMO_USERNAME))?;
    let user_id = match existing {
        Some(user) => {
            println!("Reusing demo user {} (id {})", user.username, user.id);
            user.id
        }
        None => {
            let user = users::create_user(
                &database,
                DEMO_USERNAME,
                DEMO_EMAIL,
                Some("female"),
                Some("1985-04-12"),
                config.default_period,
            )?;
            println!("Created demo user {} (id {})", user.username, user.id);
            user.id
        }
    };

    let mut rng = rand::thread_rng();
    let mut weight = rng.gen_range(68.0..76.0);
    let now = Local::now().naive_local();

    // Skip a few days so the series has gaps
    let mut days: Vec<i64> = (0..DEMO_DAYS).collect();
    while days.len() as i64 > DEMO_RECORDS {
        let idx = rng.gen_range(0..days.len());
        days.remove(idx);
    }

    for day in days.into_iter().rev() {
        let at = (now - Duration::days(day))
            .with_hour(rng.gen_range(6..10))
            .and_then(|t| t.with_minute(rng.gen_range(0..60)))
            .filter(|t| *t <= now)
            .unwrap_or(now);

        let data = HealthRecordCreate {
            timestamp: Some(at.format("%Y-%m-%dT%H:%M:%S").to_string()),
            metrics: demo_metrics(&mut rng, DEMO_DAYS - day, &mut weight),
        };
        records::add_health_record(&database, user_id, data)?;
    }

    println!("Added {} records over the past {} days", DEMO_RECORDS, DEMO_DAYS);
    Ok(())
}
