//! Chart generation tools
//!
//! Render one metric's windowed series to a PNG with plotters.

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use serde::Serialize;

use super::statistics::{records_in_window, user_window, WindowSummary};
use super::users::require_user;
use crate::analytics::{ChartStyle, Metric, TimeWindow, TIMESTAMP_FORMAT};
use crate::db::Database;
use crate::models::HealthRecord;

pub const CHART_WIDTH: u32 = 900;
pub const CHART_HEIGHT: u32 = 450;

/// One plotted sample
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Axis label, `MM/DD`
    pub label: String,
    pub value: f64,
    /// Diastolic reading for blood pressure
    pub secondary: Option<f64>,
}

/// Response for generate_metric_chart
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub success: bool,
    pub file_path: String,
    pub metric: &'static str,
    pub title: String,
    pub window: WindowSummary,
    pub points: usize,
    pub size_bytes: usize,
}

fn axis_label(timestamp: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map(|ts| ts.format("%m/%d").to_string())
        .unwrap_or_else(|_| timestamp.chars().skip(5).take(5).collect::<String>().replace('-', "/"))
}

/// Samples of `metric` in record order. Blood pressure keeps only complete pairs.
pub fn series_points(records: &[HealthRecord], metric: Metric) -> Vec<SeriesPoint> {
    records
        .iter()
        .filter_map(|r| {
            let (value, secondary) = if metric.is_composite() {
                match (r.blood_pressure_systolic, r.blood_pressure_diastolic) {
                    (Some(s), Some(d)) => (s as f64, Some(d as f64)),
                    _ => return None,
                }
            } else {
                (metric.value(r)?, None)
            };

            Some(SeriesPoint {
                label: axis_label(&r.timestamp),
                value,
                secondary,
            })
        })
        .collect()
}

pub fn chart_title(metric: Metric, window: &TimeWindow) -> String {
    format!("{} History - {}", metric.display_name(), window.label)
}

/// Y range padded around the data
fn value_range(points: &[SeriesPoint], from_zero: bool) -> (f64, f64) {
    let values = points
        .iter()
        .flat_map(|p| std::iter::once(p.value).chain(p.secondary));
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let pad = ((max - min) * 0.1).max(1.0);
    let low = if from_zero { 0.0 } else { min - pad };
    (low, max + pad)
}

/// Render a series to PNG bytes
pub fn render_metric_chart(
    points: &[SeriesPoint],
    metric: Metric,
    title: &str,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    if points.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let spec = metric.spec();
        let (r, g, b) = spec.color;
        let color = RGBColor(r, g, b);
        let bars = spec.chart_style == ChartStyle::Bar;
        let (y_min, y_max) = value_range(points, bars);
        let n = points.len();

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.min(10))
            .x_label_formatter(&|x| {
                let i = x.round();
                if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < n {
                    points[i as usize].label.clone()
                } else {
                    String::new()
                }
            })
            .y_desc(spec.unit)
            .draw()
            .map_err(|e| e.to_string())?;

        if metric.is_composite() {
            let systolic: Vec<(f64, f64)> =
                points.iter().enumerate().map(|(i, p)| (i as f64, p.value)).collect();
            let diastolic: Vec<(f64, f64)> = points
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.secondary.map(|d| (i as f64, d)))
                .collect();

            chart
                .draw_series(LineSeries::new(systolic.clone(), RED.stroke_width(2)))
                .map_err(|e| e.to_string())?
                .label("Systolic")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
            chart
                .draw_series(systolic.iter().map(|(x, y)| Circle::new((*x, *y), 3, RED.filled())))
                .map_err(|e| e.to_string())?;

            chart
                .draw_series(LineSeries::new(diastolic.clone(), BLUE.stroke_width(2)))
                .map_err(|e| e.to_string())?
                .label("Diastolic")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));
            chart
                .draw_series(diastolic.iter().map(|(x, y)| Circle::new((*x, *y), 3, BLUE.filled())))
                .map_err(|e| e.to_string())?;

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| e.to_string())?;
        } else if bars {
            chart
                .draw_series(points.iter().enumerate().map(|(i, p)| {
                    let x = i as f64;
                    Rectangle::new([(x - 0.35, 0.0), (x + 0.35, p.value)], color.mix(0.8).filled())
                }))
                .map_err(|e| e.to_string())?;
        } else {
            let series: Vec<(f64, f64)> =
                points.iter().enumerate().map(|(i, p)| (i as f64, p.value)).collect();

            chart
                .draw_series(LineSeries::new(series.clone(), color.stroke_width(2)))
                .map_err(|e| e.to_string())?;
            chart
                .draw_series(series.iter().map(|(x, y)| Circle::new((*x, *y), 3, color.filled())))
                .map_err(|e| e.to_string())?;
        }

        root.present().map_err(|e| e.to_string())?;
    }

    // Convert RGB buffer to PNG
    let img = RgbImage::from_raw(width, height, buffer)
        .ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}

/// Render a user's metric over a window and write the PNG to `file_path`
pub fn generate_metric_chart(
    db: &Database,
    user_id: i64,
    metric: &str,
    period: Option<&str>,
    reference_date: Option<&str>,
    file_path: &str,
) -> Result<ChartResponse, String> {
    let metric = Metric::from_str(metric).ok_or_else(|| {
        format!("Invalid metric: '{}'. Valid metrics: {}", metric, Metric::valid_names())
    })?;
    let today = chrono::Local::now().date_naive();

    let (records, window) = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let user = require_user(&conn, user_id)?;
        let window = user_window(&user, period, reference_date, today);
        (records_in_window(&conn, user_id, &window)?, window)
    };

    let points = series_points(&records, metric);
    let title = chart_title(metric, &window);
    let png = render_metric_chart(&points, metric, &title, CHART_WIDTH, CHART_HEIGHT)?;

    let path = Path::new(file_path);
    std::fs::write(path, &png)
        .map_err(|e| format!("Failed to write chart to {}: {}", file_path, e))?;
    tracing::info!(user_id, metric = metric.as_str(), path = %path.display(), "Wrote chart");

    Ok(ChartResponse {
        success: true,
        file_path: path.display().to_string(),
        metric: metric.as_str(),
        title,
        window: WindowSummary::from(&window),
        points: points.len(),
        size_bytes: png.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Period;
    use chrono::NaiveDate;

    fn record(timestamp: &str) -> HealthRecord {
        HealthRecord::empty(1, timestamp)
    }

    #[test]
    fn test_series_points_skip_missing_values() {
        let records = vec![
            HealthRecord {
                steps: Some(8000),
                ..record("2024-03-09T08:00:00")
            },
            record("2024-03-10T08:00:00"),
            HealthRecord {
                steps: Some(9500),
                ..record("2024-03-11T08:00:00")
            },
        ];

        let points = series_points(&records, Metric::Steps);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "03/09");
        assert_eq!(points[1].value, 9500.0);
        assert_eq!(points[1].secondary, None);
    }

    #[test]
    fn test_blood_pressure_points_carry_diastolic() {
        let records = vec![HealthRecord {
            blood_pressure_systolic: Some(121),
            blood_pressure_diastolic: Some(79),
            ..record("2024-03-15T08:00:00")
        }];

        let points = series_points(&records, Metric::BloodPressure);
        assert_eq!(points[0].value, 121.0);
        assert_eq!(points[0].secondary, Some(79.0));
    }

    #[test]
    fn test_chart_title() {
        let window = TimeWindow::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), Period::Week);
        assert_eq!(
            chart_title(Metric::HeartRate, &window),
            "Heart Rate History - Mar 09 - Mar 15, 2024"
        );
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let err = render_metric_chart(&[], Metric::Weight, "Weight", CHART_WIDTH, CHART_HEIGHT)
            .unwrap_err();
        assert_eq!(err, "No data to chart");
    }

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn point(label: &str, value: f64, secondary: Option<f64>) -> SeriesPoint {
        SeriesPoint {
            label: label.to_string(),
            value,
            secondary,
        }
    }

    #[test]
    fn test_render_line_bar_and_blood_pressure_charts() {
        let line = vec![point("03/09", 72.0, None), point("03/10", 71.6, None)];
        let bars = vec![point("03/09", 8000.0, None), point("03/10", 9500.0, None)];
        let pressure = vec![
            point("03/09", 121.0, Some(79.0)),
            point("03/10", 118.0, Some(77.0)),
        ];

        for (points, metric) in [
            (&line, Metric::Weight),
            (&bars, Metric::Steps),
            (&pressure, Metric::BloodPressure),
        ] {
            let png =
                render_metric_chart(points, metric, "Test", CHART_WIDTH, CHART_HEIGHT).unwrap();
            assert!(png.starts_with(&PNG_SIGNATURE), "{} is not a PNG", metric.as_str());
        }
    }

    #[test]
    fn test_generate_metric_chart_writes_file() {
        use crate::db::migrations::run_migrations;
        use crate::models::{HealthMetrics, HealthRecordCreate};
        use crate::tools::records::add_health_record;
        use crate::tools::users::create_user;

        let db = Database::open_in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();
        let user = create_user(&db, "jane", "jane@example.com", None, None, Period::Month).unwrap();
        for (timestamp, weight) in [("2024-03-10T08:00:00", 72.0), ("2024-03-12T08:00:00", 71.4)] {
            let data = HealthRecordCreate {
                timestamp: Some(timestamp.to_string()),
                metrics: HealthMetrics {
                    weight: Some(weight),
                    ..Default::default()
                },
            };
            add_health_record(&db, user.id, data).unwrap();
        }

        let path = std::env::temp_dir()
            .join(format!("health_monitor_chart_{}.png", std::process::id()));
        let file_path = path.to_string_lossy().to_string();
        let week = (Some("week"), Some("2024-03-15"));
        let response =
            generate_metric_chart(&db, user.id, "weight", week.0, week.1, &file_path).unwrap();

        assert!(response.success);
        assert_eq!(response.points, 2);
        assert_eq!(response.title, "Weight History - Mar 09 - Mar 15, 2024");
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.len(), response.size_bytes);
        assert!(written.starts_with(&PNG_SIGNATURE));
        std::fs::remove_file(&path).unwrap();

        // No samples in the window
        let err =
            generate_metric_chart(&db, user.id, "steps", week.0, week.1, &file_path).unwrap_err();
        assert_eq!(err, "No data to chart");
        assert!(!path.exists());
    }

    #[test]
    fn test_value_range_pads_and_anchors_bars() {
        let points = vec![
            SeriesPoint {
                label: "03/09".into(),
                value: 100.0,
                secondary: Some(60.0),
            },
            SeriesPoint {
                label: "03/10".into(),
                value: 140.0,
                secondary: Some(80.0),
            },
        ];
        assert_eq!(value_range(&points, false), (52.0, 148.0));
        assert_eq!(value_range(&points, true), (0.0, 148.0));
    }
}
