//! Health Monitor MCP Server Implementation
//!
//! Exposes the user, record, statistics and chart tools over MCP.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::context::AppContext;
use crate::models::{HealthMetrics, HealthRecordCreate, HealthRecordUpdate, Mood};
use crate::tools::charts;
use crate::tools::records;
use crate::tools::statistics;
use crate::tools::status::StatusTracker;
use crate::tools::users;

/// Health Monitor MCP Service
#[derive(Clone)]
pub struct HealthMonitorService {
    context: Arc<AppContext>,
    status_tracker: Arc<Mutex<StatusTracker>>,
    tool_router: ToolRouter<HealthMonitorService>,
}

impl HealthMonitorService {
    pub fn new(context: Arc<AppContext>) -> Self {
        let database_path = context.config.database_path.clone();
        Self {
            context,
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// User Params
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateUserParams {
    /// Unique username (3-64 characters: letters, digits, '_', '-', '.')
    pub username: String,
    /// Unique email address
    pub email: String,
    /// male, female, other or prefer_not_to_say
    pub gender: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUserParams {
    /// User ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateUserProfileParams {
    /// User ID
    pub id: i64,
    /// New gender
    pub gender: Option<String>,
    /// New date of birth (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateUserSettingsParams {
    /// User ID
    pub id: i64,
    /// Include demographic baselines in statistics
    pub show_baselines: Option<bool>,
    /// Default window: week, month or quarter
    pub default_period: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteUserParams {
    /// User ID
    pub id: i64,
    /// Must be "DELETE" - all of the user's records are removed too
    #[serde(default)]
    pub confirm: String,
}

// ============================================================================
// Health Record Params
// ============================================================================

/// Metric values accepted when logging or editing a record
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct HealthMetricsParams {
    /// Body weight in kg (0-500)
    pub weight: Option<f64>,
    /// Systolic blood pressure in mmHg (60-250, requires diastolic)
    pub blood_pressure_systolic: Option<i64>,
    /// Diastolic blood pressure in mmHg (40-150, requires systolic)
    pub blood_pressure_diastolic: Option<i64>,
    /// Resting heart rate in bpm (30-220)
    pub heart_rate: Option<i64>,
    /// Body temperature in °C (35-42)
    pub temperature: Option<f64>,
    /// Blood oxygen saturation in % (70-100)
    pub oxygen_saturation: Option<f64>,
    /// Step count (0-100000)
    pub steps: Option<i64>,
    /// Exercise minutes (0-1440)
    pub exercise_duration: Option<i64>,
    /// Calories burned in kcal (0-10000)
    pub calories_burned: Option<i64>,
    /// Hours slept (0-24)
    pub sleep_duration: Option<f64>,
    /// Sleep quality score (1-10)
    pub sleep_quality: Option<i64>,
    /// Water intake in liters (0-10)
    pub water_intake: Option<f64>,
    /// Calorie intake in kcal (0-10000)
    pub calorie_intake: Option<i64>,
    /// Stress level (1-10)
    pub stress_level: Option<i64>,
    /// happy, energetic, calm, neutral, tired, stressed, sad or anxious
    pub mood: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
}

impl HealthMetricsParams {
    fn into_metrics(self) -> Result<HealthMetrics, McpError> {
        let mood = self
            .mood
            .as_deref()
            .map(Mood::parse)
            .transpose()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(HealthMetrics {
            weight: self.weight,
            blood_pressure_systolic: self.blood_pressure_systolic,
            blood_pressure_diastolic: self.blood_pressure_diastolic,
            heart_rate: self.heart_rate,
            temperature: self.temperature,
            oxygen_saturation: self.oxygen_saturation,
            steps: self.steps,
            exercise_duration: self.exercise_duration,
            calories_burned: self.calories_burned,
            sleep_duration: self.sleep_duration,
            sleep_quality: self.sleep_quality,
            water_intake: self.water_intake,
            calorie_intake: self.calorie_intake,
            stress_level: self.stress_level,
            mood,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddHealthRecordParams {
    /// Owning user ID
    pub user_id: i64,
    /// Timestamp (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, defaults to now)
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub metrics: HealthMetricsParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HealthRecordIdParams {
    /// Owning user ID
    pub user_id: i64,
    /// Health record ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateHealthRecordParams {
    /// Owning user ID
    pub user_id: i64,
    /// Health record ID
    pub id: i64,
    /// New timestamp
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub metrics: HealthMetricsParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListHealthHistoryParams {
    /// User ID
    pub user_id: i64,
    /// Page number, starting at 1
    #[serde(default = "default_page")]
    pub page: i64,
    /// Records per page, 1-100 (defaults to the server setting)
    pub page_size: Option<i64>,
}

fn default_page() -> i64 {
    1
}

// ============================================================================
// Statistics & Chart Params
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MetricWindowParams {
    /// User ID
    pub user_id: i64,
    /// Metric name, e.g. weight, blood_pressure, heart_rate, steps, sleep_duration
    pub metric: String,
    /// week, month or quarter (defaults to the user's setting)
    pub period: Option<String>,
    /// Last day of the window (YYYY-MM-DD, defaults to today)
    pub reference_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateMetricChartParams {
    /// User ID
    pub user_id: i64,
    /// Metric name
    pub metric: String,
    /// week, month or quarter
    pub period: Option<String>,
    /// Last day of the window (YYYY-MM-DD)
    pub reference_date: Option<String>,
    /// Where to write the PNG
    pub file_path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupBaselineParams {
    /// male, female, other or prefer_not_to_say
    pub gender: String,
    /// Age in years
    pub age: i32,
    /// Metric name
    pub metric: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDashboardParams {
    /// User ID
    pub user_id: i64,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl HealthMonitorService {
    // --- Status ---

    #[tool(description = "Get the current status of the Health Monitor service including build info, database status, and process information")]
    async fn health_monitor_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get instructions for using the Health Monitor tools. Call this first when unsure how to log records or read statistics.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Users ---

    #[tool(description = "Register a new user. Gender and date of birth are optional but needed for baselines.")]
    fn create_user(&self, Parameters(p): Parameters<CreateUserParams>) -> Result<CallToolResult, McpError> {
        let result = users::create_user(
            &self.context.database,
            &p.username,
            &p.email,
            p.gender.as_deref(),
            p.date_of_birth.as_deref(),
            self.context.config.default_period,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a user with computed age and record count")]
    fn get_user(&self, Parameters(p): Parameters<GetUserParams>) -> Result<CallToolResult, McpError> {
        let result = users::get_user(&self.context.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(user) => serde_json::to_string_pretty(&user),
            None => Ok(format!(r#"{{"error": "User not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a user's gender and/or date of birth")]
    fn update_user_profile(&self, Parameters(p): Parameters<UpdateUserProfileParams>) -> Result<CallToolResult, McpError> {
        let result = users::update_user_profile(&self.context.database, p.id, p.gender.as_deref(), p.date_of_birth.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(user) => serde_json::to_string_pretty(&user),
            None => Ok(format!(r#"{{"error": "User not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a user's display settings: show_baselines and default_period")]
    fn update_user_settings(&self, Parameters(p): Parameters<UpdateUserSettingsParams>) -> Result<CallToolResult, McpError> {
        let result = users::update_user_settings(&self.context.database, p.id, p.show_baselines, p.default_period.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(user) => serde_json::to_string_pretty(&user),
            None => Ok(format!(r#"{{"error": "User not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a user and ALL of their health records. Requires confirm=\"DELETE\".")]
    fn delete_user(&self, Parameters(p): Parameters<DeleteUserParams>) -> Result<CallToolResult, McpError> {
        let result = users::delete_user(&self.context.database, p.id, &p.confirm)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Health Records ---

    #[tool(description = "Log a health record for a user. Every metric is optional; blood pressure needs both values.")]
    fn add_health_record(&self, Parameters(p): Parameters<AddHealthRecordParams>) -> Result<CallToolResult, McpError> {
        let data = HealthRecordCreate {
            timestamp: p.timestamp,
            metrics: p.metrics.into_metrics()?,
        };
        let result = records::add_health_record(&self.context.database, p.user_id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get one of a user's health records by ID")]
    fn get_health_record(&self, Parameters(p): Parameters<HealthRecordIdParams>) -> Result<CallToolResult, McpError> {
        let result = records::get_health_record(&self.context.database, p.user_id, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(record) => serde_json::to_string_pretty(&record),
            None => Ok(format!(r#"{{"error": "Health record not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update one of a user's health records. Only the fields provided are changed; empty notes clear the notes.")]
    fn update_health_record(&self, Parameters(p): Parameters<UpdateHealthRecordParams>) -> Result<CallToolResult, McpError> {
        let data = HealthRecordUpdate {
            timestamp: p.timestamp,
            metrics: p.metrics.into_metrics()?,
        };
        let result = records::update_health_record(&self.context.database, p.user_id, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(record) => serde_json::to_string_pretty(&record),
            None => Ok(format!(r#"{{"error": "Health record not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete one of a user's health records")]
    fn delete_health_record(&self, Parameters(p): Parameters<HealthRecordIdParams>) -> Result<CallToolResult, McpError> {
        let result = records::delete_health_record(&self.context.database, p.user_id, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Page through a user's health records, newest first")]
    fn list_health_history(&self, Parameters(p): Parameters<ListHealthHistoryParams>) -> Result<CallToolResult, McpError> {
        let page_size = p.page_size.unwrap_or(self.context.config.history_page_size);
        let result = records::list_health_history(&self.context.database, p.user_id, p.page, page_size)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Statistics ---

    #[tool(description = "Statistics for one metric over a week/month/quarter window: average, min, max, latest, count, trend, and the demographic baseline when enabled")]
    fn get_metric_statistics(&self, Parameters(p): Parameters<MetricWindowParams>) -> Result<CallToolResult, McpError> {
        let result = statistics::get_metric_statistics(
            &self.context.database,
            p.user_id,
            &p.metric,
            p.period.as_deref(),
            p.reference_date.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Render a PNG chart of one metric over a window and write it to file_path")]
    fn generate_metric_chart(&self, Parameters(p): Parameters<GenerateMetricChartParams>) -> Result<CallToolResult, McpError> {
        let result = charts::generate_metric_chart(
            &self.context.database,
            p.user_id,
            &p.metric,
            p.period.as_deref(),
            p.reference_date.as_deref(),
            &p.file_path,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Look up the reference range for a metric by gender and age")]
    fn lookup_baseline(&self, Parameters(p): Parameters<LookupBaselineParams>) -> Result<CallToolResult, McpError> {
        let result = statistics::lookup_baseline(&self.context.database, &p.gender, p.age, &p.metric)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(baseline) => serde_json::to_string_pretty(&baseline),
            None => Ok(format!(
                r#"{{"error": "No baseline found", "metric": "{}", "age": {}}}"#,
                p.metric, p.age
            )),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Dashboard for a user: recent records, latest weight/steps/heart rate, baselines and week-over-week changes")]
    fn get_dashboard(&self, Parameters(p): Parameters<GetDashboardParams>) -> Result<CallToolResult, McpError> {
        let result = statistics::get_dashboard(&self.context.database, p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for HealthMonitorService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "health-monitor".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Health Monitor".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Health Monitor - per-user health metric logging with statistics, trends and demographic baselines. \
                 IMPORTANT: Call usage_instructions before the first use. \
                 Users: create_user/get_user/update_user_profile/update_user_settings/delete_user (delete needs confirm=\"DELETE\"). \
                 Records: add/get/update/delete_health_record, list_health_history. Every record call takes the owning user_id. \
                 Analysis: get_metric_statistics, generate_metric_chart, lookup_baseline, get_dashboard. \
                 Periods: week, month, quarter."
                    .into(),
            ),
        }
    }
}
