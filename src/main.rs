//! Health Monitor
//!
//! An MCP server for personal health metrics.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use health_monitor::build_info;
use health_monitor::config::AppConfig;
use health_monitor::context::AppContext;
use health_monitor::db;
use health_monitor::mcp::HealthMonitorService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the MCP stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("health_monitor=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = AppConfig::from_env();
    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());
    tracing::info!(
        default_period = config.default_period.as_str(),
        history_page_size = config.history_page_size,
        "Loaded configuration"
    );

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = db::Database::new(&db_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let context = Arc::new(AppContext::new(config, database));
    let service = HealthMonitorService::new(context);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
