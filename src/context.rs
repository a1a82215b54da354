//! Application context
//!
//! Built once in `main` and shared by reference with every request handler.

use crate::config::AppConfig;
use crate::db::Database;

pub struct AppContext {
    pub config: AppConfig,
    pub database: Database,
}

impl AppContext {
    pub fn new(config: AppConfig, database: Database) -> Self {
        Self { config, database }
    }
}
