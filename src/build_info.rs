//! Build metadata embedded by `build.rs`

use std::fmt;

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

const RAW_BUILD_NUMBER: Option<&str> = option_env!("HEALTH_MONITOR_BUILD_NUMBER");
const RAW_BUILD_TIMESTAMP: Option<&str> = option_env!("HEALTH_MONITOR_BUILD_TIMESTAMP");

/// Build number from `build.rs`; 0 when missing or malformed
fn parse_build_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    /// UTC, `YYYY-MM-DDTHH:MM:SSZ`
    pub build_timestamp: &'static str,
    pub description: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: parse_build_number(RAW_BUILD_NUMBER),
            build_timestamp: RAW_BUILD_TIMESTAMP.unwrap_or("unknown"),
            description: DESCRIPTION,
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{} (build {}, compiled {})",
            self.name, self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Startup banner; stdout belongs to the MCP transport, so this goes to stderr
pub fn print_startup_banner() {
    let rule = "=".repeat(60);
    eprintln!("{}", rule);
    eprintln!("  Health Monitor");
    eprintln!("  {}", BuildInfo::current());
    eprintln!("{}", rule);
}
