//! Health Monitor Library
//!
//! Per-user health metric tracking with windowed statistics, trends and
//! demographic reference ranges.

pub mod analytics;
pub mod build_info;
pub mod config;
pub mod context;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
