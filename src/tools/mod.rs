//! Health Monitor Tools module
//!
//! MCP tool implementations. Each function validates its input, talks to the
//! store and the analytics core, and returns a serializable response or an
//! error message.

pub mod charts;
pub mod records;
pub mod statistics;
pub mod status;
pub mod users;
