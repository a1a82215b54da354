//! Data models
//!
//! Rust structs representing database entities.

mod baseline;
mod health_record;
mod user;
pub mod validation;

pub use baseline::{BaselineRange, DemographicBaseline};
pub use health_record::{
    HealthMetrics, HealthRecord, HealthRecordCreate, HealthRecordUpdate, Mood,
};
pub use user::{User, UserCreate};
pub use validation::ValidationError;
