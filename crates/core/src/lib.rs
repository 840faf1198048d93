//! Shared types for the cronload workspace: the scheduled job model, the
//! error taxonomy, and environment-driven configuration.

pub mod config;
pub mod error;
pub mod job;

pub use config::{CapacityConfig, Config, ForecastConfig, SoftLimitPolicy};
pub use error::*;
pub use job::ScheduledJob;
