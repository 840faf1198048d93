//! Scheduled-job capacity forecasting and admission control.
//!
//! This crate provides:
//! - Capacity resolution from platform limits to hard/soft concurrency limits
//! - 5-field cron simulation over a bounded window via the `cron` crate
//! - Per-minute concurrency histograms with parallel, order-independent merging
//! - Admission decisions for a candidate job with per-minute violation detail
//! - Local-file job sources (YAML rule files, saved-search JSON listings)

pub mod admission;
pub mod capacity;
pub mod forecaster;
pub mod histogram;
pub mod schedule;
pub mod source;

pub use admission::{
    evaluate, scan_violations, AdmissionDecision, AdmissionOutcome, Violation, ViolationKind,
};
pub use capacity::{resolve, CapacityInputs, CapacityLimits};
pub use forecaster::{CapacitySource, Forecaster};
pub use histogram::{build_baseline, Baseline, ConcurrencyHistogram, HistogramPoint, JobOutcome};
pub use schedule::{simulate_job, CronSchedule, FiringEvent, SimulationWindow};

pub use cronload_core::{ForecastError, Result, ScheduledJob, SoftLimitPolicy};
