use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

use cronload_core::SoftLimitPolicy;
use cronload_forecast::CapacitySource;

/// Forecast scheduled-job concurrency and gate a new schedule on capacity.
///
/// Existing jobs come from a saved-search listing export and/or a directory
/// of rule files. With `--candidate`, the rule is admitted or rejected;
/// without it, only the existing load is reported.
#[derive(Parser, Debug)]
#[command(name = "cronload", version, about)]
pub struct CliArgs {
    /// Saved-search listing (JSON) with the currently deployed schedules.
    #[arg(long, env = "CRONLOAD_JOBS")]
    pub jobs: Option<PathBuf>,

    /// Directory of YAML rule files treated as already deployed.
    #[arg(long, env = "CRONLOAD_RULES_DIR")]
    pub rules_dir: Option<PathBuf>,

    /// Rule file proposed for admission.
    #[arg(long)]
    pub candidate: Option<PathBuf>,

    /// Only count saved searches owned by this app.
    #[arg(long)]
    pub app: Option<String>,

    /// Only count saved searches that raise alerts (have a type and actions).
    #[arg(long)]
    pub alerts_only: bool,

    /// Forecast horizon in hours (overrides HORIZON_HOURS).
    #[arg(long)]
    pub horizon_hours: Option<u64>,

    /// Window start as RFC 3339 (default: now).
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Skip capacity resolution and use the configured FALLBACK_HARD_LIMIT.
    #[arg(long)]
    pub fallback: bool,

    /// Skip capacity resolution and use this hard limit.
    #[arg(long, conflicts_with = "fallback")]
    pub fallback_hard_limit: Option<u64>,

    /// Whether soft-limit breaches block admission (overrides SOFT_LIMIT_POLICY).
    #[arg(long, value_enum)]
    pub soft_limit_policy: Option<PolicyArg>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Block,
    Warn,
}

impl CliArgs {
    /// `--fallback-hard-limit` wins over `--fallback`; clap rejects both together.
    pub fn capacity_source(&self) -> CapacitySource {
        match (self.fallback_hard_limit, self.fallback) {
            (Some(hard_limit), _) => CapacitySource::Fixed(hard_limit),
            (None, true) => CapacitySource::ConfiguredFallback,
            (None, false) => CapacitySource::Resolved,
        }
    }
}

impl From<PolicyArg> for SoftLimitPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Block => SoftLimitPolicy::Block,
            PolicyArg::Warn => SoftLimitPolicy::Warn,
        }
    }
}
