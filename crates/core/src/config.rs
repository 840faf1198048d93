use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

/// Parse a profiled numeric env var. Unlike a silent default, a value that is
/// present but not a number is a configuration error.
fn profiled_env_u64_opt(profile: &str, key: &str) -> Result<Option<u64>> {
    match profiled_env_opt(profile, key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ForecastError::config(format!("{key} must be a non-negative integer, got '{raw}'"))),
        None => Ok(None),
    }
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> Result<u64> {
    Ok(profiled_env_u64_opt(profile, key)?.unwrap_or(default))
}

// ── Defaults ──────────────────────────────────────────────────

/// CPU count assumed when the host count cannot be detected.
pub const DEFAULT_CPU_COUNT: u64 = 4;
pub const DEFAULT_MAX_SEARCHES_PER_CPU: u64 = 1;
pub const DEFAULT_BASE_MAX_SEARCHES: u64 = 6;
pub const DEFAULT_MAX_SCHEDULED_PERCENTAGE: u64 = 50;
/// Hard limit used when the capacity source is unreachable.
pub const DEFAULT_FALLBACK_HARD_LIMIT: u64 = 5;
pub const DEFAULT_HORIZON_HOURS: u64 = 24;

fn detected_cpu_count() -> u64 {
    match num_cpus::get() {
        0 => DEFAULT_CPU_COUNT,
        n => n as u64,
    }
}

// ── Soft limit policy ─────────────────────────────────────────

/// How a soft-limit breach affects the admission verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftLimitPolicy {
    /// Soft breaches make the decision unsafe, same as hard breaches.
    #[default]
    Block,
    /// Soft breaches are reported but only hard breaches are unsafe.
    Warn,
}

impl FromStr for SoftLimitPolicy {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(SoftLimitPolicy::Block),
            "warn" => Ok(SoftLimitPolicy::Warn),
            other => Err(ForecastError::config(format!(
                "SOFT_LIMIT_POLICY must be 'block' or 'warn', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SoftLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftLimitPolicy::Block => write!(f, "block"),
            SoftLimitPolicy::Warn => write!(f, "warn"),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub capacity: CapacityConfig,
    pub forecast: ForecastConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CRONLOAD_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or("CRONLOAD_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            capacity: CapacityConfig::from_env_profiled(p)?,
            forecast: ForecastConfig::from_env_profiled(p)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  capacity:  cpus={}, per_cpu={}, base={}, perc={}, quota={}, fallback={}",
            self.capacity.cpu_count,
            self.capacity.max_searches_per_cpu,
            self.capacity.base_max_searches,
            self.capacity.max_scheduled_percentage,
            self.capacity
                .role_quota
                .map(|q| q.to_string())
                .unwrap_or_else(|| "(none)".to_string()),
            self.capacity.fallback_hard_limit,
        );
        tracing::info!(
            "  forecast:  horizon={}h, soft_limit_policy={}",
            self.forecast.horizon_hours,
            self.forecast.soft_limit_policy,
        );
    }
}

// ── Capacity ──────────────────────────────────────────────────

/// Raw capacity settings as configured for the scheduling platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityConfig {
    pub cpu_count: u64,
    pub max_searches_per_cpu: u64,
    pub base_max_searches: u64,
    pub max_scheduled_percentage: u64,
    /// Per-role scheduled job quota. A configured `0` means "no quota".
    pub role_quota: Option<u64>,
    pub fallback_hard_limit: u64,
}

impl CapacityConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let cpu_count = match profiled_env_u64_opt(p, "CPU_COUNT")? {
            Some(n) => n,
            None => detected_cpu_count(),
        };
        Ok(Self {
            cpu_count,
            max_searches_per_cpu: profiled_env_u64(p, "MAX_SEARCHES_PER_CPU", DEFAULT_MAX_SEARCHES_PER_CPU)?,
            base_max_searches: profiled_env_u64(p, "BASE_MAX_SEARCHES", DEFAULT_BASE_MAX_SEARCHES)?,
            max_scheduled_percentage: profiled_env_u64(
                p,
                "MAX_SEARCHES_PERC",
                DEFAULT_MAX_SCHEDULED_PERCENTAGE,
            )?,
            role_quota: profiled_env_u64_opt(p, "SCHEDULE_SEARCH_JOBS_QUOTA")?.filter(|q| *q > 0),
            fallback_hard_limit: profiled_env_u64(p, "FALLBACK_HARD_LIMIT", DEFAULT_FALLBACK_HARD_LIMIT)?,
        })
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            cpu_count: DEFAULT_CPU_COUNT,
            max_searches_per_cpu: DEFAULT_MAX_SEARCHES_PER_CPU,
            base_max_searches: DEFAULT_BASE_MAX_SEARCHES,
            max_scheduled_percentage: DEFAULT_MAX_SCHEDULED_PERCENTAGE,
            role_quota: None,
            fallback_hard_limit: DEFAULT_FALLBACK_HARD_LIMIT,
        }
    }
}

// ── Forecast ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub horizon_hours: u64,
    pub soft_limit_policy: SoftLimitPolicy,
}

impl ForecastConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let horizon_hours = profiled_env_u64(p, "HORIZON_HOURS", DEFAULT_HORIZON_HOURS)?;
        if horizon_hours == 0 {
            return Err(ForecastError::config("HORIZON_HOURS must be greater than zero"));
        }
        let soft_limit_policy = match profiled_env_opt(p, "SOFT_LIMIT_POLICY") {
            Some(raw) => raw.parse()?,
            None => SoftLimitPolicy::default(),
        };
        Ok(Self {
            horizon_hours,
            soft_limit_policy,
        })
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_hours: DEFAULT_HORIZON_HOURS,
            soft_limit_policy: SoftLimitPolicy::default(),
        }
    }
}
