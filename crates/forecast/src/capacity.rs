//! Capacity resolution: raw platform limits → hard and soft concurrency limits.
//!
//! The resolver mirrors how the scheduling platform sizes its scheduler:
//! a system-wide search ceiling derived from CPU count (with a floor), a
//! percentage of that ceiling reserved for scheduled jobs, and an optional
//! per-role quota. The soft limit is always 80% of the hard limit, rounded down.

use serde::{Deserialize, Serialize};

use cronload_core::{CapacityConfig, ForecastError, Result};

/// Raw capacity inputs. Every field except `role_quota` is required; `None`
/// means the value was missing from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityInputs {
    pub cpu_count: Option<u64>,
    pub max_searches_per_cpu: Option<u64>,
    pub base_max_searches: Option<u64>,
    pub max_scheduled_percentage: Option<u64>,
    #[serde(default)]
    pub role_quota: Option<u64>,
}

impl From<&CapacityConfig> for CapacityInputs {
    fn from(config: &CapacityConfig) -> Self {
        Self {
            cpu_count: Some(config.cpu_count),
            max_searches_per_cpu: Some(config.max_searches_per_cpu),
            base_max_searches: Some(config.base_max_searches),
            max_scheduled_percentage: Some(config.max_scheduled_percentage),
            role_quota: config.role_quota,
        }
    }
}

/// Concurrency thresholds. Only constructible through [`resolve`] or
/// [`CapacityLimits::from_hard_limit`], so `soft == floor(hard * 0.8)` holds.
/// Deserialization goes through `from_hard_limit` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCapacityLimits")]
pub struct CapacityLimits {
    hard_limit: u64,
    soft_limit: u64,
}

#[derive(Deserialize)]
struct RawCapacityLimits {
    hard_limit: u64,
    #[serde(default)]
    soft_limit: Option<u64>,
}

impl TryFrom<RawCapacityLimits> for CapacityLimits {
    type Error = ForecastError;

    fn try_from(raw: RawCapacityLimits) -> Result<Self> {
        let limits = Self::from_hard_limit(raw.hard_limit);
        match raw.soft_limit {
            Some(soft) if soft != limits.soft_limit => Err(ForecastError::config(format!(
                "soft_limit {soft} does not match hard_limit {} (expected {})",
                raw.hard_limit, limits.soft_limit
            ))),
            _ => Ok(limits),
        }
    }
}

impl CapacityLimits {
    /// Build limits directly from a fixed hard limit, skipping CPU arithmetic.
    ///
    /// This is the fallback path for when the authoritative capacity source is
    /// unreachable. Callers must choose it explicitly.
    pub fn from_hard_limit(hard_limit: u64) -> Self {
        Self {
            hard_limit,
            soft_limit: soft_limit_for(hard_limit),
        }
    }

    pub fn hard_limit(&self) -> u64 {
        self.hard_limit
    }

    pub fn soft_limit(&self) -> u64 {
        self.soft_limit
    }
}

/// `floor(hard * 0.8)` in integer arithmetic.
fn soft_limit_for(hard_limit: u64) -> u64 {
    hard_limit / 5 * 4 + (hard_limit % 5) * 4 / 5
}

fn required(value: Option<u64>, name: &str) -> Result<u64> {
    value.ok_or_else(|| ForecastError::config(format!("missing required capacity input '{name}'")))
}

fn positive(value: Option<u64>, name: &str) -> Result<u64> {
    match required(value, name)? {
        0 => Err(ForecastError::config(format!("capacity input '{name}' must be positive"))),
        n => Ok(n),
    }
}

/// Resolve hard and soft limits from raw capacity inputs.
pub fn resolve(inputs: &CapacityInputs) -> Result<CapacityLimits> {
    let cpu_count = positive(inputs.cpu_count, "cpu_count")?;
    let per_cpu = positive(inputs.max_searches_per_cpu, "max_searches_per_cpu")?;
    let base = positive(inputs.base_max_searches, "base_max_searches")?;
    let percentage = required(inputs.max_scheduled_percentage, "max_scheduled_percentage")?;
    if percentage > 100 {
        return Err(ForecastError::config(format!(
            "max_scheduled_percentage must be within 0-100, got {percentage}"
        )));
    }

    let system_max = cpu_count
        .checked_mul(per_cpu)
        .ok_or_else(|| ForecastError::config("cpu_count * max_searches_per_cpu overflows"))?
        .max(base);
    let scheduled_max = system_max
        .checked_mul(percentage)
        .ok_or_else(|| ForecastError::config("scheduled search ceiling overflows"))?
        / 100;

    let hard_limit = match inputs.role_quota {
        Some(quota) => scheduled_max.min(quota),
        None => scheduled_max,
    };

    tracing::debug!(
        system_max,
        scheduled_max,
        hard_limit,
        "resolved scheduler capacity"
    );
    Ok(CapacityLimits::from_hard_limit(hard_limit))
}
