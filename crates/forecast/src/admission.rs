//! Admission control: would one more scheduled job breach capacity?

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use cronload_core::{Result, ScheduledJob, SoftLimitPolicy};

use crate::capacity::CapacityLimits;
use crate::histogram::ConcurrencyHistogram;
use crate::schedule::{simulate_job, CronSchedule, SimulationWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViolationKind {
    Soft,
    Hard,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::Soft => write!(f, "SOFT"),
            ViolationKind::Hard => write!(f, "HARD"),
        }
    }
}

/// A minute whose concurrency exceeds a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub timestamp: DateTime<Utc>,
    pub kind: ViolationKind,
    pub observed_count: u64,
    /// The limit that was exceeded.
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub safe: bool,
    /// Sorted ascending by timestamp.
    pub violations: Vec<Violation>,
}

impl AdmissionDecision {
    /// Apply `policy` to a set of violations (already sorted by timestamp).
    pub fn from_violations(violations: Vec<Violation>, policy: SoftLimitPolicy) -> Self {
        let safe = match policy {
            SoftLimitPolicy::Block => violations.is_empty(),
            SoftLimitPolicy::Warn => violations.iter().all(|v| v.kind == ViolationKind::Soft),
        };
        Self { safe, violations }
    }

    pub fn hard_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.kind == ViolationKind::Hard)
    }

    pub fn soft_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.kind == ViolationKind::Soft)
    }
}

/// The decision together with the merged histogram it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionOutcome {
    pub decision: AdmissionDecision,
    pub histogram: ConcurrencyHistogram,
}

/// Check every minute of `histogram` against `limits`.
///
/// A minute yields at most one violation: HARD when the count is strictly
/// above the hard limit, otherwise SOFT when strictly above the soft limit.
pub fn scan_violations(histogram: &ConcurrencyHistogram, limits: &CapacityLimits) -> Vec<Violation> {
    // BTreeMap iteration order keeps the result sorted by timestamp.
    histogram
        .iter()
        .filter_map(|(timestamp, count)| {
            if count > limits.hard_limit() {
                Some(Violation {
                    timestamp,
                    kind: ViolationKind::Hard,
                    observed_count: count,
                    limit: limits.hard_limit(),
                })
            } else if count > limits.soft_limit() {
                Some(Violation {
                    timestamp,
                    kind: ViolationKind::Soft,
                    observed_count: count,
                    limit: limits.soft_limit(),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Decide whether `candidate` can be added on top of `baseline`.
///
/// `window` must be the same window the baseline was built with. An invalid
/// or missing candidate schedule is an error, never a safe decision. A
/// disabled candidate is still validated but adds no firings.
pub fn evaluate(
    baseline: &ConcurrencyHistogram,
    candidate: &ScheduledJob,
    window: &SimulationWindow,
    limits: &CapacityLimits,
    policy: SoftLimitPolicy,
) -> Result<AdmissionOutcome> {
    let firings = if candidate.enabled {
        simulate_job(candidate, window)?
    } else {
        // Still surface a malformed schedule on a disabled candidate.
        let expression = candidate.schedule().unwrap_or_default();
        CronSchedule::parse(expression)?;
        Vec::new()
    };

    let histogram = baseline.merge_events(&firings);
    let decision = AdmissionDecision::from_violations(scan_violations(&histogram, limits), policy);

    info!(
        candidate = %candidate.id,
        firings = firings.len(),
        hard_limit = limits.hard_limit(),
        soft_limit = limits.soft_limit(),
        violations = decision.violations.len(),
        safe = decision.safe,
        "admission evaluated"
    );
    Ok(AdmissionOutcome { decision, histogram })
}
