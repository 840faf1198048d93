//! Machine-readable summary of one forecast run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cronload_core::SoftLimitPolicy;
use cronload_forecast::{
    AdmissionDecision, Baseline, CapacityLimits, ConcurrencyHistogram, HistogramPoint, JobOutcome,
    SimulationWindow, Violation,
};

#[derive(Debug, Serialize)]
pub struct WindowReport {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LimitsReport {
    pub hard_limit: u64,
    pub soft_limit: u64,
    /// True when the hard limit came from the fallback instead of capacity inputs.
    pub fallback: bool,
    pub soft_limit_policy: SoftLimitPolicy,
}

#[derive(Debug, Serialize)]
pub struct CandidateReport {
    pub job_id: String,
    pub firings: u64,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub window: WindowReport,
    pub limits: LimitsReport,
    pub jobs: Vec<JobOutcome>,
    pub baseline_peak: Option<HistogramPoint>,
    pub baseline_violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CandidateReport>,
    pub decision: AdmissionDecision,
    pub peak: Option<HistogramPoint>,
    pub histogram: Vec<HistogramPoint>,
}

impl Report {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        window: &SimulationWindow,
        limits: &CapacityLimits,
        fallback: bool,
        policy: SoftLimitPolicy,
        baseline: Baseline,
        baseline_violations: Vec<Violation>,
        candidate: Option<(String, &ConcurrencyHistogram)>,
        decision: AdmissionDecision,
    ) -> Self {
        let histogram = match &candidate {
            Some((_, merged)) => (*merged).clone(),
            None => baseline.histogram.clone(),
        };
        let candidate = candidate.map(|(job_id, merged)| CandidateReport {
            job_id,
            firings: merged.total_events() - baseline.histogram.total_events(),
        });

        Self {
            window: WindowReport {
                start: window.start(),
                end: window.end(),
            },
            limits: LimitsReport {
                hard_limit: limits.hard_limit(),
                soft_limit: limits.soft_limit(),
                fallback,
                soft_limit_policy: policy,
            },
            baseline_peak: baseline.histogram.peak(),
            jobs: baseline.outcomes,
            baseline_violations,
            candidate,
            decision,
            peak: histogram.peak(),
            histogram: histogram.points(),
        }
    }

    pub fn skipped(&self) -> impl Iterator<Item = &JobOutcome> {
        self.jobs.iter().filter(|o| !o.is_simulated())
    }

    pub fn simulated(&self) -> usize {
        self.jobs.iter().filter(|o| o.is_simulated()).count()
    }
}
