//! Per-minute concurrency histogram and the baseline builder.
//!
//! A [`ConcurrencyHistogram`] maps a minute to the number of jobs firing in it.
//! Histograms combine by key-wise addition, which is commutative and
//! associative, so jobs can be simulated independently (and in parallel) and
//! folded together in any order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cronload_core::{ForecastError, Result, ScheduledJob};

use crate::schedule::{simulate_job, truncate_to_minute, FiringEvent, SimulationWindow};

/// Count of firings per minute. Only minutes with at least one firing are stored.
///
/// Serializes as a map from minute to count; deserializing rejects zero counts
/// and folds keys onto their minute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<DateTime<Utc>, u64>",
    into = "BTreeMap<DateTime<Utc>, u64>"
)]
pub struct ConcurrencyHistogram {
    counts: BTreeMap<DateTime<Utc>, u64>,
}

impl TryFrom<BTreeMap<DateTime<Utc>, u64>> for ConcurrencyHistogram {
    type Error = ForecastError;

    fn try_from(counts: BTreeMap<DateTime<Utc>, u64>) -> Result<Self> {
        let mut histogram = Self::new();
        for (at, count) in counts {
            if count == 0 {
                return Err(ForecastError::config(format!("histogram count at {at} is zero")));
            }
            histogram.increment(at, count);
        }
        Ok(histogram)
    }
}

impl From<ConcurrencyHistogram> for BTreeMap<DateTime<Utc>, u64> {
    fn from(histogram: ConcurrencyHistogram) -> Self {
        histogram.counts
    }
}

/// One point of the histogram series, for charting collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramPoint {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
}

impl ConcurrencyHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from any collection of firing events.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a FiringEvent>) -> Self {
        let mut histogram = Self::new();
        for event in events {
            histogram.increment(event.timestamp, 1);
        }
        histogram
    }

    fn increment(&mut self, at: DateTime<Utc>, by: u64) {
        if by > 0 {
            *self.counts.entry(truncate_to_minute(at)).or_insert(0) += by;
        }
    }

    /// Return a new histogram with one job's firings added.
    ///
    /// A job contributes at most one firing per minute, so repeated minutes in
    /// `events` are counted once.
    pub fn merge_events(&self, events: &[FiringEvent]) -> Self {
        let mut merged = self.clone();
        let mut last: Option<DateTime<Utc>> = None;
        let mut minutes: Vec<DateTime<Utc>> =
            events.iter().map(|e| truncate_to_minute(e.timestamp)).collect();
        minutes.sort_unstable();
        for minute in minutes {
            if last != Some(minute) {
                merged.increment(minute, 1);
                last = Some(minute);
            }
        }
        merged
    }

    /// Key-wise sum of two histograms.
    pub fn merge(mut self, other: &Self) -> Self {
        for (at, count) in &other.counts {
            self.increment(*at, *count);
        }
        self
    }

    /// Count at a minute (zero when absent).
    pub fn count_at(&self, at: DateTime<Utc>) -> u64 {
        self.counts.get(&truncate_to_minute(at)).copied().unwrap_or(0)
    }

    /// Minutes with at least one firing, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, u64)> + '_ {
        self.counts.iter().map(|(at, count)| (*at, *count))
    }

    pub fn points(&self) -> Vec<HistogramPoint> {
        self.iter()
            .map(|(timestamp, count)| HistogramPoint { timestamp, count })
            .collect()
    }

    /// Highest concurrency, earliest minute on ties.
    pub fn peak(&self) -> Option<HistogramPoint> {
        self.iter()
            .fold(None, |best: Option<HistogramPoint>, (timestamp, count)| match best {
                Some(b) if b.count >= count => Some(b),
                _ => Some(HistogramPoint { timestamp, count }),
            })
    }

    pub fn total_events(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct minutes with firings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

// ── Baseline ──────────────────────────────────────────────────

/// What happened to one existing job during a baseline build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Simulated { job_id: String, firings: usize },
    Disabled { job_id: String },
    Unscheduled { job_id: String },
    InvalidSchedule { job_id: String, expression: String, reason: String },
}

impl JobOutcome {
    pub fn job_id(&self) -> &str {
        match self {
            JobOutcome::Simulated { job_id, .. }
            | JobOutcome::Disabled { job_id }
            | JobOutcome::Unscheduled { job_id }
            | JobOutcome::InvalidSchedule { job_id, .. } => job_id,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, JobOutcome::Simulated { .. })
    }
}

/// Histogram of all existing jobs plus a per-job account of how each was treated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub histogram: ConcurrencyHistogram,
    /// One entry per input job, in input order.
    pub outcomes: Vec<JobOutcome>,
}

impl Baseline {
    pub fn skipped(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_simulated())
    }
}

/// Simulate a single existing job, converting failures into an outcome so the
/// rest of the run is unaffected.
fn simulate_existing(job: &ScheduledJob, window: &SimulationWindow) -> (ConcurrencyHistogram, JobOutcome) {
    let job_id = job.id.clone();
    if !job.enabled {
        return (ConcurrencyHistogram::new(), JobOutcome::Disabled { job_id });
    }
    let Some(expression) = job.schedule() else {
        return (ConcurrencyHistogram::new(), JobOutcome::Unscheduled { job_id });
    };

    match simulate_job(job, window) {
        Ok(events) => {
            debug!(job_id = %job_id, firings = events.len(), "simulated job");
            let firings = events.len();
            (
                ConcurrencyHistogram::new().merge_events(&events),
                JobOutcome::Simulated { job_id, firings },
            )
        }
        Err(e) => {
            warn!(job_id = %job_id, cron = %expression, error = %e, "invalid cron expression, job skipped");
            (
                ConcurrencyHistogram::new(),
                JobOutcome::InvalidSchedule {
                    job_id,
                    expression: expression.to_string(),
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// Build the baseline histogram for all existing jobs.
///
/// Disabled and unscheduled jobs are excluded before simulation. Jobs with an
/// invalid schedule contribute nothing and are reported in the outcomes.
/// Jobs are simulated on the rayon pool; results do not depend on scheduling.
pub fn build_baseline(jobs: &[ScheduledJob], window: &SimulationWindow) -> Baseline {
    let partials: Vec<(ConcurrencyHistogram, JobOutcome)> = jobs
        .par_iter()
        .map(|job| simulate_existing(job, window))
        .collect();

    let mut histogram = ConcurrencyHistogram::new();
    let mut outcomes = Vec::with_capacity(partials.len());
    for (partial, outcome) in partials {
        histogram = histogram.merge(&partial);
        outcomes.push(outcome);
    }

    let simulated = outcomes.iter().filter(|o| o.is_simulated()).count();
    info!(
        jobs = jobs.len(),
        simulated,
        skipped = jobs.len() - simulated,
        minutes = histogram.len(),
        "baseline built"
    );
    Baseline { histogram, outcomes }
}

/// Build a histogram by folding jobs one at a time, without the thread pool.
#[cfg(test)]
fn build_histogram_sequential(jobs: &[ScheduledJob], window: &SimulationWindow) -> ConcurrencyHistogram {
    jobs.iter()
        .map(|job| simulate_existing(job, window).0)
        .fold(ConcurrencyHistogram::new(), |acc, partial| acc.merge(&partial))
}
