//! Lazy expansion of a schedule into firing instants inside a window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cronload_core::{ForecastError, Result, ScheduledJob};

use super::cron::CronSchedule;
use super::window::{truncate_to_minute, SimulationWindow};

/// One job firing at one minute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiringEvent {
    pub timestamp: DateTime<Utc>,
    pub job_id: String,
}

/// Strictly increasing, minute-truncated firing instants of one schedule
/// within `(window.start, window.end)`.
///
/// Each step asks the schedule for the next firing strictly after the cursor,
/// so the sequence never repeats a minute. The cursor starts at the window
/// start.
pub struct Firings<'a> {
    schedule: &'a CronSchedule,
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    done: bool,
}

impl<'a> Firings<'a> {
    pub fn new(schedule: &'a CronSchedule, window: &SimulationWindow) -> Self {
        Self {
            schedule,
            cursor: window.start(),
            end: window.end(),
            done: false,
        }
    }
}

impl Iterator for Firings<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.schedule.next_after(&self.cursor).map(truncate_to_minute) {
            Some(next) if next < self.end && next > self.cursor => {
                self.cursor = next;
                Some(next)
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Firings<'_> {}

impl CronSchedule {
    /// Lazily iterate this schedule's firings within `window`.
    pub fn firings<'a>(&'a self, window: &SimulationWindow) -> Firings<'a> {
        Firings::new(self, window)
    }
}

/// Simulate one job over `window`.
///
/// Fails with [`ForecastError::InvalidSchedule`] when the job has no schedule
/// or its expression does not parse. The enabled flag is not consulted here;
/// callers exclude disabled jobs before simulating.
pub fn simulate_job(job: &ScheduledJob, window: &SimulationWindow) -> Result<Vec<FiringEvent>> {
    let expression = job
        .schedule()
        .ok_or_else(|| ForecastError::invalid_schedule("", format!("job '{}' has no schedule", job.id)))?;
    let schedule = CronSchedule::parse(expression)?;
    Ok(schedule
        .firings(window)
        .map(|timestamp| FiringEvent {
            timestamp,
            job_id: job.id.clone(),
        })
        .collect())
}
