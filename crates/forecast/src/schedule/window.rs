//! The shared simulation window.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use cronload_core::{ForecastError, Result};

/// Truncate an instant to the start of its minute.
pub fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::minutes(1)).unwrap_or(t)
}

/// The open interval `(start, start + horizon)` over which firings are
/// simulated. `start` is minute-truncated and fixed for the whole run; a
/// firing exactly at `start` has already happened and is not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSimulationWindow")]
pub struct SimulationWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawSimulationWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawSimulationWindow> for SimulationWindow {
    type Error = ForecastError;

    fn try_from(raw: RawSimulationWindow) -> Result<Self> {
        if truncate_to_minute(raw.start) != raw.start {
            return Err(ForecastError::config(format!(
                "window start {} is not aligned to a minute",
                raw.start
            )));
        }
        Self::new(raw.start, raw.end - raw.start)
    }
}

impl SimulationWindow {
    pub fn new(start: DateTime<Utc>, horizon: Duration) -> Result<Self> {
        if horizon <= Duration::zero() {
            return Err(ForecastError::config(format!(
                "simulation horizon must be positive, got {horizon}"
            )));
        }
        let start = truncate_to_minute(start);
        let end = start
            .checked_add_signed(horizon)
            .ok_or_else(|| ForecastError::config("simulation horizon overflows the calendar"))?;
        Ok(Self { start, end })
    }

    pub fn hours(start: DateTime<Utc>, hours: u64) -> Result<Self> {
        let hours = i64::try_from(hours)
            .map_err(|_| ForecastError::config(format!("horizon of {hours}h is too large")))?;
        let horizon = Duration::try_hours(hours)
            .ok_or_else(|| ForecastError::config(format!("horizon of {hours}h is too large")))?;
        Self::new(start, horizon)
    }

    /// Capture the current instant once and open a window from it.
    pub fn starting_now(horizon: Duration) -> Result<Self> {
        Self::new(Utc::now(), horizon)
    }

    /// Exclusive lower bound.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn horizon(&self) -> Duration {
        self.end - self.start
    }

    /// Both bounds are exclusive.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t > self.start && t < self.end
    }
}
