//! [`Forecaster`]: one forecast run over a fixed window and capacity.

use chrono::{DateTime, Utc};

use cronload_core::{Config, Result, ScheduledJob, SoftLimitPolicy};

use crate::admission::{evaluate, scan_violations, AdmissionOutcome, Violation};
use crate::capacity::{resolve, CapacityInputs, CapacityLimits};
use crate::histogram::{build_baseline, Baseline};
use crate::schedule::SimulationWindow;

/// Where a run's capacity limits come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapacitySource {
    /// Resolve from the configured capacity inputs.
    #[default]
    Resolved,
    /// Use the configured fallback hard limit as-is.
    ConfiguredFallback,
    /// Use this hard limit as-is.
    Fixed(u64),
}

impl CapacitySource {
    /// Whether limits skip capacity resolution.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, CapacitySource::Resolved)
    }

    pub fn limits(&self, config: &Config) -> Result<CapacityLimits> {
        match self {
            CapacitySource::Resolved => resolve(&CapacityInputs::from(&config.capacity)),
            CapacitySource::ConfiguredFallback => {
                Ok(CapacityLimits::from_hard_limit(config.capacity.fallback_hard_limit))
            }
            CapacitySource::Fixed(hard_limit) => Ok(CapacityLimits::from_hard_limit(*hard_limit)),
        }
    }
}

/// Owns the window and limits for a single run so the baseline and every
/// candidate are simulated from the same captured `start`.
#[derive(Debug, Clone)]
pub struct Forecaster {
    window: SimulationWindow,
    limits: CapacityLimits,
    policy: SoftLimitPolicy,
}

impl Forecaster {
    pub fn new(window: SimulationWindow, limits: CapacityLimits) -> Self {
        Self {
            window,
            limits,
            policy: SoftLimitPolicy::default(),
        }
    }

    /// Build a forecaster from configuration over the configured horizon
    /// from `start`. `start` is the run's single reference instant.
    pub fn from_config(config: &Config, start: DateTime<Utc>, capacity: CapacitySource) -> Result<Self> {
        let window = SimulationWindow::hours(start, config.forecast.horizon_hours)?;
        let limits = capacity.limits(config)?;
        Ok(Self::new(window, limits).with_soft_limit_policy(config.forecast.soft_limit_policy))
    }

    /// [`Forecaster::from_config`] starting at the current instant.
    pub fn starting_now(config: &Config, capacity: CapacitySource) -> Result<Self> {
        Self::from_config(config, Utc::now(), capacity)
    }

    pub fn with_soft_limit_policy(mut self, policy: SoftLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn window(&self) -> &SimulationWindow {
        &self.window
    }

    pub fn limits(&self) -> &CapacityLimits {
        &self.limits
    }

    pub fn soft_limit_policy(&self) -> SoftLimitPolicy {
        self.policy
    }

    /// Simulate every existing job. Bad schedules are skipped, never fatal.
    pub fn baseline(&self, jobs: &[ScheduledJob]) -> Baseline {
        build_baseline(jobs, &self.window)
    }

    /// Breaches already present in the baseline, without any candidate.
    pub fn baseline_violations(&self, baseline: &Baseline) -> Vec<Violation> {
        scan_violations(&baseline.histogram, &self.limits)
    }

    /// Decide whether `candidate` fits on top of `baseline`.
    pub fn admit(&self, baseline: &Baseline, candidate: &ScheduledJob) -> Result<AdmissionOutcome> {
        evaluate(&baseline.histogram, candidate, &self.window, &self.limits, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use cronload_core::ForecastError;

    use cronload_core::{CapacityConfig, ForecastConfig};

    use super::*;

    fn forecaster() -> Forecaster {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        Forecaster::new(
            SimulationWindow::hours(start, 6).unwrap(),
            CapacityLimits::from_hard_limit(5),
        )
    }

    #[test]
    fn baseline_and_candidate_share_the_window() {
        let f = forecaster();
        let jobs: Vec<_> = (0..3).map(|i| ScheduledJob::new(format!("j{i}"), "0 * * * *")).collect();
        let baseline = f.baseline(&jobs);
        let outcome = f.admit(&baseline, &ScheduledJob::new("c", "0 * * * *")).unwrap();

        // Same minute keys in both: the candidate lands on the baseline's hours.
        let baseline_keys: Vec<_> = baseline.histogram.iter().map(|(t, _)| t).collect();
        let merged_keys: Vec<_> = outcome.histogram.iter().map(|(t, _)| t).collect();
        assert_eq!(baseline_keys, merged_keys);
        assert!(outcome.histogram.iter().all(|(_, c)| c == 4));
        assert!(outcome.decision.safe);
    }

    #[test]
    fn baseline_violations_without_candidate() {
        let f = forecaster();
        let jobs: Vec<_> = (0..5).map(|i| ScheduledJob::new(format!("j{i}"), "30 2 * * *")).collect();
        let violations = f.baseline_violations(&f.baseline(&jobs));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].observed_count, 5);
    }

    #[test]
    fn from_config_uses_fallback_only_when_asked() {
        let config = Config {
            profile: String::new(),
            capacity: CapacityConfig {
                cpu_count: 16,
                max_searches_per_cpu: 2,
                fallback_hard_limit: 7,
                ..CapacityConfig::default()
            },
            forecast: ForecastConfig {
                horizon_hours: 6,
                soft_limit_policy: SoftLimitPolicy::Warn,
            },
        };

        let start = Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 12).unwrap();

        let resolved = Forecaster::from_config(&config, start, CapacitySource::Resolved).unwrap();
        assert_eq!(resolved.limits().hard_limit(), 16);
        assert_eq!(resolved.soft_limit_policy(), SoftLimitPolicy::Warn);
        assert_eq!(resolved.window().horizon(), Duration::hours(6));
        assert_eq!(
            resolved.window().start(),
            Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap()
        );

        let fallback = Forecaster::from_config(&config, start, CapacitySource::ConfiguredFallback).unwrap();
        assert_eq!(fallback.limits().hard_limit(), 7);
        assert_eq!(fallback.limits().soft_limit(), 5);

        let fixed = Forecaster::from_config(&config, start, CapacitySource::Fixed(3)).unwrap();
        assert_eq!(fixed.limits().hard_limit(), 3);
        assert!(!CapacitySource::Resolved.is_fallback());
        assert!(CapacitySource::Fixed(3).is_fallback());
    }

    #[test]
    fn unresolvable_capacity_is_a_configuration_error() {
        let mut config = Config {
            profile: String::new(),
            capacity: CapacityConfig::default(),
            forecast: ForecastConfig::default(),
        };
        config.capacity.max_scheduled_percentage = 150;
        let err = Forecaster::starting_now(&config, CapacitySource::Resolved).unwrap_err();
        assert!(matches!(err, ForecastError::Configuration(_)));

        // The fallback path never looks at the capacity inputs.
        assert!(Forecaster::starting_now(&config, CapacitySource::ConfiguredFallback).is_ok());
    }
}
