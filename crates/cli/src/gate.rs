//! One admission run: load jobs, simulate, decide. Exit codes are the
//! contract deployment pipelines gate on.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info};

use cronload_core::{Config, ScheduledJob};
use cronload_forecast::source::{load_rule_file, load_rules_dir, load_saved_searches, LoadStatus, SavedSearchFilter};
use cronload_forecast::{AdmissionDecision, Forecaster};

use crate::cli::CliArgs;
use crate::report::Report;

pub const EXIT_SAFE: u8 = 0;
pub const EXIT_UNSAFE: u8 = 1;
pub const EXIT_CANNOT_COMPUTE: u8 = 2;

/// Map a run to the process exit code: 0 safe, 1 unsafe, 2 no verdict.
pub fn exit_code(outcome: &Result<Report>) -> u8 {
    match outcome {
        Ok(report) if report.decision.safe => EXIT_SAFE,
        Ok(_) => EXIT_UNSAFE,
        Err(_) => EXIT_CANNOT_COMPUTE,
    }
}

/// Run one forecast with `config` after applying flag overrides.
pub fn run(args: &CliArgs, mut config: Config) -> Result<Report> {
    if let Some(hours) = args.horizon_hours {
        config.forecast.horizon_hours = hours;
    }
    if let Some(policy) = args.soft_limit_policy {
        config.forecast.soft_limit_policy = policy.into();
    }
    config.log_summary();

    // Captured once: the baseline and the candidate share this window.
    let start = args.start.unwrap_or_else(Utc::now);
    let capacity = args.capacity_source();
    let forecaster =
        Forecaster::from_config(&config, start, capacity).context("failed to set up the forecast")?;

    let candidate = args
        .candidate
        .as_deref()
        .map(|path| {
            load_rule_file(path).with_context(|| format!("failed to load candidate {}", path.display()))
        })
        .transpose()?;

    let mut jobs = load_existing_jobs(args)?;
    if let Some(candidate) = &candidate {
        jobs = exclude_rescheduled(jobs, candidate);
    }

    let baseline = forecaster.baseline(&jobs);
    let baseline_violations = forecaster.baseline_violations(&baseline);

    let (decision, merged) = match &candidate {
        Some(candidate) => {
            let outcome = forecaster
                .admit(&baseline, candidate)
                .with_context(|| format!("cannot evaluate candidate '{}'", candidate.id))?;
            (outcome.decision, Some((candidate.id.clone(), outcome.histogram)))
        }
        None => (
            AdmissionDecision::from_violations(baseline_violations.clone(), forecaster.soft_limit_policy()),
            None,
        ),
    };

    Ok(Report::new(
        forecaster.window(),
        forecaster.limits(),
        capacity.is_fallback(),
        forecaster.soft_limit_policy(),
        baseline,
        baseline_violations,
        merged.as_ref().map(|(id, histogram)| (id.clone(), histogram)),
        decision,
    ))
}

/// Drop existing jobs that share the candidate's id. Re-scheduling a job
/// replaces it rather than doubling it.
pub fn exclude_rescheduled(mut jobs: Vec<ScheduledJob>, candidate: &ScheduledJob) -> Vec<ScheduledJob> {
    let before = jobs.len();
    jobs.retain(|job| job.id != candidate.id);
    if jobs.len() != before {
        info!(job_id = %candidate.id, "candidate replaces an existing job");
    }
    jobs
}

pub fn load_existing_jobs(args: &CliArgs) -> Result<Vec<ScheduledJob>> {
    let mut jobs = Vec::new();

    if let Some(path) = &args.jobs {
        let filter = SavedSearchFilter {
            app: args.app.clone(),
            alerts_only: args.alerts_only,
        };
        let listed = load_saved_searches(path, &filter)
            .with_context(|| format!("failed to load saved searches from {}", path.display()))?;
        info!(path = %path.display(), count = listed.len(), "loaded saved searches");
        jobs.extend(listed);
    }

    if let Some(dir) = &args.rules_dir {
        let (rules, results) =
            load_rules_dir(dir).with_context(|| format!("failed to scan rules directory {}", dir.display()))?;
        for result in &results {
            if let LoadStatus::Skipped { reason } = &result.status {
                debug!(path = %result.path.display(), %reason, "skipped rule file");
            }
        }
        jobs.extend(rules);
    }

    Ok(jobs)
}
