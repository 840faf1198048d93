//! End-to-end admission scenarios through the public API.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

use cronload_forecast::{
    resolve, CapacityInputs, CapacityLimits, Forecaster, ForecastError, ScheduledJob,
    SimulationWindow, ViolationKind,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()
}

fn nine() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
}

/// Opens one minute before `start()` so a firing at `start()` is in range.
fn window() -> SimulationWindow {
    SimulationWindow::hours(start() - Duration::minutes(1), 6).unwrap()
}

fn forecaster(hard_limit: u64) -> Forecaster {
    Forecaster::new(
        window(),
        CapacityLimits::from_hard_limit(hard_limit),
    )
}

fn at_nine(n: usize) -> Vec<ScheduledJob> {
    (0..n)
        .map(|i| ScheduledJob::new(format!("nine-{i}"), "0 9 * * *"))
        .collect()
}

#[test]
fn fifteen_minute_job_over_six_hours() {
    let f = forecaster(5);
    let baseline = f.baseline(&[ScheduledJob::new("q", "*/15 * * * *")]);
    let times: Vec<_> = baseline.histogram.iter().map(|(t, _)| t).collect();
    assert_eq!(times.len(), 24);
    assert_eq!(times[0], start());
    assert_eq!(*times.last().unwrap(), start() + Duration::minutes(23 * 15));
    assert!(*times.last().unwrap() < f.window().end());
}

#[test]
fn two_hourly_jobs_count_two_on_each_hour() {
    let f = forecaster(5);
    let baseline = f.baseline(&[
        ScheduledJob::new("a", "0 * * * *"),
        ScheduledJob::new("b", "0 * * * *"),
    ]);
    assert_eq!(baseline.histogram.len(), 6);
    assert!(baseline
        .histogram
        .iter()
        .all(|(t, c)| t.minute() == 0 && c == 2));
    assert_eq!(baseline.histogram.count_at(start() + Duration::minutes(1)), 0);
}

#[test]
fn merged_count_at_soft_limit_is_safe() {
    let f = forecaster(5);
    assert_eq!(f.limits().soft_limit(), 4);
    let baseline = f.baseline(&at_nine(3));
    assert_eq!(baseline.histogram.count_at(nine()), 3);

    let outcome = f.admit(&baseline, &ScheduledJob::new("candidate", "0 9 * * *")).unwrap();
    assert_eq!(outcome.histogram.count_at(nine()), 4);
    assert!(outcome.decision.safe);
    assert!(outcome.decision.violations.is_empty());
}

#[test]
fn merged_count_at_hard_limit_is_a_soft_violation() {
    let f = forecaster(5);
    let baseline = f.baseline(&at_nine(4));
    let outcome = f.admit(&baseline, &ScheduledJob::new("candidate", "0 9 * * *")).unwrap();

    assert!(!outcome.decision.safe);
    assert_eq!(outcome.decision.violations.len(), 1);
    let v = &outcome.decision.violations[0];
    assert_eq!(v.timestamp, nine());
    assert_eq!(v.kind, ViolationKind::Soft);
    assert_eq!(v.observed_count, 5);
    assert_eq!(v.limit, 4);
}

#[test]
fn invalid_candidate_produces_no_decision() {
    let f = forecaster(5);
    let baseline = f.baseline(&at_nine(3));
    let result = f.admit(&baseline, &ScheduledJob::new("candidate", "99 * * * *"));
    assert!(matches!(result, Err(ForecastError::InvalidSchedule { .. })));
}

#[test]
fn invalid_existing_job_does_not_abort_run() {
    let f = forecaster(5);
    let mut jobs = at_nine(2);
    jobs.push(ScheduledJob::new("broken", "99 * * * *"));
    let baseline = f.baseline(&jobs);
    assert_eq!(baseline.histogram.count_at(nine()), 2);
    assert_eq!(baseline.skipped().count(), 1);
}

#[test]
fn resolved_capacity_drives_the_decision() {
    // 4 cpus * 1 = 4 < base 6; 100% → hard 6, soft 4.
    let limits = resolve(&CapacityInputs {
        cpu_count: Some(4),
        max_searches_per_cpu: Some(1),
        base_max_searches: Some(6),
        max_scheduled_percentage: Some(100),
        role_quota: None,
    })
    .unwrap();
    assert_eq!((limits.hard_limit(), limits.soft_limit()), (6, 4));

    let f = Forecaster::new(window(), limits);
    let baseline = f.baseline(&at_nine(6));
    let outcome = f.admit(&baseline, &ScheduledJob::new("candidate", "0 9 * * *")).unwrap();
    assert_eq!(outcome.decision.hard_violations().count(), 1);
    assert_eq!(outcome.decision.soft_violations().count(), 0);
}
