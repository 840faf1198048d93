//! Tests for the cron simulation engine.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};

use cronload_core::{ForecastError, ScheduledJob};

use super::*;

/// Monday 2025-01-06 00:00 UTC.
fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap()
}

fn window_hours(start: DateTime<Utc>, hours: u64) -> SimulationWindow {
    SimulationWindow::hours(start, hours).unwrap()
}

fn firings(expr: &str, window: &SimulationWindow) -> Vec<DateTime<Utc>> {
    CronSchedule::parse(expr).unwrap().firings(window).collect()
}

// -- window ------------------------------------------------------------

#[test]
fn window_truncates_start_to_minute() {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 42).unwrap();
    let window = window_hours(start, 6);
    assert_eq!(window.start(), Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap());
    assert_eq!(window.horizon(), Duration::hours(6));
    assert!(!window.contains(window.start()));
    assert!(window.contains(window.start() + Duration::minutes(1)));
    assert!(!window.contains(window.end()));
}

#[test]
fn window_deserializes_through_validation() {
    let window: SimulationWindow =
        serde_json::from_str(r#"{"start":"2025-01-06T09:30:00Z","end":"2025-01-06T15:30:00Z"}"#).unwrap();
    assert_eq!(window.horizon(), Duration::hours(6));

    for json in [
        r#"{"start":"2025-01-06T09:30:00Z","end":"2025-01-06T08:30:00Z"}"#,
        r#"{"start":"2025-01-06T09:30:00Z","end":"2025-01-06T09:30:00Z"}"#,
        r#"{"start":"2025-01-06T09:30:15Z","end":"2025-01-06T15:30:00Z"}"#,
    ] {
        assert!(serde_json::from_str::<SimulationWindow>(json).is_err(), "{json}");
    }
}

#[test]
fn window_rejects_non_positive_horizon() {
    assert!(matches!(
        SimulationWindow::new(monday(), Duration::zero()),
        Err(ForecastError::Configuration(_))
    ));
    assert!(SimulationWindow::new(monday(), Duration::minutes(-5)).is_err());
}

// -- firing counts -----------------------------------------------------

#[test]
fn every_fifteen_minutes_over_six_hours() {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 3, 7, 12).unwrap();
    let window = window_hours(start, 6);
    let times = firings("*/15 * * * *", &window);

    assert_eq!(times.len(), 24);
    assert_eq!(times[0], Utc.with_ymd_and_hms(2025, 1, 6, 3, 15, 0).unwrap());
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::minutes(15));
    }
    assert!(*times.last().unwrap() < window.end());
}

#[test]
fn count_matches_horizon_over_period_for_unaligned_start() {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 3, 7, 0).unwrap();
    for (period, hours) in [(2u64, 2u64), (5, 6), (10, 24), (15, 6), (20, 24), (30, 24)] {
        let window = window_hours(start, hours);
        let times = firings(&format!("*/{period} * * * *"), &window);
        assert_eq!(times.len() as u64, hours * 60 / period, "*/{period} over {hours}h");
    }
}

#[test]
fn window_bounds_are_exclusive() {
    // Hourly from 00:00 over 3h: 01:00 and 02:00, not 00:00 or 03:00.
    let window = window_hours(monday(), 3);
    let hours: Vec<_> = firings("0 * * * *", &window).iter().map(|t| t.hour()).collect();
    assert_eq!(hours, vec![1, 2]);
}

#[test]
fn firing_in_the_current_minute_is_not_counted() {
    // 45 seconds past the hour: the 10:00 run has already started.
    let now = Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 45).unwrap();
    let window = window_hours(now, 6);
    let times = firings("0 * * * *", &window);
    assert_eq!(times[0], Utc.with_ymd_and_hms(2025, 1, 6, 11, 0, 0).unwrap());
    assert_eq!(times.len(), 5);
}

#[test]
fn firings_are_strictly_increasing_and_minute_aligned() {
    let window = window_hours(monday(), 24);
    let times = firings("*/7 1-3,22 * * *", &window);
    assert!(!times.is_empty());
    assert!(times.windows(2).all(|p| p[0] < p[1]));
    assert!(times.iter().all(|t| t.second() == 0 && t.nanosecond() == 0));
    assert!(times.iter().all(|t| window.contains(*t)));
}

#[test]
fn firings_iterator_is_lazy() {
    let schedule = CronSchedule::parse("* * * * *").unwrap();
    let window = window_hours(monday(), 24 * 365);
    let first_three: Vec<_> = schedule.firings(&window).take(3).collect();
    assert_eq!(first_three.len(), 3);
    assert_eq!(first_three[0], monday() + Duration::minutes(1));
    assert_eq!(first_three[2], monday() + Duration::minutes(3));
}

#[test]
fn schedule_that_never_fires_in_window_yields_nothing() {
    // Noon only, but the window covers 00:00-06:00.
    let window = window_hours(monday(), 6);
    assert!(firings("0 12 * * *", &window).is_empty());
}

// -- syntax ------------------------------------------------------------

#[test]
fn lists_ranges_and_steps() {
    let window = window_hours(monday(), 24);
    let times = firings("0,30 9-17/4 * * *", &window);
    let hours: Vec<_> = times.iter().map(|t| (t.hour(), t.minute())).collect();
    assert_eq!(
        hours,
        vec![(9, 0), (9, 30), (13, 0), (13, 30), (17, 0), (17, 30)]
    );
}

#[test]
fn start_with_step_runs_to_end_of_field() {
    let window = window_hours(monday(), 1);
    let minutes: Vec<_> = firings("50/5 * * * *", &window)
        .iter()
        .map(|t| t.minute())
        .collect();
    assert_eq!(minutes, vec![50, 55]);
}

#[test]
fn day_of_week_zero_and_seven_are_sunday() {
    let window = window_hours(monday(), 24 * 7);
    for expr in ["0 12 * * 0", "0 12 * * 7", "0 12 * * sun"] {
        let times = firings(expr, &window);
        assert_eq!(times.len(), 1, "{expr}");
        assert_eq!(times[0].weekday(), Weekday::Sun, "{expr}");
    }
}

#[test]
fn weekday_range_is_monday_to_friday() {
    let window = window_hours(monday(), 24 * 7);
    let days: Vec<_> = firings("0 6 * * 1-5", &window)
        .iter()
        .map(|t| t.weekday())
        .collect();
    assert_eq!(
        days,
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    );
}

#[test]
fn restricted_day_fields_match_either() {
    // The 10th of the month OR any Monday, over January 2025.
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let window = window_hours(start, 24 * 31);
    let days: Vec<_> = firings("0 0 10 * 1", &window).iter().map(|t| t.day()).collect();
    assert_eq!(days, vec![6, 10, 13, 20, 27]);
}

#[test]
fn starred_day_of_month_uses_day_of_week_only() {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let window = window_hours(start, 24 * 31);
    let days: Vec<_> = firings("0 0 * * 1", &window).iter().map(|t| t.day()).collect();
    assert_eq!(days, vec![6, 13, 20, 27]);
}

#[test]
fn month_names_are_accepted() {
    let start = Utc.with_ymd_and_hms(2024, 12, 31, 12, 0, 0).unwrap();
    let window = window_hours(start, 24 * 365);
    let months: Vec<_> = firings("0 0 1 jan,JUL *", &window)
        .iter()
        .map(|t| t.month())
        .collect();
    assert_eq!(months, vec![1, 7]);
}

#[test]
fn macros_expand() {
    let window = window_hours(monday() + Duration::minutes(30), 24);
    assert_eq!(firings("@hourly", &window).len(), 24);
    assert_eq!(firings("@daily", &window).len(), 1);
    assert_eq!(firings("@midnight", &window), firings("0 0 * * *", &window));
}

#[test]
fn invalid_expressions_are_rejected() {
    for expr in [
        "99 * * * *",
        "* 24 * * *",
        "* * 0 * *",
        "* * * 13 *",
        "* * * * 8",
        "*/0 * * * *",
        "5-1 * * * *",
        "1,,2 * * * *",
        "* * * *",
        "* * * * * *",
        "abc * * * *",
        "@fortnightly",
        "",
    ] {
        let err = CronSchedule::parse(expr).unwrap_err();
        assert!(err.is_invalid_schedule(), "{expr:?} should be invalid");
    }
}

#[test]
fn invalid_schedule_error_carries_expression() {
    match CronSchedule::parse(" 99 * * * * ") {
        Err(ForecastError::InvalidSchedule { expression, reason }) => {
            assert_eq!(expression, "99 * * * *");
            assert!(reason.contains("minute"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// -- simulate_job ------------------------------------------------------

#[test]
fn simulate_job_tags_events_with_job_id() {
    let window = window_hours(monday() + Duration::minutes(30), 2);
    let events = simulate_job(&ScheduledJob::new("hourly", "0 * * * *"), &window).unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.job_id == "hourly"));
}

#[test]
fn simulate_job_without_schedule_fails() {
    let window = window_hours(monday(), 2);
    let err = simulate_job(&ScheduledJob::unscheduled("none"), &window).unwrap_err();
    assert!(err.is_invalid_schedule());
}
