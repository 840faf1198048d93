//! 5-field cron parsing, validation, and normalization for the `cron` crate.
//!
//! The `cron` crate wants 6 fields (seconds first), numbers days of the week
//! 1-7 starting at Sunday, and requires day-of-month AND day-of-week to match.
//! Standard cron numbers days 0-7 (0 and 7 are Sunday) and matches a day when
//! EITHER restricted day field matches. Each field is therefore expanded to an
//! explicit value list here, and an expression with both day fields restricted
//! becomes two schedules whose firings are merged.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use cronload_core::{ForecastError, Result};

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Static description of one cron field.
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    /// Upper bound used when expanding `*`; differs from `max` only for
    /// day-of-week, where 7 is an alias for 0.
    star_max: u32,
    /// Symbolic names, where `names[i]` maps to `min + i` (`SUN` → 0).
    names: &'static [&'static str],
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59, star_max: 59, names: &[] };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23, star_max: 23, names: &[] };
const DAY_OF_MONTH: FieldSpec =
    FieldSpec { name: "day-of-month", min: 1, max: 31, star_max: 31, names: &[] };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12, star_max: 12, names: MONTH_NAMES };
const DAY_OF_WEEK: FieldSpec =
    FieldSpec { name: "day-of-week", min: 0, max: 7, star_max: 6, names: DAY_NAMES };

/// Expand `@hourly`-style macros to their 5-field form.
fn expand_macro(expr: &str) -> Option<&'static str> {
    match expr.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => Some("0 0 1 1 *"),
        "@monthly" => Some("0 0 1 * *"),
        "@weekly" => Some("0 0 * * 0"),
        "@daily" | "@midnight" => Some("0 0 * * *"),
        "@hourly" => Some("0 * * * *"),
        _ => None,
    }
}

impl FieldSpec {
    fn value(&self, token: &str) -> std::result::Result<u32, String> {
        if let Ok(v) = token.parse::<u32>() {
            if v < self.min || v > self.max {
                return Err(format!(
                    "{} value {} out of range {}-{}",
                    self.name, v, self.min, self.max
                ));
            }
            return Ok(v);
        }
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(token))
            .map(|i| self.min + i as u32)
            .ok_or_else(|| format!("invalid {} value '{}'", self.name, token))
    }

    /// Expand one comma-separated field into the set of values it matches.
    fn expand(&self, field: &str) -> std::result::Result<BTreeSet<u32>, String> {
        let mut values = BTreeSet::new();
        for part in field.split(',') {
            if part.is_empty() {
                return Err(format!("empty list item in {} field '{}'", self.name, field));
            }

            let (range, step) = match part.split_once('/') {
                Some((r, s)) => match s.parse::<u32>() {
                    Ok(v) if v > 0 => (r, Some(v)),
                    _ => return Err(format!("invalid step '{}' in {} field", s, self.name)),
                },
                None => (part, None),
            };

            let (start, end) = if range == "*" {
                (self.min, self.star_max)
            } else if let Some((a, b)) = range.split_once('-') {
                let (a, b) = (self.value(a)?, self.value(b)?);
                if a > b {
                    return Err(format!("descending range '{}' in {} field", range, self.name));
                }
                (a, b)
            } else {
                let v = self.value(range)?;
                // `a/n` runs from `a` to the end of the field.
                (v, if step.is_some() { self.star_max.max(v) } else { v })
            };

            let step = step.unwrap_or(1) as usize;
            values.extend((start..=end).step_by(step));
        }
        Ok(values)
    }

    /// Render an expanded value set in the `cron` crate's dialect.
    fn render(&self, values: &BTreeSet<u32>) -> String {
        if self.name == DAY_OF_WEEK.name {
            // 7 folds onto Sunday; emit names so numbering never matters.
            let days: BTreeSet<u32> = values.iter().map(|d| d % 7).collect();
            if days.len() == 7 {
                return "*".to_string();
            }
            return days
                .iter()
                .map(|d| DAY_NAMES[*d as usize])
                .collect::<Vec<_>>()
                .join(",");
        }
        if values.len() as u32 == self.star_max - self.min + 1 {
            return "*".to_string();
        }
        values.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
    }
}

/// A parsed, validated 5-field cron schedule.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedules: Vec<Schedule>,
}

impl CronSchedule {
    /// Parse a standard 5-field cron expression (or `@hourly`-style macro).
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        let invalid = |reason: String| ForecastError::invalid_schedule(trimmed, reason);

        let source = if trimmed.starts_with('@') {
            expand_macro(trimmed).ok_or_else(|| invalid(format!("unknown macro '{trimmed}'")))?
        } else {
            trimmed
        };

        let fields: Vec<&str> = source.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(format!(
                "cron must have exactly 5 fields (min hour dom month dow), got {}",
                fields.len()
            )));
        }

        let specs = [&MINUTE, &HOUR, &DAY_OF_MONTH, &MONTH, &DAY_OF_WEEK];
        let mut rendered = Vec::with_capacity(5);
        for (field, spec) in fields.iter().zip(specs) {
            let values = spec.expand(field).map_err(invalid)?;
            rendered.push(spec.render(&values));
        }
        let [minute, hour, dom, month, dow] = [
            &rendered[0], &rendered[1], &rendered[2], &rendered[3], &rendered[4],
        ];

        let dom_restricted = !fields[2].starts_with('*');
        let dow_restricted = !fields[4].starts_with('*');
        let variants = if dom_restricted && dow_restricted {
            vec![
                format!("0 {minute} {hour} {dom} {month} *"),
                format!("0 {minute} {hour} * {month} {dow}"),
            ]
        } else {
            vec![format!("0 {minute} {hour} {dom} {month} {dow}")]
        };

        let schedules = variants
            .iter()
            .map(|v| Schedule::from_str(v).map_err(|e| invalid(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            expression: trimmed.to_string(),
            schedules,
        })
    }

    /// The expression as supplied (trimmed).
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The earliest firing strictly after `cursor`, if the schedule ever fires again.
    pub fn next_after(&self, cursor: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedules
            .iter()
            .filter_map(|s| s.after(cursor).next())
            .min()
    }
}

impl FromStr for CronSchedule {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
