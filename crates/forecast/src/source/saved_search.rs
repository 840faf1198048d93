//! Saved-search listings exported from the platform's REST API.
//!
//! Shape: `{"entry": [{"name": ..., "acl": {"app": ...}, "content":
//! {"cron_schedule": ..., "disabled": ..., "is_scheduled": ...}}]}`.
//! Flags arrive as booleans, integers, or `"0"`/`"1"` strings depending on
//! the endpoint, so they are read leniently. Alerting searches also carry
//! `alert_type` and `actions`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use cronload_core::ScheduledJob;

use super::error::Result;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    name: String,
    #[serde(default)]
    acl: Acl,
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Acl {
    #[serde(default)]
    app: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    cron_schedule: Option<String>,
    #[serde(default)]
    disabled: Option<Value>,
    #[serde(default)]
    is_scheduled: Option<Value>,
    #[serde(default)]
    alert_type: Option<String>,
    #[serde(default)]
    actions: Option<String>,
}

impl Content {
    /// An alert has a type and at least one action. The REST API renders an
    /// empty action list as `""` or the literal `"None"`.
    fn is_alert(&self) -> bool {
        let has_type = self.alert_type.as_deref().is_some_and(|t| !t.trim().is_empty());
        let has_actions = self
            .actions
            .as_deref()
            .map(str::trim)
            .is_some_and(|a| !a.is_empty() && a != "None");
        has_type && has_actions
    }
}

/// Restricts which saved searches become jobs.
#[derive(Debug, Clone, Default)]
pub struct SavedSearchFilter {
    /// Only keep searches owned by this app.
    pub app: Option<String>,
    /// Only keep searches that raise alerts (non-empty `alert_type` and `actions`).
    pub alerts_only: bool,
}

fn flag(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0).unwrap_or(default),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => true,
            "0" | "false" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Parse a saved-search listing into jobs.
///
/// Searches that are not scheduled are dropped. A missing `disabled` flag is
/// treated as disabled.
pub fn parse_saved_searches(json: &str, filter: &SavedSearchFilter) -> Result<Vec<ScheduledJob>> {
    let listing: Listing = serde_json::from_str(json)?;
    let total = listing.entry.len();

    let jobs: Vec<ScheduledJob> = listing
        .entry
        .into_iter()
        .filter(|e| flag(e.content.is_scheduled.as_ref(), false))
        .filter(|e| match &filter.app {
            Some(app) => e.acl.app.as_deref() == Some(app.as_str()),
            None => true,
        })
        .filter(|e| !filter.alerts_only || e.content.is_alert())
        .map(|e| ScheduledJob {
            enabled: !flag(e.content.disabled.as_ref(), true),
            cron_expression: e.content.cron_schedule,
            id: e.name,
        })
        .collect();

    debug!(entries = total, scheduled = jobs.len(), "parsed saved-search listing");
    Ok(jobs)
}

/// Read and parse a saved-search listing file.
pub fn load_saved_searches(path: &Path, filter: &SavedSearchFilter) -> Result<Vec<ScheduledJob>> {
    let contents = fs::read_to_string(path)?;
    parse_saved_searches(&contents, filter)
}
