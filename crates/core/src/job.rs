use serde::{Deserialize, Serialize};

/// A periodically scheduled job as seen by one forecast run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: String,
    /// Standard 5-field cron expression. `None` (or blank) means unscheduled.
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ScheduledJob {
    pub fn new(id: impl Into<String>, cron_expression: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cron_expression: Some(cron_expression.into()),
            enabled: true,
        }
    }

    pub fn unscheduled(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cron_expression: None,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The configured cron expression, with blank strings treated as absent.
    pub fn schedule(&self) -> Option<&str> {
        self.cron_expression
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether this job takes part in simulation at all.
    pub fn is_simulated(&self) -> bool {
        self.enabled && self.schedule().is_some()
    }
}

impl std::fmt::Display for ScheduledJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.schedule() {
            Some(cron) => write!(f, "{} [{}]", self.id, cron),
            None => write!(f, "{} [unscheduled]", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cron_is_unscheduled() {
        let job = ScheduledJob::new("a", "   ");
        assert_eq!(job.schedule(), None);
        assert!(!job.is_simulated());
    }

    #[test]
    fn disabled_job_is_not_simulated() {
        let job = ScheduledJob::new("a", "*/5 * * * *").disabled();
        assert_eq!(job.schedule(), Some("*/5 * * * *"));
        assert!(!job.is_simulated());
    }

    #[test]
    fn deserialize_defaults_enabled() {
        let job: ScheduledJob =
            serde_json::from_str(r#"{"id":"x","cron_expression":"0 * * * *"}"#).unwrap();
        assert!(job.enabled);
        assert!(job.is_simulated());
    }
}
