use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// Capacity inputs are missing, non-numeric, or out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A cron expression could not be parsed.
    #[error("Invalid schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },
}

impl ForecastError {
    pub fn config(message: impl Into<String>) -> Self {
        ForecastError::Configuration(message.into())
    }

    pub fn invalid_schedule(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        ForecastError::InvalidSchedule {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn is_invalid_schedule(&self) -> bool {
        matches!(self, ForecastError::InvalidSchedule { .. })
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
