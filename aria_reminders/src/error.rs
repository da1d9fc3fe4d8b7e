use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ReminderError>;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Reminder not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid {field} field '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid recurrence expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: String },

    #[error("Invalid notification offset '{0}'")]
    InvalidOffset(String),

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Invalid time zone '{0}'")]
    InvalidTimeZone(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ReminderError {
    pub(crate) fn field(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn expression(expr: &str, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}
