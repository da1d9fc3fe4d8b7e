//! Outbound seams: the message log and the chat/voice broadcast.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Role;

/// One line of conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: Role,
    pub text: String,
    /// Where the text came from, e.g. `cli`, `scheduler`.
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    #[must_use]
    pub fn now(role: Role, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait MessageLog: Send + Sync {
    async fn record(&self, entry: LogEntry) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Chat,
    Voice,
}

impl Destination {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Voice => "voice",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outbound {
    pub text: String,
    pub destination: Destination,
    pub timestamp: DateTime<Utc>,
}

impl Outbound {
    #[must_use]
    pub fn now(text: impl Into<String>, destination: Destination) -> Self {
        Self {
            text: text.into(),
            destination,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Broadcast: Send + Sync {
    async fn send(&self, message: Outbound) -> anyhow::Result<()>;
}
