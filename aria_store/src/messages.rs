use aria_core::{LogEntry, MessageLog};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::jsonl;

/// Conversation history appended to `messages.jsonl`.
pub struct JsonlMessageLog {
    path: PathBuf,
}

impl JsonlMessageLog {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("messages.jsonl"),
        }
    }

    pub async fn entries(&self) -> anyhow::Result<Vec<LogEntry>> {
        Ok(jsonl::read_all(&self.path).await?)
    }
}

#[async_trait]
impl MessageLog for JsonlMessageLog {
    async fn record(&self, entry: LogEntry) -> anyhow::Result<()> {
        jsonl::append(&self.path, &entry).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMessageLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryMessageLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn record(&self, entry: LogEntry) -> anyhow::Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
