//! Reminders kept in a single JSON document.
//!
//! Rows are stored as raw JSON so a row that no longer parses is skipped on
//! read but survives every rewrite untouched.

use aria_reminders::{Reminder, ReminderRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::jsonl::{read_optional, write_atomic};

const FILE_NAME: &str = "reminders.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    watermark: Option<DateTime<Utc>>,
    #[serde(default)]
    reminders: Vec<Value>,
}

impl Document {
    fn parsed(&self) -> impl Iterator<Item = Reminder> + '_ {
        self.reminders
            .iter()
            .filter_map(|row| match serde_json::from_value::<Reminder>(row.clone()) {
                Ok(reminder) => Some(reminder),
                Err(e) => {
                    let id = row.get("id").and_then(Value::as_str).unwrap_or("?");
                    warn!("Skipping corrupt reminder {id}: {e}");
                    None
                }
            })
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        let id = id.to_string();
        self.reminders
            .iter()
            .position(|row| row.get("id").and_then(Value::as_str) == Some(id.as_str()))
    }
}

pub struct JsonFileReminderRepository {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl JsonFileReminderRepository {
    /// Store `reminders.json` inside `dir`.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(FILE_NAME);
        debug!(?path, "JsonFileReminderRepository::new");
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document> {
        match read_optional(&self.path).await? {
            None => Ok(Document::default()),
            Some(content) if content.trim().is_empty() => Ok(Document::default()),
            Some(content) => {
                serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    async fn save(&self, doc: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        write_atomic(&self.path, &bytes).await
    }
}

#[async_trait]
impl ReminderRepository for JsonFileReminderRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Reminder>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.parsed().find(|r| r.id == id))
    }

    async fn upsert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let row = serde_json::to_value(reminder)?;
        match doc.position(reminder.id) {
            Some(index) => doc.reminders[index] = row,
            None => doc.reminders.push(row),
        }
        self.save(&doc).await?;
        debug!("Stored reminder {}", reminder.id);
        Ok(())
    }

    async fn list_enabled(&self) -> anyhow::Result<Vec<Reminder>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .parsed()
            .filter(Reminder::is_enabled)
            .collect())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Reminder>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.parsed().collect())
    }

    async fn load_watermark(&self) -> anyhow::Result<Option<DateTime<Utc>>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.watermark)
    }

    async fn store_watermark(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        doc.watermark = Some(at);
        self.save(&doc).await?;
        Ok(())
    }
}
