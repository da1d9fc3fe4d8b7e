use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::Reminder;

/// Reminder persistence. Writes are last-write-wins.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Reminder>>;

    async fn upsert(&self, reminder: &Reminder) -> anyhow::Result<()>;

    async fn list_enabled(&self) -> anyhow::Result<Vec<Reminder>>;

    async fn list_all(&self) -> anyhow::Result<Vec<Reminder>>;

    /// End of the last evaluated due-search window.
    async fn load_watermark(&self) -> anyhow::Result<Option<DateTime<Utc>>>;

    async fn store_watermark(&self, at: DateTime<Utc>) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct InMemoryReminderRepository {
    reminders: RwLock<BTreeMap<Uuid, Reminder>>,
    watermark: RwLock<Option<DateTime<Utc>>>,
}

impl InMemoryReminderRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderRepository for InMemoryReminderRepository {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Reminder>> {
        Ok(self.reminders.read().await.get(&id).cloned())
    }

    async fn upsert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        self.reminders
            .write()
            .await
            .insert(reminder.id, reminder.clone());
        Ok(())
    }

    async fn list_enabled(&self) -> anyhow::Result<Vec<Reminder>> {
        Ok(self
            .reminders
            .read()
            .await
            .values()
            .filter(|r| r.is_enabled())
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Reminder>> {
        Ok(self.reminders.read().await.values().cloned().collect())
    }

    async fn load_watermark(&self) -> anyhow::Result<Option<DateTime<Utc>>> {
        Ok(*self.watermark.read().await)
    }

    async fn store_watermark(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        *self.watermark.write().await = Some(at);
        Ok(())
    }
}
