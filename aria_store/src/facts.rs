use aria_core::{Fact, MemoryStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::jsonl;

/// Facts appended to `facts.jsonl`, deduplicated by content hash.
pub struct JsonlMemoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlMemoryStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("facts.jsonl"),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl MemoryStore for JsonlMemoryStore {
    async fn remember(&self, fact: &Fact) -> anyhow::Result<Uuid> {
        let _guard = self.lock.lock().await;
        let existing: Vec<Fact> = jsonl::read_all(&self.path).await?;
        if let Some(known) = existing
            .iter()
            .find(|f| f.content_hash == fact.content_hash)
        {
            debug!("Fact already known as {}", known.id);
            return Ok(known.id);
        }

        jsonl::append(&self.path, fact).await?;
        info!("Remembered fact {}", fact.id);
        Ok(fact.id)
    }

    async fn list(&self) -> anyhow::Result<Vec<Fact>> {
        let _guard = self.lock.lock().await;
        Ok(jsonl::read_all(&self.path).await?)
    }
}

#[derive(Default)]
pub struct InMemoryMemoryStore {
    facts: RwLock<Vec<Fact>>,
}

impl InMemoryMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn remember(&self, fact: &Fact) -> anyhow::Result<Uuid> {
        let mut facts = self.facts.write().await;
        if let Some(known) = facts.iter().find(|f| f.content_hash == fact.content_hash) {
            return Ok(known.id);
        }
        facts.push(fact.clone());
        Ok(fact.id)
    }

    async fn list(&self) -> anyhow::Result<Vec<Fact>> {
        Ok(self.facts.read().await.clone())
    }
}
