//! Long-term fact storage seam.
//!
//! The document store and vector index live outside this workspace; directive
//! handlers only need to append facts and read them back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::content_hash;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fact {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Fact {
    #[must_use]
    pub fn new(text: impl Into<String>, tags: Vec<String>) -> Self {
        let text = text.into();
        Self {
            id: Uuid::now_v7(),
            content_hash: content_hash(&text, &tags),
            text,
            tags,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store a fact. Returns the id of the stored fact, which is the id of an
    /// existing fact when one with the same content hash is already present.
    async fn remember(&self, fact: &Fact) -> anyhow::Result<Uuid>;

    async fn list(&self) -> anyhow::Result<Vec<Fact>>;
}
