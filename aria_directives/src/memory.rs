use async_trait::async_trait;
use aria_core::{Directive, Fact, MemoryStore};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::parse_payload;

#[derive(Debug, Deserialize)]
struct RememberRequest {
    text: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Stores a long-term fact about the user. Leaves nothing visible behind.
pub struct RememberFact {
    store: Arc<dyn MemoryStore>,
}

impl RememberFact {
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Directive for RememberFact {
    fn name(&self) -> &'static str {
        "remember_fact"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["remember that", "don't forget that", "keep in mind", "note that I"]
    }

    fn format(&self) -> &'static str {
        r#"{"text": "<fact about the user>", "tags": ["<optional tag>"]}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        let req: RememberRequest = parse_payload(self.name(), payload)?;
        let text = req.text.trim();
        anyhow::ensure!(!text.is_empty(), "fact text is empty");

        let fact = Fact::new(text, req.tags);
        let id = self.store.remember(&fact).await?;
        let duplicate = id != fact.id;
        info!("Fact {id} remembered (duplicate: {duplicate})");
        Ok(json!({"id": id, "duplicate": duplicate}))
    }
}
