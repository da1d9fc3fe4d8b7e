use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::info;

use super::{CLOSER, Directive};

/// Table of known directives, keyed by lowercase name.
pub struct DirectiveRegistry {
    directives: BTreeMap<String, Arc<dyn Directive>>,
}

impl DirectiveRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            directives: BTreeMap::new(),
        }
    }

    /// Register a directive, replacing any earlier one with the same name.
    pub fn register(&mut self, directive: Arc<dyn Directive>) {
        info!("Registering directive: {}", directive.name());
        self.directives
            .insert(directive.name().to_ascii_lowercase(), directive);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Directive>> {
        self.directives.get(&name.to_ascii_lowercase()).cloned()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.directives.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Usage guide for the system prompt: syntax, then every directive's
    /// trigger phrases and payload template.
    #[must_use]
    pub fn prompt_guide(&self) -> String {
        let mut guide = format!(
            "# Directives\n\nTo act, emit a block `[DIRECTIVE: name] {{ json payload }} {CLOSER}` anywhere in your reply. \
             The block is removed before the user sees the reply. Never put directives inside code fences unless you want them ignored.\n"
        );
        for directive in self.directives.values() {
            let _ = write!(
                guide,
                "\n## {}\nUse when the user says: {}\nFormat: [DIRECTIVE: {}] {}\n",
                directive.name(),
                quote_phrases(directive.trigger_phrases()),
                directive.name(),
                directive.format(),
            );
        }
        guide
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn quote_phrases(phrases: &[&str]) -> String {
    phrases
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
