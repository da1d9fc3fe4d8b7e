#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod memory;
pub mod messaging;
pub mod reminders;

pub use memory::RememberFact;
pub use messaging::{SendMessage, Speak};
pub use reminders::{
    EditReminder, ListReminders, SetReminder, SkipReminder, SnoozeReminder, ToggleReminder,
};

use anyhow::Context;
use aria_core::{Broadcast, DirectiveRegistry, MemoryStore};
use aria_reminders::ReminderEngine;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Collaborators the built-in directives act on.
#[derive(Clone)]
pub struct DirectiveDeps {
    pub memory: Arc<dyn MemoryStore>,
    pub broadcast: Arc<dyn Broadcast>,
    pub reminders: Arc<ReminderEngine>,
}

/// Registry with every built-in directive registered.
#[must_use]
pub fn default_registry(deps: &DirectiveDeps) -> DirectiveRegistry {
    let mut registry = DirectiveRegistry::new();
    registry.register(Arc::new(RememberFact::new(Arc::clone(&deps.memory))));
    registry.register(Arc::new(SendMessage::new(Arc::clone(&deps.broadcast))));
    registry.register(Arc::new(Speak::new(Arc::clone(&deps.broadcast))));
    registry.register(Arc::new(SetReminder::new(Arc::clone(&deps.reminders))));
    registry.register(Arc::new(EditReminder::new(Arc::clone(&deps.reminders))));
    registry.register(Arc::new(SnoozeReminder::new(Arc::clone(&deps.reminders))));
    registry.register(Arc::new(SkipReminder::new(Arc::clone(&deps.reminders))));
    registry.register(Arc::new(ToggleReminder::new(Arc::clone(&deps.reminders))));
    registry.register(Arc::new(ListReminders::new(Arc::clone(&deps.reminders))));
    registry
}

/// Decode a directive payload into its request type.
pub(crate) fn parse_payload<T: DeserializeOwned>(
    directive: &str,
    payload: Value,
) -> anyhow::Result<T> {
    serde_json::from_value(payload).with_context(|| format!("invalid {directive} payload"))
}
