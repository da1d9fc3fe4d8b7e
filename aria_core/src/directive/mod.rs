//! Directive blocks embedded in model output.
//!
//! A reply may carry blocks of the form
//! `[DIRECTIVE: name] { json payload } [/DIRECTIVE]`. The [`scan`] function
//! finds them, the [`Dispatcher`] runs the matching [`Directive`] from a
//! [`DirectiveRegistry`], and the projector renders what the handler wants the
//! user (and the model, on the next turn) to see.

mod dispatcher;
mod projector;
mod registry;
mod scanner;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use dispatcher::{BLANK_LINE, Dispatcher};
pub use projector::{NOTE_CLOSE, NOTE_OPEN, compose, render_note};
pub use registry::DirectiveRegistry;
pub use scanner::{CLOSER, DirectiveMatch, HEADER_OPEN, ProtectedRegions, scan};

/// A named action the model can request.
#[async_trait]
pub trait Directive: Send + Sync {
    fn name(&self) -> &'static str;

    /// Phrases that should prompt the model to use this directive.
    fn trigger_phrases(&self) -> &'static [&'static str];

    /// Payload template shown to the model.
    fn format(&self) -> &'static str;

    async fn execute(&self, payload: Value) -> anyhow::Result<Value>;

    /// Split a successful output into a user-visible message and hidden data.
    /// Directives returning `None` leave only a blank line behind.
    fn project(&self, _output: &Value) -> Option<Projection> {
        None
    }

    fn note_schema(&self) -> Option<NoteSchema> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub visible: String,
    pub hidden: Map<String, Value>,
}

/// How hidden fields are rendered into a system note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteSchema {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Fields holding RFC 3339 timestamps, rendered relative to now.
    #[serde(default)]
    pub humanize: Vec<String>,
    #[serde(default)]
    pub child_directives: Vec<String>,
}

impl NoteSchema {
    #[must_use]
    pub fn include(mut self, keys: &[&str]) -> Self {
        self.include = keys.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn exclude(mut self, keys: &[&str]) -> Self {
        self.exclude = keys.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn rename(mut self, key: &str, label: &str) -> Self {
        self.rename.insert(key.to_string(), label.to_string());
        self
    }

    #[must_use]
    pub fn humanize(mut self, keys: &[&str]) -> Self {
        self.humanize = keys.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn children(mut self, names: &[&str]) -> Self {
        self.child_directives = names.iter().map(ToString::to_string).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveStatus {
    Ok,
    ParseError,
    NoHandler,
    Error,
}

impl DirectiveStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ParseError => "parse_error",
            Self::NoHandler => "no_handler",
            Self::Error => "error",
        }
    }
}

/// Outcome of one directive block.
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveResult {
    pub name: String,
    pub payload: Value,
    pub status: DirectiveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub visible: String,
    pub hidden: Map<String, Value>,
}

impl DirectiveResult {
    fn failed(name: &str, payload: Value, status: DirectiveStatus, error: String) -> Self {
        Self {
            name: name.to_string(),
            payload,
            status,
            error: Some(error),
            visible: String::new(),
            hidden: Map::new(),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == DirectiveStatus::Ok
    }
}
