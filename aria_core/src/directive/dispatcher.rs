use chrono::{DateTime, Utc};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::projector::{compose, render_note};
use super::{Directive, DirectiveRegistry, DirectiveResult, DirectiveStatus, scan};

/// Replacement for a directive block that shows nothing to the user.
pub const BLANK_LINE: &str = "\n";

/// Runs the directive blocks found in a text and rebuilds the text around them.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<DirectiveRegistry>,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(registry: Arc<DirectiveRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    pub async fn process(&self, text: &str) -> (String, Vec<DirectiveResult>) {
        self.process_at(text, Utc::now()).await
    }

    /// Execute every directive in `text` in order of appearance. `now` is used
    /// for relative timestamps in system notes.
    pub async fn process_at(
        &self,
        text: &str,
        now: DateTime<Utc>,
    ) -> (String, Vec<DirectiveResult>) {
        let matches = scan(text);
        if matches.is_empty() {
            return (text.to_string(), Vec::new());
        }

        let mut cleaned = String::with_capacity(text.len());
        let mut results = Vec::with_capacity(matches.len());
        let mut cursor = 0;

        for found in matches {
            cleaned.push_str(&text[cursor..found.span.0]);
            cursor = found.span.1;

            let (result, replacement) = self.run(&found.name, &found.payload_text, now).await;
            match result.status {
                DirectiveStatus::Ok => info!("Directive {} ok", result.name),
                status => warn!(
                    "Directive {} {}: {}",
                    result.name,
                    status.as_str(),
                    result.error.as_deref().unwrap_or("")
                ),
            }
            cleaned.push_str(&replacement);
            results.push(result);
        }

        cleaned.push_str(&text[cursor..]);
        (cleaned, results)
    }

    async fn run(
        &self,
        name: &str,
        payload_text: &str,
        now: DateTime<Utc>,
    ) -> (DirectiveResult, String) {
        let payload = match serde_json::from_str::<Value>(payload_text) {
            Ok(value) if value.is_object() => value,
            Ok(_) => {
                let error = "payload is not a JSON object".to_string();
                return Self::stripped(name, Value::Null, DirectiveStatus::ParseError, error);
            }
            Err(e) => {
                return Self::stripped(
                    name,
                    Value::Null,
                    DirectiveStatus::ParseError,
                    e.to_string(),
                );
            }
        };

        let Some(directive) = self.registry.get(name) else {
            let error = format!("unknown directive: {name}");
            return Self::stripped(name, payload, DirectiveStatus::NoHandler, error);
        };

        debug!("Executing directive {name} with payload {payload}");
        let output = match invoke(Arc::clone(&directive), payload.clone()).await {
            Ok(output) => output,
            Err(error) => return Self::stripped(name, payload, DirectiveStatus::Error, error),
        };

        let mut result = DirectiveResult {
            name: directive.name().to_string(),
            payload,
            status: DirectiveStatus::Ok,
            error: None,
            visible: String::new(),
            hidden: serde_json::Map::new(),
        };

        let Some(projection) = directive.project(&output) else {
            return (result, BLANK_LINE.to_string());
        };

        let note = directive.note_schema().and_then(|schema| {
            render_note(
                directive.name(),
                &schema,
                &projection.hidden,
                &self.registry,
                now,
            )
        });
        let replacement = compose(&projection.visible, note.as_deref());
        result.visible = projection.visible;
        result.hidden = projection.hidden;
        (result, replacement)
    }

    fn stripped(
        name: &str,
        payload: Value,
        status: DirectiveStatus,
        error: String,
    ) -> (DirectiveResult, String) {
        (
            DirectiveResult::failed(name, payload, status, error),
            BLANK_LINE.to_string(),
        )
    }
}

/// Run a handler on its own task so that an error or a panic stays contained.
async fn invoke(directive: Arc<dyn Directive>, payload: Value) -> Result<Value, String> {
    let handle = tokio::spawn(async move { directive.execute(payload).await });
    match handle.await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(join) if join.is_panic() => Err(panic_message(join.into_panic())),
        Err(join) => Err(join.to_string()),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .map_or_else(
            || "directive panicked".to_string(),
            |msg| format!("directive panicked: {msg}"),
        )
}
