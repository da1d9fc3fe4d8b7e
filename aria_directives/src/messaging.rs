//! Outbound delivery. Sends are spawned and never awaited by the dispatcher.

use async_trait::async_trait;
use aria_core::{Broadcast, Destination, Directive, Outbound};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::parse_payload;

#[derive(Debug, Deserialize)]
struct MessageRequest {
    text: String,
}

fn queue(
    broadcast: &Arc<dyn Broadcast>,
    directive: &str,
    payload: Value,
    destination: Destination,
) -> anyhow::Result<Value> {
    let req: MessageRequest = parse_payload(directive, payload)?;
    anyhow::ensure!(!req.text.trim().is_empty(), "message text is empty");

    let message = Outbound::now(req.text, destination);
    let broadcast = Arc::clone(broadcast);
    tokio::spawn(async move {
        let destination = message.destination.as_str();
        match broadcast.send(message).await {
            Ok(()) => debug!("Delivered message to {destination}"),
            Err(e) => warn!("Delivery to {destination} failed: {e}"),
        }
    });
    Ok(json!({"queued": true, "destination": destination.as_str()}))
}

pub struct SendMessage {
    broadcast: Arc<dyn Broadcast>,
}

impl SendMessage {
    #[must_use]
    pub fn new(broadcast: Arc<dyn Broadcast>) -> Self {
        Self { broadcast }
    }
}

#[async_trait]
impl Directive for SendMessage {
    fn name(&self) -> &'static str {
        "send_message"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["send me", "message me", "post to chat"]
    }

    fn format(&self) -> &'static str {
        r#"{"text": "<message for the chat surface>"}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        queue(&self.broadcast, self.name(), payload, Destination::Chat)
    }
}

pub struct Speak {
    broadcast: Arc<dyn Broadcast>,
}

impl Speak {
    #[must_use]
    pub fn new(broadcast: Arc<dyn Broadcast>) -> Self {
        Self { broadcast }
    }
}

#[async_trait]
impl Directive for Speak {
    fn name(&self) -> &'static str {
        "speak"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["say it out loud", "read it aloud", "announce"]
    }

    fn format(&self) -> &'static str {
        r#"{"text": "<sentence to speak>"}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        queue(&self.broadcast, self.name(), payload, Destination::Voice)
    }
}
