//! Reminder lifecycle directives.
//!
//! Every directive here returns the [`ReminderView`] of the reminder it touched
//! (or a list of them). The projection turns that into a one-line confirmation
//! for the user and hands the full view to the model as a system note, so a
//! later turn can refer to the reminder id.

use async_trait::async_trait;
use aria_core::{Directive, NoteSchema, Projection};
use aria_reminders::{
    EditRequest, Reminder, ReminderEngine, ReminderStatus, SetRequest, SkipRequest, SnoozeRequest,
    ToggleRequest,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::info;

use crate::parse_payload;

const TIMESTAMP_FIELDS: &[&str] = &[
    "next_fire",
    "early_notification",
    "snooze_until",
    "skip_until",
    "ends_on",
    "last_triggered",
];

const FOLLOW_UPS: &[&str] = &[
    "edit_reminder",
    "snooze_reminder",
    "skip_reminder",
    "toggle_reminder",
];

fn view(engine: &ReminderEngine, reminder: &Reminder, now: DateTime<Utc>) -> Value {
    Value::Object(engine.describe(reminder, now).to_map())
}

fn field<'a>(output: &'a Value, key: &str) -> &'a str {
    output.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Short local rendering of an RFC 3339 field, e.g. `Tue 13 Jan 20:00`.
fn when(output: &Value, key: &str) -> String {
    output
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or_else(
            || "no upcoming time".to_string(),
            |t| t.format("%a %-d %b %H:%M").to_string(),
        )
}

fn single(output: &Value, visible: String) -> Option<Projection> {
    let hidden = output.as_object()?.clone();
    Some(Projection { visible, hidden })
}

fn single_schema(children: &[&str]) -> NoteSchema {
    NoteSchema::default()
        .exclude(&["text"])
        .rename("next_fire", "next fire")
        .rename("early_notification", "early warning")
        .humanize(TIMESTAMP_FIELDS)
        .children(children)
}

pub struct SetReminder {
    engine: Arc<ReminderEngine>,
}

impl SetReminder {
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Directive for SetReminder {
    fn name(&self) -> &'static str {
        "set_reminder"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["remind me", "set a reminder", "every day at", "don't let me forget"]
    }

    fn format(&self) -> &'static str {
        r#"{"text": "<what to remind>", "minute": "0", "hour": "9", "day": "*", "month": "*", "dow": "MON-FRI", "year": null, "notification_offset": "15 minutes", "ends_on": null, "early_only": false}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        let req: SetRequest = parse_payload(self.name(), payload)?;
        let now = Utc::now();
        let reminder = self.engine.set(req, now).await?;
        info!("Reminder {} set via directive", reminder.id);
        Ok(view(&self.engine, &reminder, now))
    }

    fn project(&self, output: &Value) -> Option<Projection> {
        let visible = format!(
            "Reminder set: {} (next: {})",
            field(output, "text"),
            when(output, "next_fire")
        );
        single(output, visible)
    }

    fn note_schema(&self) -> Option<NoteSchema> {
        Some(single_schema(FOLLOW_UPS))
    }
}

pub struct EditReminder {
    engine: Arc<ReminderEngine>,
}

impl EditReminder {
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Directive for EditReminder {
    fn name(&self) -> &'static str {
        "edit_reminder"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["change the reminder", "move my reminder", "update the reminder"]
    }

    fn format(&self) -> &'static str {
        r#"{"id": "<reminder id>", "text": "<optional>", "hour": "<optional>", "minute": "<optional>", "notification_offset": "<optional, null clears>"}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        let req: EditRequest = parse_payload(self.name(), payload)?;
        let now = Utc::now();
        let reminder = self.engine.edit(req, now).await?;
        Ok(view(&self.engine, &reminder, now))
    }

    fn project(&self, output: &Value) -> Option<Projection> {
        let visible = format!(
            "Reminder updated: {} (next: {})",
            field(output, "text"),
            when(output, "next_fire")
        );
        single(output, visible)
    }

    fn note_schema(&self) -> Option<NoteSchema> {
        Some(single_schema(&["snooze_reminder", "skip_reminder", "toggle_reminder"]))
    }
}

pub struct SnoozeReminder {
    engine: Arc<ReminderEngine>,
}

impl SnoozeReminder {
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Directive for SnoozeReminder {
    fn name(&self) -> &'static str {
        "snooze_reminder"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["snooze", "remind me again in", "later please"]
    }

    fn format(&self) -> &'static str {
        r#"{"id": "<reminder id>", "for": "10 minutes"} or {"id": "<reminder id>", "until": "2026-01-01 09:00"}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        let req: SnoozeRequest = parse_payload(self.name(), payload)?;
        let now = Utc::now();
        let reminder = self.engine.snooze(req, now).await?;
        Ok(view(&self.engine, &reminder, now))
    }

    fn project(&self, output: &Value) -> Option<Projection> {
        let visible = format!(
            "Snoozed \"{}\" until {}",
            field(output, "text"),
            when(output, "snooze_until")
        );
        single(output, visible)
    }

    fn note_schema(&self) -> Option<NoteSchema> {
        Some(
            NoteSchema::default()
                .include(&["id", "snooze_until", "next_fire"])
                .rename("snooze_until", "back")
                .humanize(&["snooze_until", "next_fire"])
                .children(&["snooze_reminder", "skip_reminder"]),
        )
    }
}

pub struct SkipReminder {
    engine: Arc<ReminderEngine>,
}

impl SkipReminder {
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Directive for SkipReminder {
    fn name(&self) -> &'static str {
        "skip_reminder"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["skip", "not this week", "pause until"]
    }

    fn format(&self) -> &'static str {
        r#"{"id": "<reminder id>", "until": "2026-01-08"}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        let req: SkipRequest = parse_payload(self.name(), payload)?;
        let now = Utc::now();
        let reminder = self.engine.skip(req, now).await?;
        Ok(view(&self.engine, &reminder, now))
    }

    fn project(&self, output: &Value) -> Option<Projection> {
        let visible = format!(
            "Skipping \"{}\" until {}",
            field(output, "text"),
            when(output, "skip_until")
        );
        single(output, visible)
    }

    fn note_schema(&self) -> Option<NoteSchema> {
        Some(single_schema(&["edit_reminder", "toggle_reminder"]))
    }
}

pub struct ToggleReminder {
    engine: Arc<ReminderEngine>,
}

impl ToggleReminder {
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Directive for ToggleReminder {
    fn name(&self) -> &'static str {
        "toggle_reminder"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &[
            "turn off the reminder",
            "turn on the reminder",
            "stop reminding me",
            "resume the reminder",
        ]
    }

    fn format(&self) -> &'static str {
        r#"{"id": "<reminder id>", "status": "enabled | disabled"}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        let req: ToggleRequest = parse_payload(self.name(), payload)?;
        let now = Utc::now();
        let reminder = self.engine.toggle(req, now).await?;
        Ok(view(&self.engine, &reminder, now))
    }

    fn project(&self, output: &Value) -> Option<Projection> {
        let visible = format!(
            "Reminder {}: {}",
            field(output, "status"),
            field(output, "text")
        );
        single(output, visible)
    }

    fn note_schema(&self) -> Option<NoteSchema> {
        Some(single_schema(&["toggle_reminder"]))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListRequest {
    #[serde(default)]
    status: Option<ReminderStatus>,
}

pub struct ListReminders {
    engine: Arc<ReminderEngine>,
}

impl ListReminders {
    #[must_use]
    pub fn new(engine: Arc<ReminderEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Directive for ListReminders {
    fn name(&self) -> &'static str {
        "list_reminders"
    }

    fn trigger_phrases(&self) -> &'static [&'static str] {
        &["what reminders", "list my reminders", "show my reminders"]
    }

    fn format(&self) -> &'static str {
        r#"{"status": "<optional: enabled | disabled>"}"#
    }

    async fn execute(&self, payload: Value) -> anyhow::Result<Value> {
        let req: ListRequest = parse_payload(self.name(), payload)?;
        let now = Utc::now();
        let reminders: Vec<Value> = self
            .engine
            .list()
            .await?
            .iter()
            .filter(|r| req.status.is_none_or(|status| r.status == status))
            .map(|r| view(&self.engine, r, now))
            .collect();
        Ok(json!({"count": reminders.len(), "reminders": reminders}))
    }

    fn project(&self, output: &Value) -> Option<Projection> {
        let reminders = output.get("reminders").and_then(Value::as_array)?;
        let visible = match reminders.len() {
            0 => "You have no reminders.".to_string(),
            1 => "You have 1 reminder.".to_string(),
            n => format!("You have {n} reminders."),
        };

        let summary: Vec<Value> = reminders
            .iter()
            .map(|r| {
                json!({
                    "id": field(r, "id"),
                    "text": field(r, "text"),
                    "status": field(r, "status"),
                    "next": when(r, "next_fire"),
                })
            })
            .collect();
        let mut hidden = Map::new();
        hidden.insert("count".to_string(), json!(reminders.len()));
        hidden.insert("reminders".to_string(), Value::Array(summary));
        Some(Projection { visible, hidden })
    }

    fn note_schema(&self) -> Option<NoteSchema> {
        Some(NoteSchema::default().children(FOLLOW_UPS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_reminders::{InMemoryReminderRepository, TimeContext};

    fn engine() -> Arc<ReminderEngine> {
        Arc::new(ReminderEngine::new(
            Arc::new(InMemoryReminderRepository::new()),
            TimeContext::default(),
        ))
    }

    #[tokio::test]
    async fn set_returns_view_and_projects_confirmation() {
        let directive = SetReminder::new(engine());
        let output = directive
            .execute(json!({"text": "water plants", "minute": 0, "hour": 8}))
            .await
            .unwrap();
        assert_eq!(output["recurrence"], "0 8 * * *");
        assert_eq!(output["status"], "enabled");

        let projection = directive.project(&output).unwrap();
        assert!(projection.visible.starts_with("Reminder set: water plants (next: "));
        assert!(projection.hidden.contains_key("id"));
        assert!(projection.hidden.contains_key("next_fire"));
    }

    #[tokio::test]
    async fn bad_payload_is_an_error() {
        let directive = SetReminder::new(engine());
        let err = directive.execute(json!({"minute": 0})).await.unwrap_err();
        assert!(err.to_string().contains("set_reminder"));
    }

    #[tokio::test]
    async fn toggle_then_list_filters_by_status() {
        let engine = engine();
        let set = SetReminder::new(Arc::clone(&engine));
        let first = set
            .execute(json!({"text": "a", "minute": 0, "hour": 7}))
            .await
            .unwrap();
        set.execute(json!({"text": "b", "minute": 30, "hour": 7}))
            .await
            .unwrap();

        let toggle = ToggleReminder::new(Arc::clone(&engine));
        let output = toggle
            .execute(json!({"id": first["id"], "status": "off"}))
            .await
            .unwrap();
        assert_eq!(toggle.project(&output).unwrap().visible, "Reminder disabled: a");

        let list = ListReminders::new(engine);
        let all = list.execute(json!({})).await.unwrap();
        assert_eq!(all["count"], 2);
        let enabled = list.execute(json!({"status": "enabled"})).await.unwrap();
        assert_eq!(enabled["count"], 1);
        assert_eq!(enabled["reminders"][0]["text"], "b");
        assert_eq!(list.project(&enabled).unwrap().visible, "You have 1 reminder.");
    }

    #[tokio::test]
    async fn snooze_for_duration() {
        let engine = engine();
        let output = SetReminder::new(Arc::clone(&engine))
            .execute(json!({"text": "stretch", "minute": "*/30"}))
            .await
            .unwrap();

        let snooze = SnoozeReminder::new(engine);
        let snoozed = snooze
            .execute(json!({"id": output["id"], "for": "10 minutes"}))
            .await
            .unwrap();
        assert!(snoozed["snooze_until"].is_string());
        assert!(
            snooze
                .project(&snoozed)
                .unwrap()
                .visible
                .starts_with("Snoozed \"stretch\" until ")
        );
    }

    #[test]
    fn when_renders_missing_time() {
        assert_eq!(when(&json!({}), "next_fire"), "no upcoming time");
        assert_eq!(
            when(&json!({"next_fire": "2026-01-13T20:00:00+01:00"}), "next_fire"),
            "Tue 13 Jan 20:00"
        );
    }
}
