use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::TimeContext;
use crate::error::Result;
use crate::recurrence::Recurrence;
use crate::schedule::Schedule;
use crate::timing::{next_fire, parse_offset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    #[serde(alias = "enable", alias = "on")]
    Enabled,
    #[serde(alias = "disable", alias = "off")]
    Disabled,
}

impl ReminderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// A persisted reminder. `recurrence_expr` and `early_notification` are
/// derived and only the engine writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub text: String,
    pub schedule: Schedule,
    pub recurrence_expr: String,
    #[serde(default)]
    pub notification_offset: Option<String>,
    #[serde(default)]
    pub early_notification: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snooze_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skip_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ReminderStatus,
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub early_only: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    pub fn recurrence(&self) -> Result<Recurrence> {
        Recurrence::parse(&self.recurrence_expr)
    }

    pub fn offset(&self) -> Result<Option<Duration>> {
        self.notification_offset
            .as_deref()
            .map(parse_offset)
            .transpose()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == ReminderStatus::Enabled
    }
}

/// Which trigger made a reminder due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Occurrence,
    EarlyNotification,
    SnoozeReturn,
}

impl TriggerKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Occurrence => "occurrence",
            Self::EarlyNotification => "early_notification",
            Self::SnoozeReturn => "snooze_return",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub trigger: TriggerKind,
    /// The trigger instant that fell inside the search window.
    pub at: DateTime<Utc>,
}

impl DueReminder {
    /// Text delivered to the user when the reminder fires.
    #[must_use]
    pub fn announcement(&self) -> String {
        let text = &self.reminder.text;
        match self.trigger {
            TriggerKind::Occurrence => format!("Reminder: {text}"),
            TriggerKind::EarlyNotification => match &self.reminder.notification_offset {
                Some(offset) => format!("Coming up in {offset}: {text}"),
                None => format!("Coming up: {text}"),
            },
            TriggerKind::SnoozeReturn => format!("Snoozed reminder: {text}"),
        }
    }
}

/// A reminder as shown to the model, timestamps rendered on the user's clock.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderView {
    pub id: String,
    pub text: String,
    pub recurrence: String,
    pub status: &'static str,
    pub next_fire: Option<String>,
    pub notification_offset: Option<String>,
    pub early_notification: Option<String>,
    pub snooze_until: Option<String>,
    pub skip_until: Option<String>,
    pub ends_on: Option<String>,
    pub last_triggered: Option<String>,
    pub early_only: bool,
}

impl ReminderView {
    #[must_use]
    pub fn new(reminder: &Reminder, now: DateTime<Utc>, ctx: &TimeContext) -> Self {
        let local = |ts: Option<DateTime<Utc>>| ts.map(|ts| ctx.local(ts).to_rfc3339());
        let base = reminder.skip_until.map_or(now, |skip| skip.max(now));
        let next = reminder
            .recurrence()
            .ok()
            .and_then(|r| next_fire(&r, base, ctx))
            .filter(|fire| reminder.ends_on.is_none_or(|end| *fire <= end));

        Self {
            id: reminder.id.to_string(),
            text: reminder.text.clone(),
            recurrence: reminder.recurrence_expr.clone(),
            status: reminder.status.as_str(),
            next_fire: local(next),
            notification_offset: reminder.notification_offset.clone(),
            early_notification: local(reminder.early_notification),
            snooze_until: local(reminder.snooze_until),
            skip_until: local(reminder.skip_until),
            ends_on: local(reminder.ends_on),
            last_triggered: local(reminder.last_triggered),
            early_only: reminder.early_only,
        }
    }

    #[must_use]
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}
