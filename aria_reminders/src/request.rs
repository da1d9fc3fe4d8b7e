//! Directive payload shapes for the reminder lifecycle.
//!
//! Timestamps stay strings here; the engine reads them on the user's clock.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::model::ReminderStatus;
use crate::schedule::{Schedule, ScheduleField};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetRequest {
    pub text: String,
    #[serde(flatten)]
    pub schedule: Schedule,
    /// A full recurrence expression, used instead of the schedule fields.
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub notification_offset: Option<String>,
    #[serde(default)]
    pub ends_on: Option<String>,
    #[serde(default)]
    pub early_only: bool,
}

/// Partial update. An absent key leaves the field alone; an explicit `null`
/// clears the optional ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditRequest {
    pub id: Uuid,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub minute: Option<ScheduleField>,
    #[serde(default)]
    pub hour: Option<ScheduleField>,
    #[serde(default)]
    pub day: Option<ScheduleField>,
    #[serde(default)]
    pub month: Option<ScheduleField>,
    #[serde(default, alias = "day_of_week")]
    pub dow: Option<ScheduleField>,
    #[serde(default, deserialize_with = "nullable")]
    pub year: Option<Option<ScheduleField>>,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notification_offset: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub ends_on: Option<Option<String>>,
    #[serde(default)]
    pub early_only: Option<bool>,
}

impl EditRequest {
    pub(crate) fn touches_schedule(&self) -> bool {
        self.minute.is_some()
            || self.hour.is_some()
            || self.day.is_some()
            || self.month.is_some()
            || self.dow.is_some()
            || self.year.is_some()
            || self.recurrence.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnoozeRequest {
    pub id: Uuid,
    #[serde(default)]
    pub until: Option<String>,
    /// Duration from now, e.g. `15 minutes`.
    #[serde(default, rename = "for", alias = "duration")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkipRequest {
    pub id: Uuid,
    pub until: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleRequest {
    pub id: Uuid,
    pub status: ReminderStatus,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
