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

pub mod context;
pub mod engine;
pub mod error;
pub mod model;
pub mod recurrence;
pub mod repository;
pub mod request;
pub mod schedule;
pub mod scheduler;
pub mod timing;

pub use context::{QuietHours, TimeContext};
pub use engine::ReminderEngine;
pub use error::{ReminderError, Result};
pub use model::{DueReminder, Reminder, ReminderStatus, ReminderView, TriggerKind};
pub use recurrence::Recurrence;
pub use repository::{InMemoryReminderRepository, ReminderRepository};
pub use request::{EditRequest, SetRequest, SkipRequest, SnoozeRequest, ToggleRequest};
pub use schedule::{Schedule, ScheduleField};
pub use scheduler::ReminderScheduler;
pub use timing::{early_after, early_notification, next_fire, parse_offset, parse_timestamp};
