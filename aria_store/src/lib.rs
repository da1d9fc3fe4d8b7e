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

//! File-backed and in-memory adapters for the assistant's storage seams.

pub mod broadcast;
pub mod error;
pub mod facts;
pub mod jsonl;
pub mod messages;
pub mod reminders;

pub use broadcast::{ChannelBroadcast, StdoutBroadcast};
pub use error::{Result, StoreError};
pub use facts::{InMemoryMemoryStore, JsonlMemoryStore};
pub use messages::{InMemoryMessageLog, JsonlMessageLog};
pub use reminders::JsonFileReminderRepository;
