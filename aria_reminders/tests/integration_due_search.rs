//! Integration tests for the due-reminder search.
//!
//! These tests verify that:
//! - Static triggers (snooze, early notification) fire once and are tagged
//! - Disabled, skipped and ended reminders never come back
//! - The watermark catches up after downtime, but only so far

use aria_reminders::{
    InMemoryReminderRepository, Recurrence, ReminderEngine, ReminderStatus, SetRequest,
    SkipRequest, SnoozeRequest, TimeContext, ToggleRequest, TriggerKind, next_fire,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn engine() -> ReminderEngine {
    ReminderEngine::new(
        Arc::new(InMemoryReminderRepository::new()),
        TimeContext::default(),
    )
}

fn set(value: serde_json::Value) -> SetRequest {
    serde_json::from_value(value).expect("Failed to parse set request")
}

#[tokio::test]
async fn test_snooze_just_past_is_returned_once() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 10, 0, 0);
    let reminder = engine
        .set(set(json!({"text": "stretch", "minute": 0, "hour": 3})), t0)
        .await
        .expect("Failed to set reminder");

    let now = at(2026, 5, 1, 10, 20, 0);
    engine
        .snooze(
            SnoozeRequest {
                id: reminder.id,
                until: Some((now - Duration::seconds(5)).to_rfc3339()),
                duration: None,
            },
            t0,
        )
        .await
        .expect("Failed to snooze reminder");

    let due = engine.search_due(now).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].reminder.id, reminder.id);
    assert_eq!(due[0].trigger, TriggerKind::SnoozeReturn);
    assert_eq!(due[0].at, now - Duration::seconds(5));

    let fired = engine.fire_due(now).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].reminder.snooze_until, None);
    assert!(engine.search_due(now).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disabled_reminder_never_due() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 8, 0, 0);
    let reminder = engine
        .set(set(json!({"text": "pills", "minute": 0, "hour": 9})), t0)
        .await
        .unwrap();
    engine
        .snooze(
            SnoozeRequest {
                id: reminder.id,
                until: Some("2026-05-01T09:00:00Z".to_string()),
                duration: None,
            },
            t0,
        )
        .await
        .unwrap();
    engine
        .toggle(
            ToggleRequest {
                id: reminder.id,
                status: ReminderStatus::Disabled,
            },
            t0,
        )
        .await
        .unwrap();

    assert!(engine.search_due(at(2026, 5, 1, 9, 0, 0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_skip_and_end_suppress_occurrences() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 8, 0, 0);
    let skipped = engine
        .set(set(json!({"text": "standup", "minute": 0, "hour": 9})), t0)
        .await
        .unwrap();
    engine
        .skip(
            SkipRequest {
                id: skipped.id,
                until: "2026-05-03 00:00".to_string(),
            },
            t0,
        )
        .await
        .unwrap();
    engine
        .set(
            set(json!({"text": "old", "minute": 0, "hour": 9, "ends_on": "2026-04-30"})),
            t0,
        )
        .await
        .unwrap();

    let nine = at(2026, 5, 1, 9, 0, 5);
    assert!(engine.search_due(nine).await.unwrap().is_empty());

    let after_skip = at(2026, 5, 3, 9, 0, 5);
    let due = engine.search_due(after_skip).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].reminder.id, skipped.id);
    assert_eq!(due[0].trigger, TriggerKind::Occurrence);
}

#[tokio::test]
async fn test_early_notification_then_occurrence() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 10, 0, 0);
    let reminder = engine
        .set(
            set(json!({"text": "lunch", "minute": 0, "hour": 12, "notification_offset": "10 minutes"})),
            t0,
        )
        .await
        .unwrap();
    assert_eq!(reminder.early_notification, Some(at(2026, 5, 1, 11, 50, 0)));

    let fired = engine.fire_due(at(2026, 5, 1, 11, 50, 10)).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].trigger, TriggerKind::EarlyNotification);
    assert_eq!(
        fired[0].reminder.early_notification,
        Some(at(2026, 5, 2, 11, 50, 0))
    );

    let fired = engine.fire_due(at(2026, 5, 1, 12, 0, 5)).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].trigger, TriggerKind::Occurrence);
    assert_eq!(fired[0].at, at(2026, 5, 1, 12, 0, 0));
    assert_eq!(fired[0].reminder.last_triggered, Some(at(2026, 5, 1, 12, 0, 0)));
}

#[tokio::test]
async fn test_early_only_skips_occurrence() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 10, 0, 0);
    engine
        .set(
            set(json!({
                "text": "leave for airport",
                "minute": 0,
                "hour": 12,
                "notification_offset": "10 minutes",
                "early_only": true
            })),
            t0,
        )
        .await
        .unwrap();

    assert_eq!(
        engine.fire_due(at(2026, 5, 1, 11, 50, 0)).await.unwrap().len(),
        1
    );
    assert!(engine.fire_due(at(2026, 5, 1, 12, 0, 0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fire_due_is_idempotent() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 8, 0, 0);
    engine
        .set(set(json!({"text": "water", "minute": "*/5"})), t0)
        .await
        .unwrap();

    let now = at(2026, 5, 1, 8, 10, 0);
    assert_eq!(engine.fire_due(now).await.unwrap().len(), 1);
    assert!(engine.fire_due(now).await.unwrap().is_empty());
    assert!(engine
        .fire_due(now + Duration::seconds(30))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_watermark_catches_up_after_downtime() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 9, 0, 0);
    let reminder = engine
        .set(set(json!({"text": "meds", "minute": 5, "hour": 10})), t0)
        .await
        .unwrap();

    assert!(engine.fire_due(at(2026, 5, 1, 10, 0, 0)).await.unwrap().is_empty());
    // The process was down over 10:05.
    let fired = engine.fire_due(at(2026, 5, 1, 10, 20, 0)).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].reminder.id, reminder.id);
    assert_eq!(fired[0].at, at(2026, 5, 1, 10, 5, 0));
}

#[tokio::test]
async fn test_catch_up_is_capped() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 9, 0, 0);
    engine
        .set(set(json!({"text": "meds", "minute": 5, "hour": 11})), t0)
        .await
        .unwrap();

    assert!(engine.fire_due(at(2026, 5, 1, 11, 0, 0)).await.unwrap().is_empty());
    // Two hours of downtime exceed the one hour catch-up limit.
    assert!(engine.fire_due(at(2026, 5, 1, 13, 0, 0)).await.unwrap().is_empty());
}

#[test]
fn test_next_fire_is_strict_and_monotone() {
    let ctx = TimeContext::new(chrono_tz::America::New_York);
    for expr in ["*/7 * * * *", "0 9 * * 1-5", "30 1 * * *", "30 2 * * *", "0 0 29 2 *"] {
        let recurrence = Recurrence::parse(expr).unwrap();
        let mut previous = None;
        // Spans both 2026 DST transitions in New York.
        for step in 0..400 {
            let (origin, offset) = if step < 200 {
                (at(2026, 3, 6, 0, 0, 0), step)
            } else {
                (at(2026, 10, 29, 0, 0, 0), step - 200)
            };
            let base = origin + Duration::minutes(offset * 37);
            let next = next_fire(&recurrence, base, &ctx).unwrap();
            assert!(next > base, "{expr}: {next} not after {base}");
            if let Some(previous) = previous {
                assert!(next >= previous, "{expr}: {next} before {previous}");
            }
            previous = Some(next);
        }
    }
}

#[tokio::test]
async fn test_early_only_recovers_after_missed_window() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 8, 0, 0);
    engine
        .set(
            set(json!({
                "text": "leave for the train",
                "minute": 0,
                "hour": 9,
                "notification_offset": "10 minutes",
                "early_only": true
            })),
            t0,
        )
        .await
        .expect("Failed to set reminder");

    // Nothing ran during the first day's 08:50 window.
    let fired = engine
        .fire_due(at(2026, 5, 2, 8, 50, 0))
        .await
        .expect("Failed to fire due reminders");
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].trigger, TriggerKind::EarlyNotification);
    assert_eq!(fired[0].at, at(2026, 5, 2, 8, 50, 0));

    let fired = engine.fire_due(at(2026, 5, 3, 8, 50, 0)).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].at, at(2026, 5, 3, 8, 50, 0));
}

#[tokio::test]
async fn test_missed_early_notification_is_moved_forward() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 8, 0, 0);
    let reminder = engine
        .set(
            set(json!({
                "text": "warm up",
                "minute": 0,
                "hour": 9,
                "notification_offset": "10 minutes",
                "early_only": true
            })),
            t0,
        )
        .await
        .unwrap();

    // A tick outside any window still repairs the stale warning.
    assert!(engine.fire_due(at(2026, 5, 1, 20, 0, 0)).await.unwrap().is_empty());
    let stored = engine
        .list()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.id == reminder.id)
        .expect("reminder");
    assert_eq!(stored.early_notification, Some(at(2026, 5, 2, 8, 50, 0)));
}

#[tokio::test]
async fn test_snooze_return_consumes_early_notification_in_same_window() {
    let engine = engine();
    let t0 = at(2026, 5, 1, 10, 0, 0);
    let reminder = engine
        .set(
            set(json!({"text": "lunch", "minute": 0, "hour": 12, "notification_offset": "10 minutes"})),
            t0,
        )
        .await
        .unwrap();
    engine
        .snooze(
            SnoozeRequest {
                id: reminder.id,
                until: Some("2026-05-01T11:50:05Z".to_string()),
                duration: None,
            },
            t0,
        )
        .await
        .unwrap();

    let fired = engine.fire_due(at(2026, 5, 1, 11, 50, 0)).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].trigger, TriggerKind::SnoozeReturn);
    assert_eq!(fired[0].reminder.snooze_until, None);
    assert_eq!(
        fired[0].reminder.early_notification,
        Some(at(2026, 5, 2, 11, 50, 0))
    );

    let fired = engine.fire_due(at(2026, 5, 1, 12, 0, 0)).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].trigger, TriggerKind::Occurrence);
}
