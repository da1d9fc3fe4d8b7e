//! Integration tests for the reminder lifecycle.
//!
//! These tests verify that:
//! - Set derives the expression and the early notification
//! - Skip pushes the early notification strictly past the skip window
//! - Toggle and edit re-derive what they should and nothing else

use aria_reminders::{
    EditRequest, InMemoryReminderRepository, ReminderEngine, ReminderError, ReminderStatus,
    SetRequest, SkipRequest, SnoozeRequest, TimeContext, ToggleRequest, next_fire, parse_offset,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn engine(ctx: TimeContext) -> ReminderEngine {
    ReminderEngine::new(Arc::new(InMemoryReminderRepository::new()), ctx)
}

fn set(value: serde_json::Value) -> SetRequest {
    serde_json::from_value(value).expect("Failed to parse set request")
}

#[tokio::test]
async fn test_early_notification_is_exactly_offset_before_fire() {
    let ctx = TimeContext::new(chrono_tz::America::Los_Angeles);
    let engine = engine(ctx.clone());
    let now = at(2026, 3, 2, 12, 0);

    let reminder = engine
        .set(
            set(json!({
                "text": "team sync",
                "minute": 30,
                "hour": 10,
                "dow": "MON-FRI",
                "notification_offset": "1 hour 15 minutes"
            })),
            now,
        )
        .await
        .expect("Failed to set reminder");

    let early = reminder.early_notification.expect("early notification");
    let fire = next_fire(&reminder.recurrence().unwrap(), early, &ctx).unwrap();
    assert_eq!(fire - early, parse_offset("1 hour 15 minutes").unwrap());
    assert!(early > now);
}

#[tokio::test]
async fn test_skip_moves_early_notification_past_skip_until() {
    let engine = engine(TimeContext::default());
    let now = at(2026, 7, 1, 6, 0);

    let reminder = engine
        .set(
            set(json!({
                "text": "gym",
                "minute": 0,
                "hour": 7,
                "notification_offset": "30 minutes"
            })),
            now,
        )
        .await
        .expect("Failed to set reminder");
    assert_eq!(reminder.early_notification, Some(at(2026, 7, 1, 6, 30)));

    // Skip until just after tomorrow's warning would have fired.
    let skip_until = at(2026, 7, 2, 6, 45);
    let skipped = engine
        .skip(
            SkipRequest {
                id: reminder.id,
                until: skip_until.to_rfc3339(),
            },
            now,
        )
        .await
        .expect("Failed to skip reminder");

    assert_eq!(skipped.skip_until, Some(skip_until));
    assert_eq!(skipped.status, ReminderStatus::Enabled);
    let early = skipped.early_notification.unwrap();
    assert!(early > skip_until);
    assert_eq!(early, at(2026, 7, 3, 6, 30));
}

#[tokio::test]
async fn test_skip_reenables_disabled_reminder() {
    let engine = engine(TimeContext::default());
    let now = at(2026, 7, 1, 6, 0);
    let reminder = engine
        .set(set(json!({"text": "vitamins", "minute": 0, "hour": 8})), now)
        .await
        .unwrap();

    let disabled = engine
        .toggle(
            ToggleRequest {
                id: reminder.id,
                status: ReminderStatus::Disabled,
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(disabled.status, ReminderStatus::Disabled);
    assert_eq!(disabled.recurrence_expr, reminder.recurrence_expr);

    let skipped = engine
        .skip(
            SkipRequest {
                id: reminder.id,
                until: "2026-07-05".to_string(),
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(skipped.status, ReminderStatus::Enabled);
    assert_eq!(skipped.skip_until, Some(at(2026, 7, 5, 0, 0)));
}

#[tokio::test]
async fn test_toggle_reenable_rederives_early_notification() {
    let engine = engine(TimeContext::default());
    let created = at(2026, 1, 1, 0, 0);
    let reminder = engine
        .set(
            set(json!({"text": "call mom", "minute": 0, "hour": 18, "day": 1, "notification_offset": "2h"})),
            created,
        )
        .await
        .unwrap();
    assert_eq!(reminder.early_notification, Some(at(2026, 1, 1, 16, 0)));

    let later = at(2026, 1, 15, 0, 0);
    let reenabled = engine
        .toggle(
            ToggleRequest {
                id: reminder.id,
                status: ReminderStatus::Enabled,
            },
            later,
        )
        .await
        .unwrap();
    assert_eq!(reenabled.early_notification, Some(at(2026, 2, 1, 16, 0)));
}

#[tokio::test]
async fn test_snooze_leaves_schedule_alone() {
    let engine = engine(TimeContext::default());
    let now = at(2026, 4, 4, 9, 0);
    let reminder = engine
        .set(set(json!({"text": "stretch", "minute": "*/30"})), now)
        .await
        .unwrap();

    let snoozed = engine
        .snooze(
            SnoozeRequest {
                id: reminder.id,
                until: None,
                duration: Some("15 minutes".to_string()),
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(snoozed.snooze_until, Some(now + Duration::minutes(15)));
    assert_eq!(snoozed.status, reminder.status);
    assert_eq!(snoozed.recurrence_expr, "*/30 * * * *");

    let past = engine
        .snooze(
            SnoozeRequest {
                id: reminder.id,
                until: Some("2026-04-04T08:00:00Z".to_string()),
                duration: None,
            },
            now,
        )
        .await;
    assert!(matches!(past, Err(ReminderError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_edit_with_recurrence_and_year() {
    let engine = engine(TimeContext::default());
    let now = at(2026, 1, 1, 0, 0);
    let reminder = engine
        .set(set(json!({"text": "renew passport", "recurrence": "0 9 1 6 *"})), now)
        .await
        .unwrap();
    assert_eq!(reminder.recurrence_expr, "0 9 1 6 *");

    let edit: EditRequest =
        serde_json::from_value(json!({"id": reminder.id, "year": 2027, "text": "renew passport!"}))
            .unwrap();
    let edited = engine.edit(edit, now).await.unwrap();
    assert_eq!(edited.recurrence_expr, "0 0 9 1 6 * 2027-2027");
    assert_eq!(edited.schedule.year.as_ref().unwrap().as_str(), "2027");
    assert_eq!(edited.text, "renew passport!");
    assert_eq!(edited.created_at, reminder.created_at);

    let clear: EditRequest =
        serde_json::from_value(json!({"id": reminder.id, "year": null})).unwrap();
    let cleared = engine.edit(clear, now).await.unwrap();
    assert_eq!(cleared.recurrence_expr, "0 9 1 6 *");
}

#[tokio::test]
async fn test_lifecycle_on_missing_id_fails() {
    let engine = engine(TimeContext::default());
    let id = uuid::Uuid::now_v7();
    let result = engine
        .skip(
            SkipRequest {
                id,
                until: "2026-01-01".to_string(),
            },
            Utc::now(),
        )
        .await;
    assert!(matches!(result, Err(ReminderError::NotFound(_))));
}

#[tokio::test]
async fn test_describe_renders_local_times() {
    let ctx = TimeContext::new(chrono_tz::Europe::Berlin);
    let engine = engine(ctx);
    let now = at(2026, 1, 10, 6, 0);
    let reminder = engine
        .set(set(json!({"text": "bins out", "minute": 0, "hour": 20, "dow": "TUE"})), now)
        .await
        .unwrap();

    let view = engine.describe(&reminder, now);
    // 2026-01-13 is a Tuesday; Berlin is UTC+1 in winter.
    assert_eq!(view.next_fire.as_deref(), Some("2026-01-13T20:00:00+01:00"));
    assert_eq!(view.status, "enabled");
    let map = view.to_map();
    assert_eq!(map["recurrence"], "0 20 * * TUE");
}
