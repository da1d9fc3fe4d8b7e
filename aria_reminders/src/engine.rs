//! Reminder lifecycle and the "what fires now" search.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::TimeContext;
use crate::error::{ReminderError, Result};
use crate::model::{DueReminder, Reminder, ReminderStatus, ReminderView, TriggerKind};
use crate::repository::ReminderRepository;
use crate::request::{EditRequest, SetRequest, SkipRequest, SnoozeRequest, ToggleRequest};
use crate::schedule::Schedule;
use crate::timing::{early_after, parse_offset, parse_timestamp};

/// Result of one due search.
struct Sweep {
    due: Vec<DueReminder>,
    /// Reminders whose missed early notification was moved forward.
    refreshed: Vec<Reminder>,
    /// End of the evaluated window.
    upper: DateTime<Utc>,
}

/// Every operation takes `now` explicitly so callers and tests control the clock.
pub struct ReminderEngine {
    repo: Arc<dyn ReminderRepository>,
    ctx: TimeContext,
}

impl ReminderEngine {
    #[must_use]
    pub const fn new(repo: Arc<dyn ReminderRepository>, ctx: TimeContext) -> Self {
        Self { repo, ctx }
    }

    #[must_use]
    pub const fn context(&self) -> &TimeContext {
        &self.ctx
    }

    pub async fn set(&self, req: SetRequest, now: DateTime<Utc>) -> Result<Reminder> {
        let text = req.text.trim();
        if text.is_empty() {
            return Err(ReminderError::InvalidRequest(
                "reminder text is empty".to_string(),
            ));
        }

        let schedule = match req.recurrence.as_deref() {
            Some(expr) => Schedule::from_expression(expr)?,
            None => req.schedule,
        };
        let notification_offset = req
            .notification_offset
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        let ends_on = req
            .ends_on
            .as_deref()
            .map(|s| parse_timestamp(s, self.ctx.tz))
            .transpose()?;

        let mut reminder = Reminder {
            id: Uuid::now_v7(),
            text: text.to_string(),
            schedule: schedule.normalized(),
            recurrence_expr: String::new(),
            notification_offset,
            early_notification: None,
            ends_on,
            snooze_until: None,
            skip_until: None,
            status: ReminderStatus::Enabled,
            last_triggered: None,
            early_only: req.early_only,
            created_at: now,
            updated_at: now,
        };
        check_early_only(&reminder)?;
        self.derive(&mut reminder, now)?;
        self.repo.upsert(&reminder).await?;

        info!(
            "Reminder {} set: '{}' at '{}'",
            reminder.id, reminder.text, reminder.recurrence_expr
        );
        Ok(reminder)
    }

    pub async fn edit(&self, req: EditRequest, now: DateTime<Utc>) -> Result<Reminder> {
        let mut reminder = self.load(req.id).await?;
        let reschedule = req.touches_schedule();

        if let Some(text) = req.text.as_deref().map(str::trim) {
            if text.is_empty() {
                return Err(ReminderError::InvalidRequest(
                    "reminder text is empty".to_string(),
                ));
            }
            text.clone_into(&mut reminder.text);
        }

        if let Some(expr) = req.recurrence.as_deref() {
            reminder.schedule = Schedule::from_expression(expr)?;
        }
        let schedule = &mut reminder.schedule;
        for (slot, update) in [
            (&mut schedule.minute, req.minute),
            (&mut schedule.hour, req.hour),
            (&mut schedule.day, req.day),
            (&mut schedule.month, req.month),
            (&mut schedule.dow, req.dow),
        ] {
            if let Some(value) = update {
                *slot = value;
            }
        }
        if let Some(year) = req.year {
            schedule.year = year;
        }
        reminder.schedule = std::mem::take(&mut reminder.schedule).normalized();

        if let Some(offset) = req.notification_offset {
            reminder.notification_offset = offset
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty());
        }
        if let Some(ends_on) = req.ends_on {
            reminder.ends_on = ends_on
                .as_deref()
                .map(|s| parse_timestamp(s, self.ctx.tz))
                .transpose()?;
        }
        if let Some(early_only) = req.early_only {
            reminder.early_only = early_only;
        }
        check_early_only(&reminder)?;
        if reschedule {
            // A new schedule starts a new series.
            reminder.last_triggered = None;
        }

        self.derive(&mut reminder, now)?;
        reminder.updated_at = now;
        self.repo.upsert(&reminder).await?;

        info!("Reminder {} edited: '{}'", reminder.id, reminder.recurrence_expr);
        Ok(reminder)
    }

    pub async fn snooze(&self, req: SnoozeRequest, now: DateTime<Utc>) -> Result<Reminder> {
        let mut reminder = self.load(req.id).await?;

        let until = match (req.until.as_deref(), req.duration.as_deref()) {
            (Some(until), _) => parse_timestamp(until, self.ctx.tz)?,
            (None, Some(duration)) => now + parse_offset(duration)?,
            (None, None) => {
                return Err(ReminderError::InvalidRequest(
                    "snooze needs 'until' or 'for'".to_string(),
                ));
            }
        };
        if until <= now {
            return Err(ReminderError::InvalidRequest(format!(
                "snooze time {until} is not in the future"
            )));
        }

        reminder.snooze_until = Some(until);
        reminder.updated_at = now;
        self.repo.upsert(&reminder).await?;

        info!("Reminder {} snoozed until {}", reminder.id, until);
        Ok(reminder)
    }

    pub async fn skip(&self, req: SkipRequest, now: DateTime<Utc>) -> Result<Reminder> {
        let mut reminder = self.load(req.id).await?;
        let until = parse_timestamp(&req.until, self.ctx.tz)?;

        reminder.skip_until = Some(until);
        reminder.status = ReminderStatus::Enabled;
        self.derive(&mut reminder, now)?;
        reminder.updated_at = now;
        self.repo.upsert(&reminder).await?;

        info!("Reminder {} skipped until {}", reminder.id, until);
        Ok(reminder)
    }

    pub async fn toggle(&self, req: ToggleRequest, now: DateTime<Utc>) -> Result<Reminder> {
        let mut reminder = self.load(req.id).await?;

        reminder.status = req.status;
        if req.status == ReminderStatus::Enabled {
            self.derive(&mut reminder, now)?;
        }
        reminder.updated_at = now;
        self.repo.upsert(&reminder).await?;

        info!("Reminder {} {}", reminder.id, req.status.as_str());
        Ok(reminder)
    }

    pub async fn list(&self) -> Result<Vec<Reminder>> {
        Ok(self.repo.list_all().await?)
    }

    #[must_use]
    pub fn describe(&self, reminder: &Reminder, now: DateTime<Utc>) -> ReminderView {
        ReminderView::new(reminder, now, &self.ctx)
    }

    /// Reminders due in the window around `now`, at most one hit each.
    /// Read-only: nothing is marked as fired.
    pub async fn search_due(&self, now: DateTime<Utc>) -> Result<Vec<DueReminder>> {
        Ok(self.search(now).await?.due)
    }

    /// Search, then record every hit so it does not fire again, and advance
    /// the watermark to the end of the window.
    pub async fn fire_due(&self, now: DateTime<Utc>) -> Result<Vec<DueReminder>> {
        let sweep = self.search(now).await?;

        for reminder in &sweep.refreshed {
            self.repo.upsert(reminder).await?;
        }

        let mut fired = Vec::with_capacity(sweep.due.len());
        for hit in sweep.due {
            if let Some(committed) = self.commit(hit, now, sweep.upper).await? {
                fired.push(committed);
            }
        }

        self.repo.store_watermark(sweep.upper).await?;
        Ok(fired)
    }

    async fn load(&self, id: Uuid) -> Result<Reminder> {
        self.repo
            .get(id)
            .await?
            .ok_or(ReminderError::NotFound(id))
    }

    /// Re-derive the expression and the early notification. The early
    /// notification is the first one after `now` and after any skip window.
    fn derive(&self, reminder: &mut Reminder, now: DateTime<Utc>) -> Result<()> {
        reminder.recurrence_expr = reminder.schedule.to_expression();
        let recurrence = reminder.recurrence()?;
        let threshold = reminder.skip_until.map_or(now, |skip| skip.max(now));

        reminder.early_notification = match reminder.offset()? {
            Some(offset) => early_after(&recurrence, offset, threshold, &self.ctx),
            None => None,
        };
        Ok(())
    }

    async fn search(&self, now: DateTime<Utc>) -> Result<Sweep> {
        let (lower, upper) = self.window(now).await?;
        let reminders = self.repo.list_enabled().await?;
        debug!(
            "Due search over {} reminders in [{lower}, {upper}]",
            reminders.len()
        );

        let mut due = Vec::new();
        let mut refreshed = Vec::new();
        for mut reminder in reminders {
            if self.refresh_early(&mut reminder, lower, now) {
                refreshed.push(reminder.clone());
            }
            if let Some((trigger, at)) = self.trigger(&reminder, now, lower, upper) {
                due.push(DueReminder {
                    reminder,
                    trigger,
                    at,
                });
            }
        }
        Ok(Sweep {
            due,
            refreshed,
            upper,
        })
    }

    /// An early notification that fell behind the window was missed and can
    /// never fire. Move it to the first one from the window on.
    fn refresh_early(
        &self,
        reminder: &mut Reminder,
        lower: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(missed) = reminder.early_notification.filter(|early| *early < lower) else {
            return false;
        };
        self.advance_early(reminder, lower - Duration::seconds(1));
        reminder.updated_at = now;
        debug!(
            "Reminder {} missed early notification {missed}, next {:?}",
            reminder.id, reminder.early_notification
        );
        true
    }

    /// The window is `now` plus or minus the tolerance, widened back to the
    /// last watermark so ticks missed during downtime are caught up.
    async fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let upper = now + self.ctx.tolerance;
        let mut lower = now - self.ctx.tolerance;
        if let Some(mark) = self.repo.load_watermark().await? {
            let floor = now - self.ctx.max_catch_up;
            lower = lower.min(mark.max(floor));
        }
        Ok((lower, upper))
    }

    fn trigger(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> Option<(TriggerKind, DateTime<Utc>)> {
        if !reminder.is_enabled()
            || reminder.skip_until.is_some_and(|skip| skip > now)
            || reminder.ends_on.is_some_and(|end| end < now)
        {
            return None;
        }

        let in_window = |at: &DateTime<Utc>| *at >= lower && *at <= upper;
        if let Some(at) = reminder.snooze_until.filter(in_window) {
            return Some((TriggerKind::SnoozeReturn, at));
        }
        if let Some(at) = reminder.early_notification.filter(in_window) {
            return Some((TriggerKind::EarlyNotification, at));
        }
        if reminder.early_only {
            return None;
        }

        let recurrence = match reminder.recurrence() {
            Ok(recurrence) => recurrence,
            Err(e) => {
                warn!("Skipping reminder {} in due search: {e}", reminder.id);
                return None;
            }
        };
        // Occurrences at or before the last firing were already delivered.
        let base = lower - Duration::seconds(1);
        let base = reminder.last_triggered.map_or(base, |last| last.max(base));
        recurrence
            .next_after(base, self.ctx.tz)
            .filter(|at| *at <= upper)
            .map(|at| (TriggerKind::Occurrence, at))
    }

    /// Record a fired hit against the freshest copy of the reminder.
    /// A snooze return takes the reminder's only slot in the window, so an early
    /// notification due in the same window is consumed with it.
    async fn commit(
        &self,
        hit: DueReminder,
        now: DateTime<Utc>,
        upper: DateTime<Utc>,
    ) -> Result<Option<DueReminder>> {
        let Some(mut reminder) = self.repo.get(hit.reminder.id).await? else {
            warn!("Reminder {} vanished before it could fire", hit.reminder.id);
            return Ok(None);
        };

        match hit.trigger {
            TriggerKind::SnoozeReturn => {
                if reminder.snooze_until == Some(hit.at) {
                    reminder.snooze_until = None;
                }
                let preempted = reminder.early_notification.filter(|early| *early <= upper);
                if let Some(early) = preempted {
                    self.advance_early(&mut reminder, early);
                }
            }
            TriggerKind::EarlyNotification | TriggerKind::Occurrence => {
                if reminder.early_notification.is_some_and(|early| early <= hit.at) {
                    self.advance_early(&mut reminder, hit.at);
                }
            }
        }
        reminder.last_triggered = Some(
            reminder
                .last_triggered
                .map_or(hit.at, |last| last.max(hit.at)),
        );
        reminder.updated_at = now;
        self.repo.upsert(&reminder).await?;

        info!(
            "Reminder {} fired ({}) for {}",
            reminder.id,
            hit.trigger.as_str(),
            hit.at
        );
        Ok(Some(DueReminder {
            reminder,
            trigger: hit.trigger,
            at: hit.at,
        }))
    }

    fn advance_early(&self, reminder: &mut Reminder, after: DateTime<Utc>) {
        reminder.early_notification = match (reminder.recurrence(), reminder.offset()) {
            (Ok(recurrence), Ok(Some(offset))) => {
                early_after(&recurrence, offset, after, &self.ctx)
            }
            (Ok(_), Ok(None)) => None,
            (Err(e), _) | (_, Err(e)) => {
                warn!("Reminder {} early notification dropped: {e}", reminder.id);
                None
            }
        };
    }
}

/// An early-only reminder without an offset could never fire.
fn check_early_only(reminder: &Reminder) -> Result<()> {
    if reminder.early_only && reminder.notification_offset.is_none() {
        return Err(ReminderError::InvalidRequest(
            "early_only needs a notification_offset".to_string(),
        ));
    }
    Ok(())
}
