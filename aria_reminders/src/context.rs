//! Time zone and tolerances every scheduling computation runs against.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeContext {
    /// User time zone; recurrence fields are evaluated in local time.
    pub tz: Tz,
    /// Added to a base time before searching for the next occurrence.
    pub bias: Duration,
    /// Half-width of the due-search window around now.
    pub tolerance: Duration,
    /// How far back a due search may reach after downtime.
    pub max_catch_up: Duration,
    pub quiet_hours: Option<QuietHours>,
}

impl Default for TimeContext {
    fn default() -> Self {
        Self {
            tz: Tz::UTC,
            bias: Duration::seconds(60),
            tolerance: Duration::seconds(30),
            max_catch_up: Duration::hours(1),
            quiet_hours: None,
        }
    }
}

impl TimeContext {
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            ..Self::default()
        }
    }

    pub fn parse_zone(name: &str) -> Result<Tz> {
        name.trim()
            .parse::<Tz>()
            .map_err(|_| ReminderError::InvalidTimeZone(name.to_string()))
    }

    #[must_use]
    pub fn with_quiet_hours(mut self, quiet_hours: QuietHours) -> Self {
        self.quiet_hours = Some(quiet_hours);
        self
    }

    #[must_use]
    pub fn local(&self, at: DateTime<Utc>) -> DateTime<Tz> {
        at.with_timezone(&self.tz)
    }

    /// Whether `at` falls inside the user's quiet hours.
    #[must_use]
    pub fn is_quiet(&self, at: DateTime<Utc>) -> bool {
        self.quiet_hours
            .is_some_and(|q| q.contains(self.local(at).time()))
    }
}

/// Daily quiet period in local time. `end` before `start` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    /// Parse `HH:MM` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s.trim(), "%H:%M")
                .map_err(|e| ReminderError::field("quiet_hours", s, e.to_string()))
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }

    #[must_use]
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quiet_hours_wrap_midnight() {
        let q = QuietHours::parse("22:00", "07:00").unwrap();
        assert!(q.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
        assert!(q.contains(NaiveTime::from_hms_opt(6, 59, 0).unwrap()));
        assert!(!q.contains(NaiveTime::from_hms_opt(7, 0, 0).unwrap()));
        assert!(!q.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn quiet_hours_use_local_time() {
        let ctx = TimeContext::new(chrono_tz::Europe::Berlin)
            .with_quiet_hours(QuietHours::parse("22:00", "07:00").unwrap());
        // 21:30 UTC is 23:30 in Berlin during summer time.
        let at = Utc.with_ymd_and_hms(2026, 7, 1, 21, 30, 0).unwrap();
        assert!(ctx.is_quiet(at));
        assert!(!TimeContext::default().is_quiet(at));
    }

    #[test]
    fn unknown_zone_is_rejected() {
        assert!(TimeContext::parse_zone("Mars/Olympus").is_err());
        assert_eq!(
            TimeContext::parse_zone("America/New_York").unwrap(),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn bad_quiet_hours_are_rejected() {
        assert!(QuietHours::parse("25:00", "07:00").is_err());
    }
}
