//! Cron-style recurrence evaluation in a user time zone.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use std::collections::BTreeSet;

use crate::error::{ReminderError, Result};
use crate::schedule::{Schedule, ScheduleField};

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const DOW_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

const MIN_YEAR: u32 = 1970;
const MAX_YEAR: u32 = 2199;
const MAX_STEPS: usize = 100_000;

/// Parsed recurrence. Day-of-month and day-of-week are OR-ed when both are
/// restricted, AND-ed otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days: BTreeSet<u32>,
    months: BTreeSet<u32>,
    dows: BTreeSet<u32>,
    years: Option<BTreeSet<u32>>,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl Recurrence {
    /// Parse a five- or seven-field expression.
    pub fn parse(expr: &str) -> Result<Self> {
        Self::from_schedule(&Schedule::from_expression(expr)?)
    }

    pub fn from_schedule(schedule: &Schedule) -> Result<Self> {
        let dows = parse_field("dow", &schedule.dow, 0, 7, Some(&DOW_NAMES))?
            .into_iter()
            .map(|d| d % 7)
            .collect();
        let years = match &schedule.year {
            Some(year) if !year.is_any() => {
                Some(parse_field("year", year, MIN_YEAR, MAX_YEAR, None)?)
            }
            _ => None,
        };

        Ok(Self {
            minutes: parse_field("minute", &schedule.minute, 0, 59, None)?,
            hours: parse_field("hour", &schedule.hour, 0, 23, None)?,
            days: parse_field("day", &schedule.day, 1, 31, None)?,
            months: parse_field("month", &schedule.month, 1, 12, Some(&MONTH_NAMES))?,
            dows,
            years,
            dom_restricted: !schedule.day.as_str().starts_with('*'),
            dow_restricted: !schedule.dow.as_str().starts_with('*'),
        })
    }

    /// Whether a local wall-clock minute belongs to the recurrence.
    #[must_use]
    pub fn matches(&self, local: NaiveDateTime) -> bool {
        self.year_matches(local.year())
            && self.months.contains(&local.month())
            && self.day_matches(local.date())
            && self.hours.contains(&local.hour())
            && self.minutes.contains(&local.minute())
    }

    /// First occurrence strictly after `after`, evaluated on the wall clock of
    /// `tz`. Local times that do not exist are skipped and ambiguous ones
    /// resolve to the earlier instant. Returns `None` when the recurrence has
    /// no further occurrence.
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        let start = after.with_timezone(&tz).naive_local();
        let mut t = truncate_to_minute(start)? + Duration::minutes(1);

        for _ in 0..MAX_STEPS {
            let year = u32::try_from(t.year()).ok()?;
            if year > MAX_YEAR {
                return None;
            }
            if !self.year_matches(t.year()) {
                let next = self.years.as_ref()?.range(year + 1..).next()?;
                t = month_start(i32::try_from(*next).ok()?, 1)?;
                continue;
            }
            if !self.months.contains(&t.month()) {
                t = next_month_start(t)?;
                continue;
            }
            if !self.day_matches(t.date()) {
                t = t.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !self.hours.contains(&t.hour()) {
                t = t.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !self.minutes.contains(&t.minute()) {
                t += Duration::minutes(1);
                continue;
            }
            if let Some(found) = resolve(t, tz, after) {
                return Some(found);
            }
            t += Duration::minutes(1);
        }
        None
    }

    fn year_matches(&self, year: i32) -> bool {
        match (&self.years, u32::try_from(year)) {
            (None, _) => true,
            (Some(years), Ok(year)) => years.contains(&year),
            (Some(_), Err(_)) => false,
        }
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days.contains(&date.day());
        let dow = self
            .dows
            .contains(&date.weekday().num_days_from_sunday());
        if self.dom_restricted && self.dow_restricted {
            dom || dow
        } else {
            dom && dow
        }
    }
}

/// Each local time fires once, at its earliest instant, so the second pass
/// through a repeated hour yields nothing.
fn resolve(local: NaiveDateTime, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| *dt > after)
}

fn truncate_to_minute(t: NaiveDateTime) -> Option<NaiveDateTime> {
    t.with_second(0)?.with_nanosecond(0)
}

fn month_start(year: i32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

fn next_month_start(t: NaiveDateTime) -> Option<NaiveDateTime> {
    if t.month() == 12 {
        month_start(t.year() + 1, 1)
    } else {
        month_start(t.year(), t.month() + 1)
    }
}

fn parse_field(
    name: &'static str,
    field: &ScheduleField,
    min: u32,
    max: u32,
    names: Option<&[&str]>,
) -> Result<BTreeSet<u32>> {
    let raw = field.as_str();
    let invalid = |reason: String| ReminderError::field(name, raw, reason);
    let value = |token: &str| -> Result<u32> {
        let parsed = token.parse::<u32>().ok().or_else(|| {
            names.and_then(|names| {
                let offset = u32::from(name == "month");
                names
                    .iter()
                    .position(|n| n.eq_ignore_ascii_case(token))
                    .and_then(|i| u32::try_from(i).ok())
                    .map(|i| i + offset)
            })
        });
        match parsed {
            Some(v) if (min..=max).contains(&v) => Ok(v),
            Some(v) => Err(invalid(format!("{v} outside {min}-{max}"))),
            None => Err(invalid(format!("unrecognized value '{token}'"))),
        }
    };

    let mut set = BTreeSet::new();
    for part in raw.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step = step
                    .parse::<u32>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| invalid(format!("bad step '{step}'")))?;
                (range, Some(step))
            }
            None => (part, None),
        };

        let (lo, hi) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            (value(a)?, value(b)?)
        } else {
            let v = value(range)?;
            if step.is_some() { (v, max) } else { (v, v) }
        };
        if lo > hi {
            return Err(invalid(format!("range {lo}-{hi} is reversed")));
        }

        let step = usize::try_from(step.unwrap_or(1)).unwrap_or(usize::MAX);
        set.extend((lo..=hi).step_by(step));
    }
    Ok(set)
}
