//! Offsets, timestamps and fire-time arithmetic.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

use crate::context::TimeContext;
use crate::error::{ReminderError, Result};
use crate::recurrence::Recurrence;

static OFFSET_PART: OnceLock<Regex> = OnceLock::new();

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Bound on how many occurrences `early_after` walks before giving up.
const MAX_ADVANCES: usize = 1_000;

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn offset_part() -> &'static Regex {
    OFFSET_PART.get_or_init(|| {
        Regex::new(
            r"(?i)(\d+)\s*(days?|d|hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)",
        )
        .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Parse a duration such as `10 minutes`, `2 hours`, `1h30m` or
/// `1 hour and 15 minutes`. The result must be positive.
pub fn parse_offset(text: &str) -> Result<Duration> {
    let invalid = || ReminderError::InvalidOffset(text.to_string());
    let mut total = Duration::zero();
    let mut cursor = 0;
    let mut parts = 0;

    for cap in offset_part().captures_iter(text) {
        let (Some(whole), Some(amount), Some(unit)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            return Err(invalid());
        };
        if !is_separator(&text[cursor..whole.start()]) {
            return Err(invalid());
        }
        cursor = whole.end();
        parts += 1;

        let amount: i64 = amount.as_str().parse().map_err(|_| invalid())?;
        let unit_secs = match unit.as_str().as_bytes().first().map(u8::to_ascii_lowercase) {
            Some(b'd') => 86_400,
            Some(b'h') => 3_600,
            Some(b'm') => 60,
            _ => 1,
        };
        let part = amount
            .checked_mul(unit_secs)
            .and_then(Duration::try_seconds)
            .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;
    }

    if parts == 0 || !is_separator(&text[cursor..]) || total <= Duration::zero() {
        return Err(invalid());
    }
    Ok(total)
}

fn is_separator(gap: &str) -> bool {
    gap.split(|c: char| c.is_whitespace() || c == ',')
        .all(|word| word.is_empty() || word.eq_ignore_ascii_case("and"))
}

/// Parse an RFC 3339 timestamp, or a naive date/time read on the wall clock
/// of `tz`. A bare date means local midnight.
pub fn parse_timestamp(text: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ReminderError::InvalidTimestamp(text.to_string()))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| ReminderError::InvalidTimestamp(text.to_string()))
}

/// Next occurrence strictly after `base` plus the context bias.
#[must_use]
pub fn next_fire(
    recurrence: &Recurrence,
    base: DateTime<Utc>,
    ctx: &TimeContext,
) -> Option<DateTime<Utc>> {
    recurrence.next_after(base + ctx.bias, ctx.tz)
}

/// The warning time `offset` before `fire`, on the user's clock.
#[must_use]
pub fn early_notification(
    fire: DateTime<Utc>,
    offset: Duration,
    ctx: &TimeContext,
) -> DateTime<Tz> {
    ctx.local(fire - offset)
}

/// First early notification strictly after `threshold`, advancing the search
/// base one occurrence at a time.
#[must_use]
pub fn early_after(
    recurrence: &Recurrence,
    offset: Duration,
    threshold: DateTime<Utc>,
    ctx: &TimeContext,
) -> Option<DateTime<Utc>> {
    // Fires at or before threshold + offset can never qualify.
    let mut base = if offset > ctx.bias {
        threshold + offset - ctx.bias
    } else {
        threshold
    };

    for _ in 0..MAX_ADVANCES {
        let fire = next_fire(recurrence, base, ctx)?;
        let early = early_notification(fire, offset, ctx).with_timezone(&Utc);
        if early > threshold {
            return Some(early);
        }
        base = fire;
    }
    None
}
