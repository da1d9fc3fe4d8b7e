//! Utility functions for content hashing and relative time phrases.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Default system prompt, extended at runtime with the directive guide.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful personal assistant. When the user asks you to remember something, set a reminder, or deliver a message, emit the matching directive block in your reply.";

/// Compute a SHA-256 content hash for fact deduplication.
///
/// Tags are sorted first so the same fact stored with reordered tags hashes
/// identically.
#[must_use]
pub fn content_hash(text: &str, tags: &[String]) -> String {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(text.trim().to_lowercase().as_bytes());
    hasher.update(b":");
    hasher.update(sorted.join(",").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render `timestamp` relative to `now`, e.g. "in 2 hours" or "3 days ago".
#[must_use]
pub fn relative_phrase(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = timestamp.signed_duration_since(now);
    let future = delta.num_seconds() > 0;
    let magnitude = delta.abs();

    let (amount, unit) = if magnitude.num_days() > 0 {
        (magnitude.num_days(), "day")
    } else if magnitude.num_hours() > 0 {
        (magnitude.num_hours(), "hour")
    } else if magnitude.num_minutes() > 0 {
        (magnitude.num_minutes(), "minute")
    } else {
        return "just now".to_string();
    };

    let plural = if amount == 1 { "" } else { "s" };
    if future {
        format!("in {amount} {unit}{plural}")
    } else {
        format!("{amount} {unit}{plural} ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn deterministic_hash() {
        let h1 = content_hash("likes green tea", &["food".to_string()]);
        let h2 = content_hash("Likes green tea ", &["food".to_string()]);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_ignores_tag_order() {
        let a = content_hash("x", &["b".to_string(), "a".to_string()]);
        let b = content_hash("x", &["a".to_string(), "b".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn relative_future_and_past() {
        let now = noon();
        assert_eq!(relative_phrase(now + Duration::hours(2), now), "in 2 hours");
        assert_eq!(relative_phrase(now - Duration::days(3), now), "3 days ago");
        assert_eq!(relative_phrase(now + Duration::minutes(1), now), "in 1 minute");
    }

    #[test]
    fn relative_within_a_minute_is_just_now() {
        let now = noon();
        assert_eq!(relative_phrase(now + Duration::seconds(20), now), "just now");
        assert_eq!(relative_phrase(now - Duration::seconds(59), now), "just now");
    }
}
