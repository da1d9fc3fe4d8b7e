//! Renders projected directive output into the cleaned reply.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt::Write;

use super::registry::quote_phrases;
use super::{BLANK_LINE, DirectiveRegistry, NoteSchema};

pub const NOTE_OPEN: &str = "[SYSTEM NOTE:";
pub const NOTE_CLOSE: &str = "[/SYSTEM NOTE]";

/// Render `hidden` through `schema`. Returns `None` when nothing survives the
/// filters and no follow-up directives are declared.
#[must_use]
pub fn render_note(
    name: &str,
    schema: &NoteSchema,
    hidden: &Map<String, Value>,
    registry: &DirectiveRegistry,
    now: DateTime<Utc>,
) -> Option<String> {
    let mut lines = Vec::new();

    for key in selected_keys(schema, hidden) {
        let Some(value) = hidden.get(key) else {
            continue;
        };
        let label = schema.rename.get(key).map_or(key, String::as_str);
        let rendered = if schema.humanize.iter().any(|h| h == key) {
            humanize(value, now)
        } else {
            render_value(value)
        };
        lines.push(format!("- {label}: {rendered}"));
    }

    let children: Vec<_> = schema
        .child_directives
        .iter()
        .filter_map(|child| registry.get(child))
        .collect();

    if lines.is_empty() && children.is_empty() {
        return None;
    }

    let mut note = format!("{NOTE_OPEN} {name}]\n");
    for line in &lines {
        note.push_str(line);
        note.push('\n');
    }
    if !children.is_empty() {
        note.push_str("Follow-up directives:\n");
        for child in children {
            let _ = writeln!(
                note,
                "- {} (when the user says {}): [DIRECTIVE: {}] {}",
                child.name(),
                quote_phrases(child.trigger_phrases()),
                child.name(),
                child.format()
            );
        }
    }
    note.push_str(NOTE_CLOSE);
    Some(note)
}

/// Combine the visible message and the rendered note into the block that
/// replaces a directive in the cleaned text.
#[must_use]
pub fn compose(visible: &str, note: Option<&str>) -> String {
    let parts: Vec<&str> = [Some(visible.trim()), note]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        BLANK_LINE.to_string()
    } else {
        format!("{}\n", parts.join("\n"))
    }
}

fn selected_keys<'a>(schema: &'a NoteSchema, hidden: &'a Map<String, Value>) -> Vec<&'a str> {
    if !schema.include.is_empty() {
        return schema.include.iter().map(String::as_str).collect();
    }
    hidden
        .keys()
        .map(String::as_str)
        .filter(|k| !schema.exclude.iter().any(|e| e == k))
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn humanize(value: &Value, now: DateTime<Utc>) -> String {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or_else(
            || render_value(value),
            |ts| crate::util::relative_phrase(ts.with_timezone(&Utc), now),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn hidden() -> Map<String, Value> {
        json!({
            "id": "r-1",
            "text": "stretch",
            "next_fire": "2026-05-01T10:00:00+00:00",
            "secret": 42,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn include_takes_precedence_over_exclude() {
        let schema = NoteSchema::default()
            .include(&["text", "next_fire"])
            .exclude(&["text"]);
        let note = render_note("x", &schema, &hidden(), &DirectiveRegistry::new(), now()).unwrap();
        assert!(note.contains("- text: stretch"));
        assert!(note.contains("- next_fire: 2026-05-01T10:00:00+00:00"));
        assert!(!note.contains("secret"));
    }

    #[test]
    fn exclude_rename_and_humanize() {
        let schema = NoteSchema::default()
            .exclude(&["secret"])
            .rename("next_fire", "Next fire")
            .humanize(&["next_fire"]);
        let note = render_note("x", &schema, &hidden(), &DirectiveRegistry::new(), now()).unwrap();
        assert!(note.starts_with("[SYSTEM NOTE: x]\n"));
        assert!(note.contains("- Next fire: in 2 hours"));
        assert!(note.contains("- id: r-1"));
        assert!(!note.contains("secret"));
        assert!(note.ends_with(NOTE_CLOSE));
    }

    #[test]
    fn humanize_leaves_non_timestamps_alone() {
        let schema = NoteSchema::default().include(&["text"]).humanize(&["text"]);
        let note = render_note("x", &schema, &hidden(), &DirectiveRegistry::new(), now()).unwrap();
        assert!(note.contains("- text: stretch"));
    }

    #[test]
    fn empty_note_renders_nothing() {
        let schema = NoteSchema::default().include(&["absent"]);
        assert!(render_note("x", &schema, &hidden(), &DirectiveRegistry::new(), now()).is_none());
    }

    #[test]
    fn compose_joins_visible_and_note() {
        assert_eq!(compose("", None), BLANK_LINE);
        assert_eq!(compose("Done.", None), "Done.\n");
        assert_eq!(compose("Done.", Some("[note]")), "Done.\n[note]\n");
        assert_eq!(compose("  ", Some("[note]")), "[note]\n");
    }
}
