//! Finite-state scanner for directive blocks.
//!
//! The scanner never fails: malformed or unbalanced blocks are simply not
//! reported. Fenced regions (triple backtick blocks) are found up front and
//! nothing inside them is ever recognized as a directive.

use std::ops::Range;

pub const HEADER_OPEN: &str = "[DIRECTIVE:";
pub const CLOSER: &str = "[/DIRECTIVE]";
const FENCE: &str = "```";

/// A directive block located in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch {
    pub name: String,
    /// The raw `{ ... }` payload, braces included.
    pub payload_text: String,
    /// Byte offsets of the whole block, header through closer (if any).
    pub span: (usize, usize),
    pub had_explicit_close: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    Normal,
    InFence { start: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BraceState {
    Normal,
    InString,
    Escaped,
}

/// Byte ranges covered by fenced blocks, fence markers included.
#[derive(Debug, Clone, Default)]
pub struct ProtectedRegions {
    ranges: Vec<Range<usize>>,
}

impl ProtectedRegions {
    /// Locate every fenced region. An unterminated fence runs to end of text.
    #[must_use]
    pub fn find(text: &str) -> Self {
        let mut ranges = Vec::new();
        let mut state = FenceState::Normal;
        let mut cursor = 0;

        while let Some(rel) = text[cursor..].find(FENCE) {
            let at = cursor + rel;
            state = match state {
                FenceState::Normal => FenceState::InFence { start: at },
                FenceState::InFence { start } => {
                    ranges.push(start..at + FENCE.len());
                    FenceState::Normal
                }
            };
            cursor = at + FENCE.len();
        }

        if let FenceState::InFence { start } = state {
            ranges.push(start..text.len());
        }

        Self { ranges }
    }

    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        self.region_at(pos).is_some()
    }

    fn region_at(&self, pos: usize) -> Option<&Range<usize>> {
        self.ranges.iter().find(|r| r.contains(&pos))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Find every directive block in `text`, in order of appearance.
#[must_use]
pub fn scan(text: &str) -> Vec<DirectiveMatch> {
    let protected = ProtectedRegions::find(text);
    let mut matches = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = text[cursor..].find(HEADER_OPEN) {
        let start = cursor + rel;

        if let Some(region) = protected.region_at(start) {
            cursor = region.end;
            continue;
        }

        let Some((name, header_end)) = parse_header(text, start) else {
            cursor = start + HEADER_OPEN.len();
            continue;
        };

        match match_block(text, &protected, start, header_end, name) {
            Some(found) => {
                cursor = found.span.1;
                matches.push(found);
            }
            None => cursor = header_end,
        }
    }

    matches
}

/// Parse `[DIRECTIVE: name]` at `start`, returning the name and the offset
/// just past the closing bracket.
fn parse_header(text: &str, start: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let mut i = start + HEADER_OPEN.len();

    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'-'))
    {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = text[name_start..i].to_string();

    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if bytes.get(i) != Some(&b']') {
        return None;
    }
    Some((name, i + 1))
}

fn match_block(
    text: &str,
    protected: &ProtectedRegions,
    start: usize,
    header_end: usize,
    name: String,
) -> Option<DirectiveMatch> {
    let open = find_open_brace(text, protected, header_end)?;
    let close = balanced_end(text, protected, open)?;
    let (end, had_explicit_close) = consume_closer(text, protected, close);

    Some(DirectiveMatch {
        name,
        payload_text: text[open..close].to_string(),
        span: (start, end),
        had_explicit_close,
    })
}

/// First `{` after the header. A fence or another header in between
/// abandons the block.
fn find_open_brace(text: &str, protected: &ProtectedRegions, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    (from..bytes.len())
        .take_while(|&i| !protected.contains(i) && !bytes[i..].starts_with(HEADER_OPEN.as_bytes()))
        .find(|&i| bytes[i] == b'{')
}

/// Offset just past the `}` that balances the `{` at `open`.
fn balanced_end(text: &str, protected: &ProtectedRegions, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut state = BraceState::Normal;

    for (i, &b) in text.as_bytes().iter().enumerate().skip(open) {
        if protected.contains(i) {
            return None;
        }
        state = match (state, b) {
            (BraceState::Normal, b'"') => BraceState::InString,
            (BraceState::Normal, b'{') => {
                depth += 1;
                BraceState::Normal
            }
            (BraceState::Normal, b'}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
                BraceState::Normal
            }
            (BraceState::InString, b'\\') => BraceState::Escaped,
            (BraceState::InString, b'"') => BraceState::Normal,
            (BraceState::Escaped, _) => BraceState::InString,
            (state, _) => state,
        };
    }

    None
}

fn consume_closer(text: &str, protected: &ProtectedRegions, from: usize) -> (usize, bool) {
    let rest = &text[from..];
    let closer_at = from + (rest.len() - rest.trim_start().len());
    if text[closer_at..].starts_with(CLOSER) && !protected.contains(closer_at) {
        (closer_at + CLOSER.len(), true)
    } else {
        (from, false)
    }
}
