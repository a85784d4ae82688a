//! Lightweight source-text scanning shared by the extractors.
//!
//! Nothing here parses a full language. The helpers understand just enough
//! of C-family syntax (string literals, comments, nested brackets) to pull
//! balanced blocks and top-level members out of declarations and literals.

use std::sync::LazyLock;

use regex::Regex;

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        Self {
            newlines: text
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i)
                .collect(),
        }
    }

    /// Line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < offset) + 1
    }
}

/// Skip a string literal or comment starting at `i`.
///
/// Returns the index just past it, or `None` if `i` does not start one.
fn skip_opaque(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        quote @ (b'\'' | b'"' | b'`') => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    b if b == quote => return Some(j + 1),
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        b'/' if bytes.get(i + 1) == Some(&b'/') => {
            let end = bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |n| i + n);
            Some(end)
        }
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            let end = bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |n| i + 2 + n + 2);
            Some(end)
        }
        _ => None,
    }
}

/// Index of the bracket closing the one at `open`.
///
/// `text[open]` must be `{`, `(`, or `[`. Brackets inside strings and
/// comments are ignored. Returns `None` when unbalanced.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.get(open), Some(b'{' | b'(' | b'[')) {
        return None;
    }

    let mut stack: Vec<u8> = Vec::new();
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_opaque(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => stack.push(b'}'),
            b'(' => stack.push(b')'),
            b'[' => stack.push(b']'),
            close @ (b'}' | b')' | b']') => {
                if stack.pop() != Some(close) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// The balanced block opening at `open`, as `(inner_start, inner_text)`.
pub fn block_at(text: &str, open: usize) -> Option<(usize, &str)> {
    let close = matching_close(text, open)?;
    Some((open + 1, &text[open + 1..close]))
}

/// Offset of the first non-whitespace byte at or after `from`.
pub fn skip_ws(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !c.is_whitespace())
        .map_or(text.len(), |n| from + n)
}

/// Split a block body into top-level members.
///
/// Members are separated by `,` or `;`, or by a newline when the text so far
/// forms a complete member. Comments are dropped. Returns each member's
/// offset within `body` and its trimmed text.
pub fn split_members(body: &str) -> Vec<(usize, &str)> {
    let bytes = body.as_bytes();
    let mut members = Vec::new();
    let mut closers: Vec<u8> = Vec::new();
    let mut start: Option<usize> = None;
    // End of the last significant (non-comment, non-space) byte.
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'/' && matches!(bytes.get(i + 1), Some(b'/' | b'*')) {
            i = skip_opaque(bytes, i).unwrap_or(bytes.len());
            continue;
        }

        if matches!(b, b'\'' | b'"' | b'`') {
            start.get_or_insert(i);
            i = skip_opaque(bytes, i).unwrap_or(bytes.len());
            last = i;
            continue;
        }

        let top_level = closers.is_empty();
        match b {
            b'{' => closers.push(b'}'),
            b'(' => closers.push(b')'),
            b'[' => closers.push(b']'),
            b'<' if i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_') => {
                closers.push(b'>')
            }
            b'}' | b')' | b']' => {
                while closers.last() == Some(&b'>') {
                    closers.pop();
                }
                closers.pop();
            }
            b'>' if closers.last() == Some(&b'>') && bytes[i - 1] != b'=' => {
                closers.pop();
            }
            b',' | b';' if top_level => {
                flush_member(body, &mut start, last, &mut members);
                i += 1;
                continue;
            }
            b'\n' if top_level => {
                if let Some(s) = start {
                    if member_complete(&body[s..last.max(s)], &body[i..]) {
                        flush_member(body, &mut start, last, &mut members);
                    }
                }
                i += 1;
                continue;
            }
            _ => {}
        }

        if !b.is_ascii_whitespace() {
            start.get_or_insert(i);
            last = i + 1;
        }
        i += 1;
    }
    flush_member(body, &mut start, last, &mut members);
    members
}

fn flush_member<'a>(
    body: &'a str,
    start: &mut Option<usize>,
    last: usize,
    members: &mut Vec<(usize, &'a str)>,
) {
    if let Some(s) = start.take() {
        let text = body[s..last.max(s)].trim();
        if !text.is_empty() {
            members.push((s, text));
        }
    }
}

fn member_complete(so_far: &str, rest: &str) -> bool {
    let so_far = so_far.trim_end();
    let continues = ['|', '&', ':', '=', '?', '.', '+', '-'];
    if so_far.is_empty() || so_far.ends_with(continues) {
        return false;
    }
    let next = rest.trim_start();
    !(next.starts_with(['|', '&', '.', '?', ':']) || next.starts_with("=>"))
}

/// A `name: value` (or shorthand `name`) member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member<'a> {
    pub name: &'a str,
    pub optional: bool,
    /// `None` for shorthand members.
    pub value: Option<&'a str>,
}

static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^(?:readonly\s+)?["']?([A-Za-z_$][\w$]*)["']?\s*(\?)?\s*:\s*(.+)$"#)
        .expect("valid member regex")
});

static SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("valid shorthand regex"));

/// Parse one member of a type body or object literal.
///
/// Method signatures, spreads, and index signatures yield `None`.
pub fn parse_member(text: &str) -> Option<Member<'_>> {
    if text.starts_with("...") || text.starts_with('[') {
        return None;
    }
    if SHORTHAND.is_match(text) {
        return Some(Member {
            name: text,
            optional: false,
            value: None,
        });
    }
    let caps = MEMBER.captures(text)?;
    let name = caps.get(1)?.as_str();
    Some(Member {
        name,
        optional: caps.get(2).is_some(),
        value: Some(caps.get(3)?.as_str().trim()),
    })
}

/// Contents of a string literal starting at `text[at]`.
pub fn string_literal_at(text: &str, at: usize) -> Option<&str> {
    let quote = *text.as_bytes().get(at)?;
    if !matches!(quote, b'\'' | b'"' | b'`') {
        return None;
    }
    let end = skip_opaque(text.as_bytes(), at)?;
    if end < at + 2 || text.as_bytes()[end - 1] != quote {
        return None;
    }
    Some(&text[at + 1..end - 1])
}

/// Byte offset of `inner` within `outer`.
///
/// `inner` must be a subslice of `outer`.
pub fn offset_of(outer: &str, inner: &str) -> usize {
    let offset = (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize);
    offset.min(outer.len())
}

/// Returns true if `s` is a plain identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
