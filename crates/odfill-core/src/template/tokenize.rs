//! Placeholder tokenization
//!
//! Each pass locates all of its placeholder occurrences first, as typed
//! matches with byte positions, then applies the resolved replacements in
//! one reconstruction pass. This avoids literal substring replacement
//! interacting with previously substituted content.

use std::ops::Range;

/// A `@@dotted.key` occurrence
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaceholderToken {
    /// Byte position of `@@`
    pub start: usize,
    /// Byte position just past the key
    pub end: usize,
    pub key: String,
}

/// Width/height term of an image directive
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Dim {
    Absent,
    /// The `*` wildcard: derive from aspect ratio
    Derive,
    /// A decimal literal, optionally unit-suffixed
    Literal(String),
}

/// A `[ @@name width height ]` occurrence
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImageToken {
    /// Byte position of `[`
    pub start: usize,
    /// Byte position just past `]`
    pub end: usize,
    pub key: String,
    pub width: Dim,
    pub height: Dim,
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Read a placeholder key at `pos` (just past `@@`)
///
/// Trailing dots are not part of the key, so `@@name.` before punctuation
/// resolves as `name`.
fn read_key(text: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let mut end = pos;
    while end < bytes.len() && is_key_byte(bytes[end]) {
        end += 1;
    }
    while end > pos && bytes[end - 1] == b'.' {
        end -= 1;
    }
    if end == pos {
        return None;
    }
    Some((text[pos..end].to_string(), end))
}

/// Scan all `@@key` tokens in document order
pub(crate) fn scan_placeholders(text: &str) -> Vec<PlaceholderToken> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos + 1 < bytes.len() {
        if bytes[pos] == b'@' && bytes[pos + 1] == b'@' {
            if let Some((key, end)) = read_key(text, pos + 2) {
                tokens.push(PlaceholderToken { start: pos, end, key });
                pos = end;
                continue;
            }
        }
        pos += 1;
    }

    tokens
}

/// Scan all `[ @@name width height ]` image directives in document order
pub(crate) fn scan_image_tokens(text: &str) -> Vec<ImageToken> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'[' {
            if let Some(token) = parse_image_token(text, pos) {
                pos = token.end;
                tokens.push(token);
                continue;
            }
        }
        pos += 1;
    }

    tokens
}

fn skip_spaces(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
        pos += 1;
    }
    pos
}

fn parse_dim(text: &str, pos: usize) -> Option<(Dim, usize)> {
    let bytes = text.as_bytes();
    if pos >= bytes.len() {
        return None;
    }
    if bytes[pos] == b'*' {
        return Some((Dim::Derive, pos + 1));
    }
    if !bytes[pos].is_ascii_digit() {
        return None;
    }
    let mut end = pos;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    // Optional unit suffix (cm, mm, in, pt, px)
    while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
        end += 1;
    }
    Some((Dim::Literal(text[pos..end].to_string()), end))
}

/// Try to parse an image directive starting at a `[`
fn parse_image_token(text: &str, start: usize) -> Option<ImageToken> {
    let bytes = text.as_bytes();
    let mut pos = skip_spaces(bytes, start + 1);

    if pos + 1 >= bytes.len() || bytes[pos] != b'@' || bytes[pos + 1] != b'@' {
        return None;
    }
    let (key, after_key) = read_key(text, pos + 2)?;
    pos = after_key;

    let mut dims = [Dim::Absent, Dim::Absent];
    for dim in dims.iter_mut() {
        let after_ws = skip_spaces(bytes, pos);
        if after_ws == pos {
            break;
        }
        match parse_dim(text, after_ws) {
            Some((parsed, after_dim)) => {
                *dim = parsed;
                pos = after_dim;
            }
            None => {
                pos = after_ws;
                break;
            }
        }
    }

    pos = skip_spaces(bytes, pos);
    if pos >= bytes.len() || bytes[pos] != b']' {
        return None;
    }

    let [width, height] = dims;
    Some(ImageToken {
        start,
        end: pos + 1,
        key,
        width,
        height,
    })
}

/// Rebuild text with the given non-overlapping replacements
///
/// Ranges must be sorted by start position.
pub(crate) fn apply_replacements(text: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    for (range, replacement) in replacements {
        debug_assert!(range.start >= pos);
        out.push_str(&text[pos..range.start]);
        out.push_str(replacement);
        pos = range.end;
    }
    out.push_str(&text[pos..]);
    out
}
