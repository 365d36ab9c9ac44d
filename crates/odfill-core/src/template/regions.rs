//! Conditional annotation regions
//!
//! An `<office:annotation>` carrying a `@@key` condition marker guards the
//! content up to the matching `<office:annotation-end>`. Truthy keys keep
//! the whole region verbatim; anything else collapses it to an internal
//! removal marker. A second pass deletes table rows left empty by the
//! removal.

use crate::data::FlattenedData;
use crate::template::rows::row_blocks;
use crate::template::tokenize::scan_placeholders;

const ANNOTATION_START: &str = "<office:annotation";
const ANNOTATION_CLOSE: &str = "</office:annotation>";
const ANNOTATION_END: &str = "<office:annotation-end";

/// Internal removal marker; a private-use character keeps it impossible to
/// collide with template text or placeholder syntax
pub(crate) const REMOVAL_MARKER: &str = "\u{E000}";

/// Find the next annotation start element, skipping `office:annotation-end`
fn find_annotation_start(text: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(offset) = text[pos..].find(ANNOTATION_START) {
        let start = pos + offset;
        let after = text.as_bytes().get(start + ANNOTATION_START.len());
        if after != Some(&b'-') {
            return Some(start);
        }
        pos = start + ANNOTATION_START.len();
    }
    None
}

/// Resolve all guarded regions in one left-to-right pass
///
/// Each annotation-end is consumed by exactly one match, so overlapping
/// regions are impossible.
pub(crate) fn resolve_regions(content: &str, data: &FlattenedData) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pos = 0;

    while let Some(ann_start) = find_annotation_start(content, pos) {
        out.push_str(&content[pos..ann_start]);

        // Whole annotation element, which holds the @@key condition marker
        let Some(close_offset) = content[ann_start..].find(ANNOTATION_CLOSE) else {
            out.push_str(&content[ann_start..]);
            return out;
        };
        let ann_end = ann_start + close_offset + ANNOTATION_CLOSE.len();
        let annotation = &content[ann_start..ann_end];

        let condition_key = scan_placeholders(annotation).into_iter().next();

        // Guarded region runs to the next annotation-end element
        let region_end = content[ann_end..]
            .find(ANNOTATION_END)
            .map(|o| ann_end + o)
            .and_then(|s| content[s..].find('>').map(|o| s + o + 1));

        let (Some(token), Some(match_end)) = (condition_key, region_end) else {
            // No condition marker or unterminated region: literal passthrough
            out.push_str(annotation);
            pos = ann_end;
            continue;
        };

        if data.is_truthy(&token.key) {
            out.push_str(&content[ann_start..match_end]);
        } else {
            out.push_str(REMOVAL_MARKER);
        }
        pos = match_end;
    }

    out.push_str(&content[pos..]);
    remove_empty_marked_rows(&out)
}

/// Strip all `<...>` tags, keeping character data
fn strip_tags(text: &str) -> String {
    let mut out = String::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('<') {
        out.push_str(&text[pos..pos + offset]);
        match text[pos + offset..].find('>') {
            Some(end) => pos = pos + offset + end + 1,
            None => return out,
        }
    }
    out.push_str(&text[pos..]);
    out
}

/// Delete table rows that carry a removal marker and no remaining content;
/// strip stray markers everywhere else
fn remove_empty_marked_rows(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pos = 0;

    for range in row_blocks(content) {
        let row = &content[range.start..range.end];
        if !row.contains(REMOVAL_MARKER) {
            continue;
        }
        out.push_str(&content[pos..range.start]);

        let without_marker = row.replace(REMOVAL_MARKER, "");
        if !strip_tags(&without_marker).trim().is_empty() {
            out.push_str(&without_marker);
        }
        pos = range.end;
    }

    out.push_str(&content[pos..]);
    out.replace(REMOVAL_MARKER, "")
}
