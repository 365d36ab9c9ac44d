//! Template sanitizing
//!
//! Editors accumulate automatic character styles that carry no visible
//! formatting. The spans referencing them break placeholders apart
//! (`@@na` + `me`), so filling can no longer see the key. Sanitizing
//! unwraps every span whose style defines nothing worth keeping.

use crate::error::Result;
use std::fs;
use std::path::Path;

const STYLE_START: &str = "<style:style ";
const STYLE_CLOSE: &str = "</style:style>";
const SPAN_OPEN: &str = "<text:span";
const SPAN_CLOSE: &str = "</text:span>";

/// Properties that make a character style worth keeping
const SIGNIFICANT: [&str; 5] = [
    "fo:font-weight",
    "fo:font-style",
    "fo:font-size",
    "fo:color",
    "style:text-underline-style",
];

fn attr_value<'a>(tag: &'a str, attr: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", attr);
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')? + start;
    Some(&tag[start..end])
}

/// Collect names of `style:family="text"` styles with no significant
/// properties
fn vacuous_style_names(content: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut pos = 0;

    while let Some(offset) = content[pos..].find(STYLE_START) {
        let start = pos + offset;
        let Some(tag_end) = content[start..].find('>') else {
            break;
        };
        let tag = &content[start..start + tag_end + 1];

        let body_end;
        if tag.ends_with("/>") {
            body_end = start + tag_end + 1;
        } else {
            match content[start..].find(STYLE_CLOSE) {
                Some(close) => body_end = start + close + STYLE_CLOSE.len(),
                None => break,
            }
        }
        let element = &content[start..body_end];
        pos = body_end;

        if attr_value(tag, "style:family") != Some("text") {
            continue;
        }
        let Some(name) = attr_value(tag, "style:name") else {
            continue;
        };
        if SIGNIFICANT.iter().any(|p| element.contains(p)) {
            continue;
        }
        names.push(name.to_string());
    }

    names
}

/// Unwrap one span kind everywhere, keeping its character data
///
/// Spans nest, so the matching close tag is found by depth counting.
fn unwrap_spans(content: &str, style_name: &str) -> String {
    let open_prefix = format!("{} text:style-name=\"{}\"", SPAN_OPEN, style_name);
    let mut out = String::with_capacity(content.len());
    let mut pos = 0;

    while let Some(offset) = content[pos..].find(&open_prefix) {
        let start = pos + offset;
        let Some(open_end) = content[start..].find('>').map(|o| start + o + 1) else {
            break;
        };
        let Some(close_start) = matching_span_close(content, open_end) else {
            break;
        };

        out.push_str(&content[pos..start]);
        out.push_str(&content[open_end..close_start]);
        pos = close_start + SPAN_CLOSE.len();
    }

    out.push_str(&content[pos..]);
    out
}

/// Position of the `</text:span>` matching an open tag ending at `from`
fn matching_span_close(content: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = from;

    loop {
        let close = content[pos..].find(SPAN_CLOSE)?;
        let open = content[pos..].find(SPAN_OPEN);

        match open {
            Some(open) if open < close => {
                depth += 1;
                pos += open + SPAN_OPEN.len();
            }
            _ => {
                if depth == 0 {
                    return Some(pos + close);
                }
                depth -= 1;
                pos += close + SPAN_CLOSE.len();
            }
        }
    }
}

/// Unwrap spans referencing vacuous automatic text styles in one part
pub fn sanitize_part(content: &str) -> String {
    let mut content = content.to_string();
    for name in vacuous_style_names(&content) {
        loop {
            let next = unwrap_spans(&content, &name);
            if next == content {
                break;
            }
            content = next;
        }
    }
    content
}

/// Sanitize the text parts of an extracted document in place
pub fn sanitize_document(work_dir: &Path) -> Result<()> {
    for part in ["content.xml", "styles.xml"] {
        let path = work_dir.join(part);
        if !path.is_file() {
            continue;
        }
        let content = fs::read_to_string(&path)?;
        fs::write(&path, sanitize_part(&content))?;
    }
    Ok(())
}

/// Sanitize a template document into a new file
pub fn sanitize_template(template: &Path, dest: &Path) -> Result<()> {
    let work = tempfile::tempdir()?;
    crate::package::extract_template(template, work.path())?;
    sanitize_document(work.path())?;
    crate::package::write_package(work.path(), dest)
}
