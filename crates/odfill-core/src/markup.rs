//! Inline markup conversion
//!
//! Scalar values are normally XML-escaped before substitution. Values that
//! carry a small HTML-like tag subset are instead rewritten into ODF text
//! markup: bold/italic spans, paragraphs, line breaks and unordered lists.
//! Any remaining tag outside the `text:` namespace is stripped, preserving
//! inner text. A single forward scan, no backtracking.

/// Escape text for embedding in XML content or attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Tags rewritten into ODF markup
const KNOWN_TAGS: [&str; 8] = ["b", "strong", "i", "em", "p", "br", "ul", "li"];

/// Check whether a value contains inline markup
///
/// True only when the text has a tag from the recognized subset (or an
/// ODF `text:` element) with a closing `>`. Incidental angle brackets in
/// plain data, `2 < 3` or `<Labs>`, do not qualify and the value is
/// escaped instead.
pub fn looks_like_markup(text: &str) -> bool {
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('<') {
        let after = pos + offset + 1;
        let rest = text[after..].strip_prefix('/').unwrap_or(&text[after..]);

        if rest.starts_with("text:") && rest.contains('>') {
            return true;
        }

        let name_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if name_end > 0 {
            let name = rest[..name_end].to_ascii_lowercase();
            if KNOWN_TAGS.contains(&name.as_str()) && rest[name_end..].contains('>') {
                return true;
            }
        }

        pos = after;
    }
    false
}

/// Rewrite the fixed inline tag subset into ODF text markup
///
/// Recognized: `b`/`strong`, `i`/`em`, `p`, `br`, `ul`, `li` (matching is
/// case-insensitive). Tags already in the `text:` namespace pass through
/// verbatim; every other tag is dropped. Text content between tags is
/// XML-escaped.
pub fn html_to_odf(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        match input[pos..].find('<') {
            None => {
                out.push_str(&escape_xml(&input[pos..]));
                break;
            }
            Some(offset) => {
                out.push_str(&escape_xml(&input[pos..pos + offset]));
                let tag_start = pos + offset;
                match input[tag_start..].find('>') {
                    Some(end) => {
                        let tag = &input[tag_start..tag_start + end + 1];
                        out.push_str(&convert_tag(tag));
                        pos = tag_start + end + 1;
                    }
                    None => {
                        // Dangling '<' without a close is character data
                        out.push_str(&escape_xml(&input[tag_start..]));
                        break;
                    }
                }
            }
        }
    }

    out
}

fn convert_tag(tag: &str) -> String {
    let inner = &tag[1..tag.len() - 1];
    let closing = inner.starts_with('/');
    let body = inner.trim_start_matches('/').trim();
    let name_end = body
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(body.len());
    let name = body[..name_end].to_ascii_lowercase();

    if name.starts_with("text:") {
        return tag.to_string();
    }

    let replacement = match (name.as_str(), closing) {
        ("b" | "strong", false) => r#"<text:span text:style-name="Bold">"#,
        ("b" | "strong", true) => "</text:span>",
        ("i" | "em", false) => r#"<text:span text:style-name="Italic">"#,
        ("i" | "em", true) => "</text:span>",
        ("p", false) => "<text:p>",
        ("p", true) => "</text:p>",
        ("br", _) => "<text:line-break/>",
        ("ul", false) => "<text:list>",
        ("ul", true) => "</text:list>",
        ("li", false) => "<text:list-item><text:p>",
        ("li", true) => "</text:p></text:list-item>",
        // Unrecognized tag: strip, keep inner text
        _ => "",
    };
    replacement.to_string()
}
