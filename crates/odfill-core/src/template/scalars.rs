//! Scalar substitution and leftover cleanup

use crate::data::FlattenedData;
use crate::markup::{escape_xml, html_to_odf, looks_like_markup};
use crate::template::FillOptions;
use crate::template::tokenize::{apply_replacements, scan_image_tokens, scan_placeholders};

/// Render one scalar value as ODF text content
///
/// Values carrying inline HTML-like markup are converted to ODF elements;
/// plain values are XML-escaped.
pub(crate) fn render_scalar(value: &str) -> String {
    if looks_like_markup(value) {
        html_to_odf(value)
    } else {
        escape_xml(value)
    }
}

/// Substitute every `@@key` token that has a scalar value
///
/// Array-valued keys and unknown keys keep their token; the leftover pass
/// decides their fate.
pub(crate) fn substitute_scalars(content: &str, data: &FlattenedData) -> String {
    let mut replacements = Vec::new();

    for token in scan_placeholders(content) {
        if let Some(value) = data.scalar(&token.key) {
            replacements.push((token.start..token.end, render_scalar(value)));
        }
    }

    apply_replacements(content, &replacements)
}

/// Final pass over a part: unresolved image directives are deleted, and
/// remaining `@@` tokens are replaced by the fallback text when one is
/// configured
pub(crate) fn resolve_leftovers(content: &str, options: &FillOptions) -> String {
    let image_removals: Vec<_> = scan_image_tokens(content)
        .into_iter()
        .map(|t| (t.start..t.end, String::new()))
        .collect();
    let content = apply_replacements(content, &image_removals);

    let Some(fallback) = options.fallback.as_deref() else {
        return content;
    };

    let replacements: Vec<_> = scan_placeholders(&content)
        .into_iter()
        .map(|t| (t.start..t.end, escape_xml(fallback)))
        .collect();
    apply_replacements(&content, &replacements)
}
