//! Row expansion for array placeholders
//!
//! Every `Records`-valued placeholder `A` turns each table row referencing
//! `@@A.` into one filled clone per array element, in element order.
//! Row-scoped image directives are resolved first, then element fields and
//! ambient scalars are substituted in a single rebuild.

use crate::data::{PlaceholderValue, Record};
use crate::template::FillRun;
use crate::template::images::resolve_row_images;
use crate::template::scalars::render_scalar;
use crate::template::tokenize::{apply_replacements, scan_placeholders};
use std::ops::Range;

const ROW_START: &str = "<table:table-row";
const ROW_CLOSE: &str = "</table:table-row>";

/// Locate `<table:table-row>...</table:table-row>` blocks in order
///
/// First opening tag to first closing tag; ODT rows do not nest.
pub(crate) fn row_blocks(text: &str) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(ROW_START) {
        let start = pos + offset;
        let boundary = text.as_bytes().get(start + ROW_START.len());
        if !matches!(boundary, Some(b'>') | Some(b' ') | Some(b'/') | Some(b'\t') | Some(b'\n')) {
            pos = start + ROW_START.len();
            continue;
        }
        match text[start..].find(ROW_CLOSE) {
            Some(close) => {
                let end = start + close + ROW_CLOSE.len();
                blocks.push(start..end);
                pos = end;
            }
            None => break,
        }
    }

    blocks
}

/// Expand all array placeholders in the part
pub(crate) fn expand_rows(content: &str, run: &mut FillRun) -> String {
    let array_keys: Vec<String> = run
        .data()
        .iter()
        .filter_map(|(key, value)| {
            matches!(value, PlaceholderValue::Records(_)).then(|| key.to_string())
        })
        .collect();

    let mut content = content.to_string();
    for key in array_keys {
        content = expand_rows_for(&content, &key, run);
    }
    content
}

/// Expand candidate rows for one array placeholder
fn expand_rows_for(content: &str, key: &str, run: &mut FillRun) -> String {
    let reference = format!("@@{}.", key);
    let records = match run.data().records(key) {
        Some(records) => records,
        None => return content.to_string(),
    };

    let mut out = String::with_capacity(content.len());
    let mut pos = 0;

    for range in row_blocks(content) {
        let row = &content[range.start..range.end];
        if !row.contains(&reference) {
            continue;
        }
        out.push_str(&content[pos..range.start]);
        for record in records {
            out.push_str(&fill_row(row, key, record, run));
        }
        pos = range.end;
    }

    out.push_str(&content[pos..]);
    out
}

/// Fill one row clone from one array element
///
/// Fields missing on the element leave their token in place for later
/// passes.
fn fill_row(row: &str, key: &str, record: &Record, run: &mut FillRun) -> String {
    let row = resolve_row_images(row, record, run);

    let prefix = format!("{}.", key);
    let data = run.data();
    let mut replacements = Vec::new();

    for token in scan_placeholders(&row) {
        let value = match token.key.strip_prefix(&prefix) {
            Some(field) => record.get(field).map(|v| render_scalar(v)),
            None => data.scalar(&token.key).map(render_scalar),
        };
        if let Some(value) = value {
            replacements.push((token.start..token.end, value));
        }
    }

    apply_replacements(&row, &replacements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FlattenedData;
    use crate::template::{FillOptions, FillRun};
    use serde_json::json;

    fn row(inner: &str) -> String {
        format!("<table:table-row><table:table-cell><text:p>{inner}</text:p></table:table-cell></table:table-row>")
    }

    fn expand(content: &str, value: serde_json::Value) -> String {
        let data = FlattenedData::from_json(&value).unwrap();
        let options = FillOptions::default();
        let temp = odfill_testkit::temp_dir_in_workspace();
        let mut run = FillRun::new(temp.path(), &data, &options);
        expand_rows(content, &mut run)
    }

    #[test]
    fn finds_row_blocks_in_order() {
        let text = format!("{}{}", row("a"), row("b"));
        let blocks = row_blocks(&text);
        assert_eq!(blocks.len(), 2);
        assert!(text[blocks[0].start..blocks[0].end].contains(">a<"));
    }

    #[test]
    fn output_row_count_equals_array_length() {
        let content = row("@@items.label");
        let result = expand(
            &content,
            json!({"items": [{"label": "A"}, {"label": "B"}, {"label": "C"}]}),
        );
        assert_eq!(result.matches("<table:table-row>").count(), 3);
        for label in ["A", "B", "C"] {
            assert!(result.contains(&format!(">{label}<")));
        }
    }

    #[test]
    fn element_order_is_preserved() {
        let content = row("@@items.label");
        let result = expand(&content, json!({"items": [{"label": "A"}, {"label": "B"}]}));
        assert!(result.find(">A<").unwrap() < result.find(">B<").unwrap());
    }

    #[test]
    fn rows_without_reference_are_untouched() {
        let content = format!("{}{}", row("@@items.label"), row("static"));
        let result = expand(&content, json!({"items": [{"label": "A"}]}));
        assert_eq!(result.matches("<table:table-row>").count(), 2);
        assert!(result.contains("static"));
    }

    #[test]
    fn ambient_scalars_fill_inside_expanded_rows() {
        let content = row("@@items.label / @@currency");
        let result = expand(
            &content,
            json!({"currency": "EUR", "items": [{"label": "A"}, {"label": "B"}]}),
        );
        assert_eq!(result.matches("EUR").count(), 2);
    }

    #[test]
    fn missing_fields_leave_tokens_for_later_passes() {
        let content = row("@@items.label @@items.price");
        let result = expand(&content, json!({"items": [{"label": "A"}]}));
        assert!(result.contains("@@items.price"));
        assert!(result.contains('A'));
    }

    #[test]
    fn field_values_are_escaped() {
        let content = row("@@items.label");
        let result = expand(&content, json!({"items": [{"label": "a & b"}]}));
        assert!(result.contains("a &amp; b"));
    }

    #[test]
    fn markup_field_values_are_converted() {
        let content = row("@@items.label");
        let result = expand(&content, json!({"items": [{"label": "<b>hot</b>"}]}));
        assert!(result.contains(r#"<text:span text:style-name="Bold">hot</text:span>"#));
    }

    #[test]
    fn field_names_sharing_a_prefix_do_not_collide() {
        let content = row("@@items.id|@@items.idx");
        let result = expand(&content, json!({"items": [{"id": "1", "idx": "2"}]}));
        assert!(result.contains(">1|2<"));
    }

    #[test]
    fn empty_array_removes_the_row() {
        let content = row("@@items.label");
        let result = expand(&content, json!({"items": []}));
        assert!(!result.contains("<table:table-row"));
    }
}
