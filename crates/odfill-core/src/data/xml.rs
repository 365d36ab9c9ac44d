//! XML data input
//!
//! An alternate hierarchical data format, normalized into the same nested
//! JSON shape before flattening: repeated sibling elements become arrays,
//! elements with children become objects, leaf elements become text scalars.

use crate::error::{OdfillError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::Value;

#[derive(Debug, Default)]
struct Node {
    children: Vec<(String, Node)>,
    text: String,
}

/// Parse an XML data document into a nested JSON value
///
/// The document element itself is not a key; its children form the
/// top-level object, mirroring the JSON input shape.
///
/// # Errors
///
/// Returns `DataFormat` on malformed XML or a missing document element.
pub fn parse_xml_data(text: &str) -> Result<Value> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    // Stack of open elements; index 0 is a synthetic document holder
    let mut stack: Vec<(String, Node)> = vec![(String::new(), Node::default())];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(e.name().as_ref())?;
                stack.push((name, Node::default()));
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(e.name().as_ref())?;
                push_child(&mut stack, name, Node::default())?;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| OdfillError::DataFormat(format!("XML text: {}", e)))?;
                let (_, node) = stack
                    .last_mut()
                    .ok_or_else(|| OdfillError::DataFormat("unbalanced XML".to_string()))?;
                node.text.push_str(&text);
            }
            Ok(Event::End(_)) => {
                let (name, node) = stack
                    .pop()
                    .ok_or_else(|| OdfillError::DataFormat("unbalanced XML".to_string()))?;
                push_child(&mut stack, name, node)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(OdfillError::DataFormat(format!("XML error: {}", e)));
            }
        }
    }

    let (_, holder) = stack
        .pop()
        .ok_or_else(|| OdfillError::DataFormat("empty XML document".to_string()))?;
    let (_, root) = holder
        .children
        .into_iter()
        .next()
        .ok_or_else(|| OdfillError::DataFormat("XML document has no root element".to_string()))?;

    Ok(node_to_value(&root))
}

fn element_name(raw: &[u8]) -> Result<String> {
    let name = std::str::from_utf8(raw)
        .map_err(|_| OdfillError::DataFormat("non-UTF8 element name".to_string()))?;
    // Strip any namespace prefix; data documents use plain local names
    Ok(name.rsplit(':').next().unwrap_or(name).to_string())
}

fn push_child(stack: &mut [(String, Node)], name: String, node: Node) -> Result<()> {
    let (_, parent) = stack
        .last_mut()
        .ok_or_else(|| OdfillError::DataFormat("unbalanced XML".to_string()))?;
    parent.children.push((name, node));
    Ok(())
}

fn node_to_value(node: &Node) -> Value {
    if node.children.is_empty() {
        return Value::String(node.text.clone());
    }

    let mut map = serde_json::Map::new();
    let mut seen: Vec<&str> = Vec::new();

    for (name, _) in &node.children {
        if seen.contains(&name.as_str()) {
            continue;
        }
        seen.push(name);

        let matching: Vec<&Node> = node
            .children
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, c)| c)
            .collect();

        let value = if matching.len() > 1 {
            Value::Array(matching.iter().map(|c| node_to_value(c)).collect())
        } else {
            node_to_value(matching[0])
        };
        map.insert(name.clone(), value);
    }

    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_elements_become_scalars() {
        let value = parse_xml_data("<data><name>Acme</name><count>3</count></data>").unwrap();
        assert_eq!(value, json!({"name": "Acme", "count": "3"}));
    }

    #[test]
    fn nested_elements_become_objects() {
        let value =
            parse_xml_data("<data><customer><name>Acme</name></customer></data>").unwrap();
        assert_eq!(value, json!({"customer": {"name": "Acme"}}));
    }

    #[test]
    fn repeated_siblings_become_arrays() {
        let value = parse_xml_data(
            "<data><item><label>A</label></item><item><label>B</label></item></data>",
        )
        .unwrap();
        assert_eq!(
            value,
            json!({"item": [{"label": "A"}, {"label": "B"}]})
        );
    }

    #[test]
    fn repeated_leaf_siblings_become_string_arrays() {
        let value = parse_xml_data("<data><tag>a</tag><tag>b</tag></data>").unwrap();
        assert_eq!(value, json!({"tag": ["a", "b"]}));
    }

    #[test]
    fn empty_elements_become_empty_strings() {
        let value = parse_xml_data("<data><note/></data>").unwrap();
        assert_eq!(value, json!({"note": ""}));
    }

    #[test]
    fn malformed_xml_is_data_format_error() {
        let result = parse_xml_data("<data><open></data>");
        assert!(matches!(result, Err(OdfillError::DataFormat(_))));
    }

    #[test]
    fn xml_input_flattens_like_json_input() {
        let value = parse_xml_data(
            "<data><name>Acme</name><items><label>A</label></items><items><label>B</label></items></data>",
        )
        .unwrap();
        let data = crate::data::FlattenedData::from_json(&value).unwrap();
        assert_eq!(data.scalar("name"), Some("Acme"));
        assert_eq!(data.records("items").unwrap().len(), 2);
    }
}
