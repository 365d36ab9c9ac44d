//! Value model: flattening nested data into dot-path keyed placeholders
//!
//! The fill passes never inspect raw JSON. Input data is flattened once per
//! run into a [`FlattenedData`] map, with every value classified up front as
//! scalar, array-of-records, or nil. Object nodes are recursively merged
//! into dot-path keys and never retained as a distinct variant.

pub mod xml;

use crate::error::{OdfillError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// One element of an array placeholder: field name to canonical text
pub type Record = BTreeMap<String, String>;

/// A flattened placeholder value
///
/// Decided once at flattening time so the substitution passes do not need
/// runtime type inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderValue {
    /// Scalar leaf in canonical text form
    Scalar(String),
    /// Array placeholder: ordered records, resolved by the row expander
    Records(Vec<Record>),
    /// JSON null: substitutes as empty text
    Nil,
}

/// Dot-path keyed mapping built once per fill run, read-only thereafter
#[derive(Debug, Clone, Default)]
pub struct FlattenedData {
    entries: BTreeMap<String, PlaceholderValue>,
}

impl FlattenedData {
    /// Flatten a parsed JSON document
    ///
    /// The root must be an object. Child objects are merged under
    /// `parent.child` keys; arrays are stored whole under their own key;
    /// scalar leaves are stored in canonical text form.
    ///
    /// # Errors
    ///
    /// Returns `DataFormat` if the root is not a JSON object.
    pub fn from_json(root: &Value) -> Result<Self> {
        let Value::Object(map) = root else {
            return Err(OdfillError::DataFormat(
                "top-level data must be an object".to_string(),
            ));
        };

        let mut entries = BTreeMap::new();
        flatten_object(map, "", &mut entries);
        Ok(Self { entries })
    }

    /// Parse and flatten a JSON document from text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        Self::from_json(&root)
    }

    pub fn get(&self, key: &str) -> Option<&PlaceholderValue> {
        self.entries.get(key)
    }

    /// Resolve a key to scalar text (`Nil` resolves to empty text)
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            PlaceholderValue::Scalar(s) => Some(s),
            PlaceholderValue::Nil => Some(""),
            PlaceholderValue::Records(_) => None,
        }
    }

    /// Resolve a key to its array records
    pub fn records(&self, key: &str) -> Option<&[Record]> {
        match self.entries.get(key)? {
            PlaceholderValue::Records(records) => Some(records),
            _ => None,
        }
    }

    /// Boolean resolution: true iff the scalar text case-insensitively
    /// equals "true" or equals the numeral "1". Missing keys, arrays and
    /// anything else resolve to false.
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.scalar(key) {
            Some(text) => text.eq_ignore_ascii_case("true") || text == "1",
            None => false,
        }
    }

    /// Reserved top-level key signaling a provisional output
    pub fn incomplete(&self) -> bool {
        self.is_truthy("incomplete")
    }

    /// Iterate entries in stable key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlaceholderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical text form of a scalar JSON value
fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // Non-scalar record fields keep their raw JSON text
        other => other.to_string(),
    }
}

fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn flatten_object(
    map: &serde_json::Map<String, Value>,
    parent: &str,
    out: &mut BTreeMap<String, PlaceholderValue>,
) {
    for (key, value) in map {
        let path = join_key(parent, key);
        match value {
            Value::Object(nested) => flatten_object(nested, &path, out),
            // Arrays are not descended into: row semantics are resolved
            // later against the element list, not as scalar paths
            Value::Array(items) => {
                let records = items.iter().map(array_element_record).collect();
                out.insert(path, PlaceholderValue::Records(records));
            }
            Value::Null => {
                out.insert(path, PlaceholderValue::Nil);
            }
            scalar => {
                out.insert(path, PlaceholderValue::Scalar(canonical_text(scalar)));
            }
        }
    }
}

/// Convert one array element into a record of canonical-text fields
///
/// Non-object elements become a single-field record keyed `value`, so an
/// array of scalars is still addressable as `@@key.value` in a row.
fn array_element_record(element: &Value) -> Record {
    match element {
        Value::Object(fields) => fields
            .iter()
            .map(|(k, v)| (k.clone(), canonical_text(v)))
            .collect(),
        other => {
            let mut record = Record::new();
            record.insert("value".to_string(), canonical_text(other));
            record
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_objects_to_dot_paths() {
        let data =
            FlattenedData::from_json(&json!({"a": {"b": {"c": "x"}}, "top": 7})).unwrap();
        assert_eq!(data.scalar("a.b.c"), Some("x"));
        assert_eq!(data.scalar("top"), Some("7"));
        assert_eq!(data.get("a"), None);
    }

    #[test]
    fn arrays_are_stored_whole_not_descended() {
        let data = FlattenedData::from_json(
            &json!({"items": [{"label": "A"}, {"label": "B"}]}),
        )
        .unwrap();
        let records = data.records("items").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("label").map(String::as_str), Some("A"));
        assert_eq!(records[1].get("label").map(String::as_str), Some("B"));
        assert_eq!(data.scalar("items"), None);
        assert_eq!(data.get("items.label"), None);
    }

    #[test]
    fn scalars_use_canonical_text() {
        let data = FlattenedData::from_json(
            &json!({"n": 1.5, "b": true, "s": "hi", "z": null}),
        )
        .unwrap();
        assert_eq!(data.scalar("n"), Some("1.5"));
        assert_eq!(data.scalar("b"), Some("true"));
        assert_eq!(data.scalar("s"), Some("hi"));
        assert_eq!(data.scalar("z"), Some(""));
    }

    #[test]
    fn non_object_array_elements_become_value_records() {
        let data = FlattenedData::from_json(&json!({"list": ["a", 2]})).unwrap();
        let records = data.records("list").unwrap();
        assert_eq!(records[0].get("value").map(String::as_str), Some("a"));
        assert_eq!(records[1].get("value").map(String::as_str), Some("2"));
    }

    #[test]
    fn truthiness_accepts_true_one_and_case_variants() {
        let data = FlattenedData::from_json(
            &json!({"a": true, "b": "TRUE", "c": 1, "d": "false", "e": 0}),
        )
        .unwrap();
        assert!(data.is_truthy("a"));
        assert!(data.is_truthy("b"));
        assert!(data.is_truthy("c"));
        assert!(!data.is_truthy("d"));
        assert!(!data.is_truthy("e"));
        assert!(!data.is_truthy("missing"));
    }

    #[test]
    fn incomplete_flag_is_read_from_top_level() {
        let data = FlattenedData::from_json(&json!({"incomplete": true})).unwrap();
        assert!(data.incomplete());
        let data = FlattenedData::from_json(&json!({"name": "x"})).unwrap();
        assert!(!data.incomplete());
    }

    #[test]
    fn top_level_non_object_is_data_format_error() {
        let result = FlattenedData::from_json(&json!([1, 2]));
        assert!(matches!(result, Err(OdfillError::DataFormat(_))));
    }

    #[test]
    fn flattening_is_stable() {
        let input = json!({"z": 1, "a": {"m": [{"k": "v"}], "n": "t"}});
        let first = FlattenedData::from_json(&input).unwrap();
        let second = FlattenedData::from_json(&input).unwrap();
        let keys_a: Vec<_> = first.iter().map(|(k, _)| k.to_string()).collect();
        let keys_b: Vec<_> = second.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys_a, keys_b);
        for (k, v) in first.iter() {
            assert_eq!(second.get(k), Some(v));
        }
    }
}
