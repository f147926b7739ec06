//! value representation
//!
//! Configuration documents are opaque trees of [serde_json::Value]. Objects preserve insertion
//! order (the `preserve_order` feature), so generated documents read in the order they were
//! built.
//!
//! Hashing needs the opposite: a representation that does not depend on insertion order. [Canonical]
//! serializes a value with every object's keys sorted.
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serialize, Serializer,
};
pub use serde_json::Value;

/// Order-preserving map used for every object in a configuration document
pub type Object = serde_json::Map<String, Value>;

/// Serializes the wrapped value with object keys in sorted order
#[derive(Debug, Clone, Copy)]
pub struct Canonical<'a>(pub &'a Value);

impl Canonical<'_> {
    /// Compact JSON, keys sorted
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for Canonical<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(&Canonical(element))?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut entries: Vec<_> = value.iter().collect();
                entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

                let mut ser = serializer.serialize_map(Some(entries.len()))?;
                for (element_key, element_value) in entries {
                    ser.serialize_entry(element_key, &Canonical(element_value))?;
                }
                ser.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Human readable name of a value's type, for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Walk a path of object keys
pub fn get_path<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn canonical_sorts_nested_keys() {
        let value = json!({"b": [{"z": 1, "a": 2}], "a": {"y": true, "x": null}});
        assert_eq!(
            Canonical(&value).to_json().unwrap(),
            r#"{"a":{"x":null,"y":true},"b":[{"a":2,"z":1}]}"#
        );
    }

    #[test]
    fn canonical_ignores_insertion_order() {
        let one = json!({"first": 1, "second": {"c": 3, "d": 4}});
        let two = json!({"second": {"d": 4, "c": 3}, "first": 1});
        assert_eq!(
            Canonical(&one).to_json().unwrap(),
            Canonical(&two).to_json().unwrap()
        );
    }

    #[test]
    fn path_lookup() {
        let value = json!({"genericWorker": {"config": {"sentryProject": "gw"}}});
        assert_eq!(
            get_path(&value, &["genericWorker", "config", "sentryProject"]),
            Some(&json!("gw"))
        );
        assert_eq!(get_path(&value, &["genericWorker", "missing"]), None);
    }
}
