//! values that are either literal or selected by an attribute
//!
//! ```yaml
//! maxCapacity:
//!   by-pool:
//!     ci: 50
//!     nightly-.*: 10
//!     default: 5
//! ```
//!
//! Alternatives are matched against the attribute's value: an exact key first, then keys taken as
//! anchored regular expressions, then `default`. A selected alternative may itself be keyed by
//! another attribute.
use crate::error::Error;
use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;

const PREFIX: &str = "by-";
const DEFAULT: &str = "default";

/// Resolve `value` against `attributes`
///
/// `item_name` only appears in error messages.
pub fn evaluate(
    value: &Value,
    item_name: &str,
    attributes: &HashMap<String, String>,
) -> Result<Value, Error> {
    let mut value = value;

    loop {
        let Some((keyed_by, alternatives)) = keyed_by(value) else {
            return Ok(value.clone());
        };

        let Value::Object(alternatives) = alternatives else {
            return Err(Error::KeyedBy(format!(
                "Keyed-by '{keyed_by}' must map to an object of alternatives, when determining item {item_name}"
            )));
        };

        if alternatives.len() == 1 && alternatives.contains_key(DEFAULT) {
            return Err(Error::KeyedBy(format!(
                "Keyed-by '{keyed_by}' unnecessary with only value 'default' found, when determining item {item_name}"
            )));
        }

        let Some(key) = attributes.get(keyed_by) else {
            match alternatives.get(DEFAULT) {
                Some(default) => {
                    value = default;
                    continue;
                }
                None => {
                    return Err(Error::KeyedBy(format!(
                        "No attribute {keyed_by} and no value for 'default' found while determining item {item_name}"
                    )))
                }
            }
        };

        if let Some(exact) = alternatives.get(key) {
            value = exact;
            continue;
        }

        let mut matches = Vec::new();
        for (pattern, alternative) in alternatives {
            if pattern == DEFAULT {
                continue;
            }

            let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                Error::KeyedBy(format!(
                    "Invalid pattern {pattern:?} for {keyed_by} while determining item {item_name}: {err}"
                ))
            })?;

            if anchored.is_match(key) {
                matches.push(alternative);
            }
        }

        match matches.as_slice() {
            [single] => {
                value = *single;
                continue;
            }
            [] => {}
            _ => {
                return Err(Error::KeyedBy(format!(
                    "Multiple matching values for {keyed_by} {key:?} found while determining item {item_name}"
                )))
            }
        }

        match alternatives.get(DEFAULT) {
            Some(default) => value = default,
            None => {
                return Err(Error::KeyedBy(format!(
                    "No {keyed_by} matching {key:?} nor 'default' found while determining item {item_name}"
                )))
            }
        }
    }
}

/// Split a `{"by-<attribute>": alternatives}` value
fn keyed_by(value: &Value) -> Option<(&str, &Value)> {
    let Value::Object(object) = value else {
        return None;
    };

    if object.len() != 1 {
        return None;
    }

    let (key, alternatives) = object.iter().next()?;
    key.strip_prefix(PREFIX)
        .map(|attribute| (attribute, alternatives))
}
