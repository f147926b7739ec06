//! secret values and secret templates
//!
//! A template is any value; strings starting with `$` name a secret and are replaced by its value.
//! `$$` escapes a literal leading `$`.
use crate::error::{Error, LoadError};
use crate::value::{Object, Value};
use indexmap::IndexMap;
use std::path::Path;

/// Where secret values come from
pub trait SecretSource: Sync {
    fn get(&self, name: &str) -> Option<&Value>;
}

/// Secret values held in memory, usually loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct SecretValues {
    values: IndexMap<String, Value>,
}

impl SecretValues {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadError> {
        Ok(Self {
            values: serde_yaml::from_str(yaml)?,
        })
    }

    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        tracing::info!(path=%file_path.display(), "loading secret values");
        let file_contents = std::fs::read_to_string(file_path)?;
        let secrets = Self::from_yaml_str(&file_contents)?;
        tracing::info!(count = secrets.values.len(), "secrets fetched");
        Ok(secrets)
    }
}

impl SecretSource for SecretValues {
    fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Replace every `$name` in `template` with the named secret
///
/// There is no rendering without a source; callers fall back to a secret without content.
pub fn render(template: &Object, source: Option<&dyn SecretSource>) -> Result<Value, Error> {
    let source = source.ok_or(Error::SecretSourceMissing)?;
    render_value(&Value::Object(template.clone()), source)
}

fn render_value(value: &Value, source: &dyn SecretSource) -> Result<Value, Error> {
    match value {
        Value::String(s) => match s.strip_prefix('$') {
            Some(escaped) if escaped.starts_with('$') => Ok(Value::String(escaped.to_string())),
            Some(name) => source.get(name).cloned().ok_or_else(|| Error::SecretRender {
                name: name.to_string(),
            }),
            None => Ok(value.clone()),
        },
        Value::Array(values) => values
            .iter()
            .map(|value| render_value(value, source))
            .collect::<Result<_, _>>()
            .map(Value::Array),
        Value::Object(object) => object
            .iter()
            .map(|(key, value)| Ok((key.clone(), render_value(value, source)?)))
            .collect::<Result<Object, Error>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn template(value: Value) -> Object {
        match value {
            Value::Object(object) => object,
            other => panic!("not an object: {other}"),
        }
    }

    fn secrets() -> SecretValues {
        let mut secrets = SecretValues::default();
        secrets.insert("hostname-secret", "s3cr3t");
        secrets.insert("structured", json!({"user": "u", "password": "p"}));
        secrets
    }

    #[test]
    fn replaces_nested_placeholders() {
        let rendered = render(
            &template(json!({
                "config": {
                    "statelessHostname": {"secret": "$hostname-secret", "domain": "example.net"},
                    "list": ["$structured", 3, true],
                },
            })),
            Some(&secrets()),
        )
        .unwrap();

        assert_eq!(
            rendered,
            json!({
                "config": {
                    "statelessHostname": {"secret": "s3cr3t", "domain": "example.net"},
                    "list": [{"user": "u", "password": "p"}, 3, true],
                },
            })
        );
    }

    #[test]
    fn double_dollar_escapes() {
        let rendered = render(&template(json!({"price": "$$5"})), Some(&secrets())).unwrap();
        assert_eq!(rendered, json!({"price": "$5"}));
    }

    #[test]
    fn undefined_secret_errors() {
        let err = render(&template(json!({"a": "$missing"})), Some(&secrets())).unwrap_err();
        assert!(matches!(err, Error::SecretRender { name } if name == "missing"));
    }

    #[test]
    fn rendering_requires_a_source() {
        let err = render(&template(json!({"a": "plain"})), None).unwrap_err();
        assert!(matches!(err, Error::SecretSourceMissing));
    }

    #[test]
    fn load_from_yaml() {
        let secrets = SecretValues::from_yaml_str("token: abc\nnested:\n  a: 1\n").unwrap();
        assert_eq!(secrets.get("token"), Some(&json!("abc")));
        assert_eq!(secrets.get("nested"), Some(&json!({"a": 1})));
        assert_eq!(secrets.get("other"), None);
    }
}
