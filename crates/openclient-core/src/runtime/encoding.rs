//! Flattening of structured parameter values into string fields.

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::error::{ClientError, ClientResult};

/// How a query parameter is serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryStyle {
    /// `name=value`; arrays and objects repeat or comma-join depending on `explode`
    Form { explode: bool },
    /// Bracketed keys: `name[key][0]=value`
    DeepObject,
}

impl Default for QueryStyle {
    fn default() -> Self {
        Self::Form { explode: true }
    }
}

/// Serialize `value` to JSON for encoding
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> ClientResult<JsonValue> {
    serde_json::to_value(value).map_err(|e| ClientError::encode(e.to_string()))
}

/// The text form of a scalar; `None` for null, arrays and objects
pub fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// Simple-style text for path segments and headers.
///
/// Arrays of scalars are comma-joined. `Ok(None)` means null: the value is absent.
pub fn simple_value(name: &str, value: &JsonValue) -> ClientResult<Option<String>> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::Array(items) => {
            let parts = items
                .iter()
                .map(|item| {
                    scalar_to_string(item).ok_or_else(|| {
                        ClientError::encode(format!("'{name}' must be a list of scalars"))
                    })
                })
                .collect::<ClientResult<Vec<_>>>()?;
            Ok(Some(parts.join(",")))
        }
        JsonValue::Object(_) => Err(ClientError::encode(format!(
            "'{name}' is an object and cannot be written as a single value"
        ))),
        scalar => Ok(scalar_to_string(scalar)),
    }
}

/// Encode a query parameter in `style`
pub fn encode_query(name: &str, value: &JsonValue, style: QueryStyle) -> Vec<(String, String)> {
    match style {
        QueryStyle::Form { explode } => encode_form(name, value, explode),
        QueryStyle::DeepObject => encode_deep_object(name, value),
    }
}

/// Form-style encoding.
///
/// Exploded arrays repeat the name, exploded objects use each key as its own
/// field. Without explode both are comma-joined into one field.
pub fn encode_form(name: &str, value: &JsonValue, explode: bool) -> Vec<(String, String)> {
    match value {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
            if explode {
                parts.into_iter().map(|v| (name.to_string(), v)).collect()
            } else if parts.is_empty() {
                Vec::new()
            } else {
                vec![(name.to_string(), parts.join(","))]
            }
        }
        JsonValue::Object(members) => {
            let pairs = members
                .iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k.clone(), v)));
            if explode {
                pairs.collect()
            } else {
                let joined: Vec<String> = pairs.flat_map(|(k, v)| [k, v]).collect();
                if joined.is_empty() {
                    Vec::new()
                } else {
                    vec![(name.to_string(), joined.join(","))]
                }
            }
        }
        scalar => scalar_to_string(scalar)
            .map(|v| vec![(name.to_string(), v)])
            .unwrap_or_default(),
    }
}

/// Deep-object encoding.
///
/// Objects nest as `prefix[key]`, arrays as `prefix[index]`, to any depth.
/// Leaves that are null or the empty string are left out entirely.
pub fn encode_deep_object(prefix: &str, value: &JsonValue) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    flatten(prefix, value, &mut fields);
    fields
}

fn flatten(key: &str, value: &JsonValue, fields: &mut Vec<(String, String)>) {
    match value {
        JsonValue::Object(members) => {
            for (member, inner) in members {
                flatten(&format!("{key}[{member}]"), inner, fields);
            }
        }
        JsonValue::Array(items) => {
            for (index, inner) in items.iter().enumerate() {
                flatten(&format!("{key}[{index}]"), inner, fields);
            }
        }
        JsonValue::String(s) if s.is_empty() => {}
        leaf => {
            if let Some(text) = scalar_to_string(leaf) {
                fields.push((key.to_string(), text));
            }
        }
    }
}
