//! Conversion between the uniform textual `settings.value` column and typed
//! values.
//!
//! Decoding never fails: text that does not parse as its declared type comes
//! back as [`Decoded::Fallback`] carrying the raw text, so a corrupt row can
//! not break the read path.

use crate::models::{Decoded, SettingValue, ValueType};

/// Encode a value for storage under `value_type`. An absent value stays
/// absent (`NULL`), never an empty string.
pub fn encode(value: Option<&SettingValue>, value_type: ValueType) -> Option<String> {
    let value = value?;
    Some(match value_type {
        ValueType::Json => canonical(value.to_json()).to_string(),
        ValueType::Boolean => if is_truthy(value) { "true" } else { "false" }.to_string(),
        ValueType::String | ValueType::Integer | ValueType::Float => plain_text(value),
    })
}

/// Decode stored text as `value_type`.
pub fn decode(text: Option<&str>, value_type: ValueType) -> Option<Decoded> {
    let text = text?;
    let decoded = match value_type {
        ValueType::String => Decoded::Value(SettingValue::String(text.to_string())),
        ValueType::Integer => match text.trim().parse::<i64>() {
            Ok(n) => Decoded::Value(SettingValue::Integer(n)),
            Err(_) => Decoded::Fallback(text.to_string()),
        },
        ValueType::Float => match text.trim().parse::<f64>() {
            Ok(n) => Decoded::Value(SettingValue::Float(n)),
            Err(_) => Decoded::Fallback(text.to_string()),
        },
        ValueType::Boolean => {
            let lower = text.to_lowercase();
            Decoded::Value(SettingValue::Boolean(matches!(lower.as_str(), "true" | "1" | "yes")))
        }
        ValueType::Json => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(v) => Decoded::Value(SettingValue::Json(v)),
            Err(_) => Decoded::Fallback(text.to_string()),
        },
    };
    Some(decoded)
}

/// Decode an optional JSON document column, using `{}` when absent or
/// unparseable.
pub(crate) fn json_or_empty(text: Option<String>) -> serde_json::Value {
    text.and_then(|t| serde_json::from_str(&t).ok())
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()))
}

pub(crate) fn json_text(value: Option<&serde_json::Value>) -> Option<String> {
    value.map(|v| canonical(v.clone()).to_string())
}

/// Rebuild objects with their keys in sorted order so serialization does not
/// depend on insertion order.
fn canonical(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(entries.into_iter().map(|(k, v)| (k, canonical(v))).collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonical).collect())
        }
        other => other,
    }
}

fn plain_text(value: &SettingValue) -> String {
    match value {
        SettingValue::String(s) => s.clone(),
        SettingValue::Json(v) => v.to_string(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &SettingValue) -> bool {
    match value {
        SettingValue::Boolean(b) => *b,
        SettingValue::Integer(n) => *n != 0,
        SettingValue::Float(n) => *n != 0.0,
        SettingValue::String(s) => !s.is_empty(),
        SettingValue::Json(v) => match v {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Array(a) => !a.is_empty(),
            serde_json::Value::Object(o) => !o.is_empty(),
        },
    }
}
