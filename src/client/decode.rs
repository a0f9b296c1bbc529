//! Lenient JSON decoding for GitLab payloads
//!
//! Object keys are matched case-insensitively and `null` members are treated
//! as absent, so that `#[serde(default)]` records fall back to zero values
//! instead of failing on a `null` string or number.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Parses `body` and decodes it into `T` after key normalization.
pub fn from_str<T>(body: &str) -> serde_json::Result<T>
where
    T: DeserializeOwned,
{
    let value: Value = serde_json::from_str(body)?;
    serde_json::from_value(normalize(value))
}

/// Lowercases object keys and drops `null` members, recursively.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.to_ascii_lowercase(), normalize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}
