//! 输入校验

use serde_json::Value;
use uuid::{Uuid, Variant, Version};

const REQUIRED_FIELDS: [&str; 3] = ["username", "age", "hobbies"];

/// True iff `s` is a hyphenated, version-4, RFC 4122 UUID.
pub fn is_valid_id(s: &str) -> bool {
    let hyphenated = s.len() == 36
        && s.char_indices()
            .all(|(i, c)| matches!(i, 8 | 13 | 18 | 23) == (c == '-'));
    if !hyphenated {
        return false;
    }

    match Uuid::try_parse(s) {
        Ok(id) => id.get_version() == Some(Version::Random) && id.get_variant() == Variant::RFC4122,
        Err(_) => false,
    }
}

/// True iff every required field is present and truthy.
pub fn has_required_fields(payload: &Value) -> bool {
    match payload.as_object() {
        Some(fields) => REQUIRED_FIELDS
            .iter()
            .all(|name| fields.get(*name).is_some_and(is_truthy)),
        None => false,
    }
}

// `null`, `false`, zero and the empty string count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
