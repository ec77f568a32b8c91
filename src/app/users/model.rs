//! 用户数据模型
//!
//! Field values are kept as supplied: only presence is checked, never type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: Value,
    pub age: Value,
    pub hobbies: Value,
}

/// 创建用户请求
#[derive(Debug)]
pub struct NewUser {
    pub username: Value,
    pub age: Value,
    pub hobbies: Value,
}

/// 更新用户请求。`id` is not a field here, so a client-supplied id is dropped.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub username: Option<Value>,
    pub age: Option<Value>,
    pub hobbies: Option<Value>,
}

impl User {
    pub fn new(payload: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: payload.username,
            age: payload.age,
            hobbies: payload.hobbies,
        }
    }

    /// Supplied fields overwrite, the rest are kept.
    pub fn merge(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(hobbies) = patch.hobbies {
            self.hobbies = hobbies;
        }
    }
}

/// Parses a raw request body. A malformed body is a handling fault, not a
/// client error.
pub fn decode_body(bytes: &[u8]) -> Result<Value, CoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| CoreError::InternalServerError(format!("malformed JSON body: {}", e)))
}

fn into_fields(payload: Value) -> Map<String, Value> {
    match payload {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

impl NewUser {
    /// Absent fields become `null`; callers check presence first.
    pub fn from_payload(payload: Value) -> Self {
        let mut fields = into_fields(payload);
        let mut take = |name: &str| fields.remove(name).unwrap_or(Value::Null);
        Self {
            username: take("username"),
            age: take("age"),
            hobbies: take("hobbies"),
        }
    }
}

impl UserPatch {
    /// Every supplied key is overlaid, `null` included. Anything other than a
    /// JSON object patches nothing.
    pub fn from_payload(payload: Value) -> Self {
        let mut fields = into_fields(payload);
        Self {
            username: fields.remove("username"),
            age: fields.remove("age"),
            hobbies: fields.remove("hobbies"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> User {
        User::new(NewUser::from_payload(json!({
            "username": "Andrei",
            "age": 28,
            "hobbies": ["Music", "Travel"]
        })))
    }

    #[test]
    fn test_merge_keeps_unsupplied_fields() {
        let mut user = sample();
        let id = user.id;

        user.merge(UserPatch::from_payload(json!({ "age": 30, "id": "ignored" })));

        assert_eq!(user.id, id);
        assert_eq!(user.username, json!("Andrei"));
        assert_eq!(user.age, json!(30));
        assert_eq!(user.hobbies, json!(["Music", "Travel"]));
    }

    #[test]
    fn test_values_are_kept_as_supplied() {
        let user = User::new(NewUser::from_payload(json!({
            "username": 42,
            "age": "28",
            "hobbies": "none"
        })));
        assert_eq!(user.username, json!(42));
        assert_eq!(user.age, json!("28"));
        assert_eq!(user.hobbies, json!("none"));

        let mut user = user;
        user.merge(UserPatch::from_payload(json!({ "username": null, "age": [1] })));
        assert_eq!(user.username, Value::Null);
        assert_eq!(user.age, json!([1]));
    }

    #[test]
    fn test_non_object_patch_is_empty() {
        let patch = UserPatch::from_payload(json!([1, 2, 3]));
        assert!(patch.username.is_none() && patch.age.is_none() && patch.hobbies.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let user = sample();
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["id"], json!(user.id.to_string()));
        assert_eq!(value["age"], json!(28));
    }

    #[test]
    fn test_malformed_body_is_internal_error() {
        assert!(matches!(
            decode_body(b"{not json"),
            Err(CoreError::InternalServerError(_))
        ));
        assert!(matches!(decode_body(b""), Err(CoreError::InternalServerError(_))));
    }
}
