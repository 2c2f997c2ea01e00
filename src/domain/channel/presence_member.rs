//! Presence member identity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The identity a connection holds on a presence channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceMember {
    pub user_id: String,
    #[serde(default = "empty_object")]
    pub user_info: Value,
}

impl PresenceMember {
    pub fn new(user_id: impl Into<String>, user_info: Value) -> Self {
        Self {
            user_id: user_id.into(),
            user_info,
        }
    }

    /// Reads an identity document of the form `{"user_id": .., "user_info": {..}}`.
    ///
    /// Numeric user ids are accepted and stringified. Returns `None` when the
    /// document is not an object or has no non-empty user id.
    pub fn from_document(document: &Value) -> Option<Self> {
        let object = document.as_object()?;
        let user_id = match object.get("user_id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let user_info = object.get("user_info").cloned().unwrap_or_else(empty_object);
        Some(Self { user_id, user_info })
    }

    /// The identity as a JSON object.
    pub fn to_document(&self) -> Value {
        let mut object = Map::new();
        object.insert("user_id".to_string(), Value::String(self.user_id.clone()));
        object.insert("user_info".to_string(), self.user_info.clone());
        Value::Object(object)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
