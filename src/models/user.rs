//! User and resource query models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Registered user, stored at `Users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Document key (not stored as a field)
    #[serde(skip)]
    pub id: String,
    /// Notification token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Remaining fields on the user document
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Resource queries from `Users/{id}/queries`
    #[serde(skip)]
    pub queries: Vec<ResourceQuery>,
}

/// A saved resource query. The schema is open; every field is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceQuery {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl ResourceQuery {
    /// String value of a field, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}
