//! Session Model
//!
//! The user snapshot written at login, decoded strictly: a snapshot either
//! has the expected shape or is rejected as a whole.

use estatedesk_core::{session_error, EstateResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// Identifier as sent by the REST API, numeric or string
///
/// Ids never take part in authorization, so any JSON number is accepted
/// as-is (floats and values past `i64` included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(Number),
    Text(String),
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        RecordId::Number(n.into())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// A single grantable capability, identified by its title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub title: String,
    /// Remaining fields of the permission, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Permission {
    /// Create a permission with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            extra: Map::new(),
        }
    }
}

/// A named bundle of permissions assigned to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub permissions: Vec<Permission>,
    /// Remaining fields of the role (`guard_name`, `pivot`, ...), kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Role {
    /// Create a role from a title and its permissions
    pub fn new(title: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            id: None,
            title: title.into(),
            permissions,
            extra: Map::new(),
        }
    }
}

/// Authenticated user as persisted by the login flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<Role>,
    /// Remaining fields of the snapshot, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Numbers and strings become ids; any other shape reads as no id
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => Some(RecordId::Number(n)),
        Some(Value::String(s)) => Some(RecordId::Text(s)),
        _ => None,
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl User {
    /// Decode a snapshot; anything but a well-formed JSON object is rejected
    pub fn from_value(value: Value) -> EstateResult<Self> {
        if !value.is_object() {
            return Err(session_error!(
                "Session record is not a JSON object",
                "session_model"
            ));
        }

        serde_json::from_value(value).map_err(|e| {
            session_error!(
                format!("Malformed session record: {}", e),
                "session_model",
                e
            )
        })
    }

    /// Parse and decode a serialized snapshot
    pub fn from_json_str(raw: &str) -> EstateResult<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            session_error!(
                format!("Session record is not valid JSON: {}", e),
                "session_model",
                e
            )
        })?;
        Self::from_value(value)
    }

    /// Union of every role's permission titles, deduplicated by title
    ///
    /// Titles keep the order they are first seen in (role order, then
    /// permission order within the role).
    pub fn permission_titles(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.roles
            .iter()
            .flat_map(|role| role.permissions.iter())
            .filter(|permission| seen.insert(permission.title.as_str()))
            .map(|permission| permission.title.clone())
            .collect()
    }

    /// Titles of the assigned roles, in order
    pub fn role_titles(&self) -> Vec<&str> {
        self.roles.iter().map(|role| role.title.as_str()).collect()
    }

    /// Get user display string
    pub fn display_string(&self) -> String {
        let label = self
            .name
            .as_deref()
            .or(self.username.as_deref())
            .or(self.email.as_deref());

        match (label, &self.id) {
            (Some(label), Some(id)) => format!("{} (#{})", label, id),
            (Some(label), None) => label.to_string(),
            (None, Some(id)) => format!("#{}", id),
            (None, None) => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shared_permission_is_listed_once() {
        let user = User::from_value(json!({
            "roles": [
                {"title": "Admin", "permissions": [{"title": "edit"}, {"title": "delete"}]},
                {"title": "Viewer", "permissions": [{"title": "view"}, {"title": "edit"}]}
            ]
        }))
        .unwrap();

        assert_eq!(user.permission_titles(), vec!["edit", "delete", "view"]);
        assert_eq!(user.role_titles(), vec!["Admin", "Viewer"]);
    }

    #[test]
    fn missing_or_null_collections_decode_as_empty() {
        let user = User::from_value(json!({"id": 7, "name": "Dana"})).unwrap();
        assert!(user.roles.is_empty());

        let user = User::from_value(json!({
            "roles": [{"title": "Clerk", "permissions": null}]
        }))
        .unwrap();
        assert_eq!(user.roles.len(), 1);
        assert!(user.roles[0].permissions.is_empty());

        let user = User::from_value(json!({"roles": null})).unwrap();
        assert!(user.roles.is_empty());
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(User::from_value(json!([1, 2, 3])).is_err());
        assert!(User::from_value(json!("admin")).is_err());
        assert!(User::from_value(json!({"roles": "Admin"})).is_err());
        assert!(User::from_value(json!({"roles": [{"permissions": []}]})).is_err());
        assert!(User::from_value(json!({
            "roles": [{"title": "Admin", "permissions": [{"id": 1}]}]
        }))
        .is_err());
    }

    #[test]
    fn invalid_json_is_a_session_error() {
        let err = User::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, estatedesk_core::EstateError::Session { .. }));
    }

    #[test]
    fn ids_may_be_numbers_or_strings() {
        let user = User::from_value(json!({
            "id": "u-19",
            "roles": [{"id": 3, "title": "Finance", "permissions": [{"id": "p-1", "title": "invoice.view"}]}]
        }))
        .unwrap();

        assert_eq!(user.id, Some(RecordId::Text("u-19".to_string())));
        assert_eq!(user.roles[0].id, Some(RecordId::from(3)));
        assert_eq!(
            user.roles[0].permissions[0].id,
            Some(RecordId::Text("p-1".to_string()))
        );
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let user = User::from_value(json!({
            "id": 1,
            "username": "ops",
            "mobile": "555-0101",
            "roles": []
        }))
        .unwrap();

        assert_eq!(user.extra.get("mobile"), Some(&json!("555-0101")));
        assert!(!user.extra.contains_key("roles"));
    }

    #[test]
    fn constructed_roles_serialize_like_the_api() {
        let role = Role::new("Cashier", vec![Permission::new("payment.collect")]);
        let value = serde_json::to_value(&role).unwrap();

        assert_eq!(
            value,
            json!({"title": "Cashier", "permissions": [{"title": "payment.collect"}]})
        );
        assert_eq!(serde_json::from_value::<Role>(value).unwrap(), role);
    }

    #[test]
    fn odd_numeric_ids_do_not_break_decoding() {
        let user = User::from_value(json!({
            "id": 18446744073709551615u64,
            "roles": [{
                "id": 2.5,
                "title": "Admin",
                "permissions": [{"id": 1.0, "title": "edit"}, {"title": "view"}]
            }]
        }))
        .unwrap();

        assert_eq!(user.id, Some(RecordId::from(u64::MAX)));
        assert!(matches!(user.roles[0].id, Some(RecordId::Number(_))));
        assert_eq!(user.permission_titles(), vec!["edit", "view"]);
    }

    #[test]
    fn unusable_ids_read_as_missing() {
        let user = User::from_value(json!({
            "id": {"uuid": "x"},
            "roles": [{"id": true, "title": "Admin", "permissions": [{"id": [1], "title": "edit"}]}]
        }))
        .unwrap();

        assert_eq!(user.id, None);
        assert_eq!(user.roles[0].id, None);
        assert_eq!(user.roles[0].permissions[0].id, None);
        assert_eq!(user.permission_titles(), vec!["edit"]);
    }

    #[test]
    fn role_and_permission_extras_are_preserved() {
        let raw = json!({
            "title": "Admin",
            "guard_name": "web",
            "pivot": {"user_id": 1},
            "permissions": [{"title": "edit", "guard_name": "web"}]
        });
        let role: Role = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(role.extra.get("guard_name"), Some(&json!("web")));
        assert_eq!(role.permissions[0].extra.get("guard_name"), Some(&json!("web")));
        assert_eq!(serde_json::to_value(&role).unwrap(), raw);
    }

    #[test]
    fn display_string_prefers_name() {
        let user = User::from_value(json!({"id": 4, "name": "Dana", "username": "dana"})).unwrap();
        assert_eq!(user.display_string(), "Dana (#4)");

        let user = User::from_value(json!({})).unwrap();
        assert_eq!(user.display_string(), "unknown");
    }
}
