//! Session Manager - login persistence and logout

use crate::auth::{SessionContext, SessionPermissionStore, User};
use estatedesk_core::{validation_error, EstateError, EstateResult, ErrorContext};
use serde_json::Value;
use tracing::{debug, info};

/// Owns the write side of the session record
#[derive(Debug, Clone)]
pub struct SessionManager {
    context: SessionContext,
}

impl SessionManager {
    /// Create a manager over a session context
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    /// Context the session is written to
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Query side over the same context
    pub fn permissions(&self) -> SessionPermissionStore {
        SessionPermissionStore::new(self.context.clone())
    }

    /// Persist the user from a successful login response
    ///
    /// The API answers either with the user object itself or with an
    /// envelope `{"data": {...}}`; an object-valued `data` wins. The chosen
    /// object is stored verbatim, replacing any previous session, but only
    /// after it decodes as a [`User`]. Nothing is written on failure.
    pub fn record_login(&self, payload: Value) -> EstateResult<User> {
        let snapshot = select_snapshot(payload)?;
        let user = User::from_value(snapshot.clone())?;

        let serialized = serde_json::to_string(&snapshot)?;
        self.context.write_raw(&serialized)?;

        info!(
            user = %user.display_string(),
            roles = user.roles.len(),
            permissions = user.permission_titles().len(),
            "Session recorded"
        );
        Ok(user)
    }

    /// Same as [`record_login`](Self::record_login) for a raw response body
    pub fn record_login_str(&self, body: &str) -> EstateResult<User> {
        let payload: Value = serde_json::from_str(body).map_err(|e| EstateError::Validation {
            message: format!("Login response is not valid JSON: {}", e),
            field: None,
            context: ErrorContext::new("session_manager")
                .with_operation("record_login")
                .with_suggestion("Pass the unmodified login response body"),
        })?;
        self.record_login(payload)
    }

    /// Remove the session record; logging out twice is fine
    pub fn logout(&self) -> EstateResult<()> {
        self.context.clear()?;
        info!(key = self.context.session_key(), "Session cleared");
        Ok(())
    }

    /// A decodable session record is present
    pub fn is_logged_in(&self) -> bool {
        matches!(self.context.load_user(), Ok(Some(_)))
    }
}

fn select_snapshot(payload: Value) -> EstateResult<Value> {
    match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Object(_)) => {
                debug!("Using `data` envelope of login response");
                Ok(data)
            }
            Some(other) => {
                map.insert("data".to_string(), other);
                Ok(Value::Object(map))
            }
            None => Ok(Value::Object(map)),
        },
        _ => Err(validation_error!(
            "Login response must be a JSON object",
            "payload",
            "session_manager"
        )),
    }
}
