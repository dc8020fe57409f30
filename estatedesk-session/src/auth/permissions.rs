//! Permission queries
//!
//! Read-only authorization checks against the persisted session record.
//! Nothing is cached: every query re-reads and re-decodes the snapshot, so
//! results follow whatever the login flow last wrote.
//!
//! All queries fail closed. A missing store, a missing record, invalid JSON
//! or an unexpected shape all read as "no roles, no permissions"; none of
//! those conditions is ever reported to the caller.

use super::{Role, SessionContext, User};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Authorization queries over an injected [`SessionContext`]
#[derive(Debug, Clone)]
pub struct SessionPermissionStore {
    context: SessionContext,
}

impl SessionPermissionStore {
    /// Create a query store over a session context
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    /// Context the queries read from
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Decoded snapshot, or `None` on any failure
    pub fn current_user(&self) -> Option<User> {
        if !self.context.is_available() {
            debug!("No persisted store in this context, treating session as empty");
            return None;
        }

        match self.context.load_user() {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                debug!(key = self.context.session_key(), "No session record persisted");
                None
            }
            Err(e) => {
                warn!(
                    key = self.context.session_key(),
                    error = %e,
                    "Session record unreadable, treating as no permissions"
                );
                None
            }
        }
    }

    /// Distinct permission titles across all roles
    pub fn list_permissions(&self) -> Vec<String> {
        self.current_user()
            .map(|user| user.permission_titles())
            .unwrap_or_default()
    }

    /// Roles exactly as persisted
    pub fn list_roles(&self) -> Vec<Role> {
        self.current_user().map(|user| user.roles).unwrap_or_default()
    }

    /// Check if the session grants a permission
    pub fn has_permission(&self, title: &str) -> bool {
        self.list_permissions().iter().any(|p| p == title)
    }

    /// False for an empty `titles`
    pub fn has_any_permission<S: AsRef<str>>(&self, titles: &[S]) -> bool {
        let granted = self.list_permissions();
        let granted: HashSet<&str> = granted.iter().map(String::as_str).collect();
        titles.iter().any(|t| granted.contains(t.as_ref()))
    }

    /// True for an empty `titles`
    pub fn has_all_permissions<S: AsRef<str>>(&self, titles: &[S]) -> bool {
        let granted = self.list_permissions();
        let granted: HashSet<&str> = granted.iter().map(String::as_str).collect();
        titles.iter().all(|t| granted.contains(t.as_ref()))
    }

    /// Check if the session holds a role with exactly this title
    pub fn has_role(&self, title: &str) -> bool {
        self.list_roles().iter().any(|role| role.title == title)
    }

    /// Check if the session holds any of the given roles
    pub fn has_any_role<S: AsRef<str>>(&self, titles: &[S]) -> bool {
        let roles = self.list_roles();
        roles
            .iter()
            .any(|role| titles.iter().any(|t| t.as_ref() == role.title))
    }

    /// Create a summary string for logging
    pub fn summary(&self) -> String {
        match self.current_user() {
            Some(user) => format!(
                "SessionPermissionStore[user={}, roles={}, permissions={}]",
                user.display_string(),
                user.roles.len(),
                user.permission_titles().len()
            ),
            None => "SessionPermissionStore[user=none, roles=0, permissions=0]".to_string(),
        }
    }
}
