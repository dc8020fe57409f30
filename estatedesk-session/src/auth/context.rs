//! Session Context
//!
//! Explicit handle to the persisted session record. Built once per process
//! and handed to whatever needs to read or write the session, instead of
//! reaching for the store ambiently.

use super::User;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use estatedesk_core::{
    config_error, storage_error, EstateResult, SessionConfig, StorageBackend, DEFAULT_SESSION_KEY,
};
use std::sync::Arc;

/// Injected handle to the store and key holding the session record
#[derive(Clone)]
pub struct SessionContext {
    /// `None` where no persisted store exists (headless or server-side rendering)
    store: Option<Arc<dyn KeyValueStore>>,
    session_key: String,
}

impl SessionContext {
    /// Create a context over a store and session key
    pub fn new(store: Arc<dyn KeyValueStore>, session_key: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            session_key: session_key.into(),
        }
    }

    /// Context without a store; reads see no session and writes fail
    pub fn detached(session_key: impl Into<String>) -> Self {
        Self {
            store: None,
            session_key: session_key.into(),
        }
    }

    /// Fresh in-memory store under the default key
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), DEFAULT_SESSION_KEY)
    }

    /// Create a context from the `[session]` configuration section
    pub fn from_config(config: &SessionConfig) -> EstateResult<Self> {
        let store: Arc<dyn KeyValueStore> = match config.storage {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => {
                let path = config.storage_path.as_ref().ok_or_else(|| {
                    config_error!("File storage requires session.storage_path", "session_context")
                })?;
                Arc::new(FileStore::new(path))
            }
        };

        Ok(Self::new(store, config.session_key.clone()))
    }

    /// Check if a persisted store is attached
    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Key the session record lives under
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Raw serialized record, `None` when absent or when no store is attached
    pub fn read_raw(&self) -> EstateResult<Option<String>> {
        match &self.store {
            Some(store) => store.get(&self.session_key),
            None => Ok(None),
        }
    }

    /// Decoded session user, `None` when no record is persisted
    pub fn load_user(&self) -> EstateResult<Option<User>> {
        self.read_raw()?
            .map(|raw| User::from_json_str(&raw))
            .transpose()
    }

    pub(crate) fn write_raw(&self, value: &str) -> EstateResult<()> {
        self.attached_store()?.set(&self.session_key, value)
    }

    pub(crate) fn clear(&self) -> EstateResult<()> {
        self.attached_store()?.remove(&self.session_key)
    }

    fn attached_store(&self) -> EstateResult<&Arc<dyn KeyValueStore>> {
        self.store.as_ref().ok_or_else(|| {
            storage_error!(
                "No persisted store is available in this context",
                "session_context"
            )
        })
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_key", &self.session_key)
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_context_reads_nothing_and_rejects_writes() {
        let context = SessionContext::detached("user");
        assert!(!context.is_available());
        assert_eq!(context.read_raw().unwrap(), None);
        assert!(context.load_user().unwrap().is_none());
        assert!(context.write_raw("{}").is_err());
        assert!(context.clear().is_err());
    }

    #[test]
    fn load_user_decodes_the_record() {
        let store = Arc::new(MemoryStore::with_entries([(
            "user",
            r#"{"roles":[{"title":"Admin","permissions":[]}]}"#,
        )]));
        let context = SessionContext::new(store, "user");

        let user = context.load_user().unwrap().unwrap();
        assert_eq!(user.role_titles(), vec!["Admin"]);
    }

    #[test]
    fn load_user_surfaces_decode_errors() {
        let store = Arc::new(MemoryStore::with_entries([("user", "{oops")]));
        let context = SessionContext::new(store, "user");
        assert!(context.load_user().is_err());
    }

    #[test]
    fn from_config_honours_key_and_backend() {
        let config = SessionConfig {
            storage: StorageBackend::Memory,
            storage_path: None,
            session_key: "adminUser".to_string(),
        };

        let context = SessionContext::from_config(&config).unwrap();
        assert!(context.is_available());
        assert_eq!(context.session_key(), "adminUser");

        let config = SessionConfig {
            storage: StorageBackend::File,
            storage_path: None,
            session_key: "user".to_string(),
        };
        assert!(SessionContext::from_config(&config).is_err());
    }
}
