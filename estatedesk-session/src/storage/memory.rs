use super::KeyValueStore;
use estatedesk_core::{storage_error, EstateResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process store, nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> EstateResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| storage_error!("Memory store lock poisoned", "memory_store"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> EstateResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| storage_error!("Memory store lock poisoned", "memory_store"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> EstateResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| storage_error!("Memory store lock poisoned", "memory_store"))?;
        entries.remove(key);
        Ok(())
    }
}
