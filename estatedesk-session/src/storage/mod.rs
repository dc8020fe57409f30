//! Persisted key-value storage
//!
//! String keys to string values, the same contract as browser local storage.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use estatedesk_core::EstateResult;

/// Key-value store holding the session record
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is not set
    fn get(&self, key: &str) -> EstateResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> EstateResult<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> EstateResult<()>;
}
