//! Key-Value Storage Abstraction
//!
//! The player persists its resumable state as JSON-encoded strings under a
//! handful of well-known keys. Hosts back this with whatever durable,
//! per-origin store they have:
//! - Web: `window.localStorage`
//! - Desktop: a JSON file in the user's data directory
//! - Tests: [`MemoryKeyValueStore`]
//!
//! Every write replaces the whole value stored under a key. Implementations
//! must never expose a partially written value to a subsequent `get`.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::{error::Result, platform::PlatformSendSync};

/// String-valued key-value store trait
///
/// Mirrors the browser `Storage` interface: synchronous, string in and
/// string out. Encoding is the caller's concern.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// fn remember_volume(store: &dyn KeyValueStore, volume: f64) -> Result<()> {
///     store.set("playerVolume", &volume.to_string())
/// }
/// ```
pub trait KeyValueStore: PlatformSendSync {
    /// Retrieve the value stored under `key`
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// List all keys currently stored
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-process store used by tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing entries, e.g. to simulate a page reload.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Copy of every entry, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}
