//! `localStorage` implementation of the key-value bridge.
//!
//! Keys are stored verbatim unless a namespace is configured, in which case
//! they become `{namespace}::{key}` so several player instances on one origin
//! can coexist. The default player uses no namespace so its state keys stay
//! readable from devtools.

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    storage::KeyValueStore,
};

use crate::error::{dom_exception_name, js_error};

const COMPONENT: &str = "wasm storage";

fn local_storage() -> BridgeResult<web_sys::Storage> {
    let window = web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".into()))?;
    window
        .local_storage()
        .map_err(|err| js_error(COMPONENT, "localStorage", err))?
        .ok_or_else(|| BridgeError::NotAvailable("localStorage".into()))
}

/// Browser `localStorage` key-value store.
#[derive(Clone)]
pub struct LocalStorageStore {
    storage: web_sys::Storage,
    namespace: Option<String>,
}

impl LocalStorageStore {
    /// Store using bare keys on the page origin.
    pub fn new() -> BridgeResult<Self> {
        Ok(Self {
            storage: local_storage()?,
            namespace: None,
        })
    }

    /// Store whose keys are prefixed with `namespace`.
    pub fn with_namespace(namespace: impl Into<String>) -> BridgeResult<Self> {
        Ok(Self {
            storage: local_storage()?,
            namespace: Some(namespace.into()),
        })
    }

    fn scoped(&self, key: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}::{key}"),
            None => key.to_string(),
        }
    }

    fn unscoped<'a>(&self, raw: &'a str) -> Option<&'a str> {
        match &self.namespace {
            Some(ns) => raw.strip_prefix(ns.as_str())?.strip_prefix("::"),
            None => Some(raw),
        }
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> BridgeResult<Option<String>> {
        self.storage
            .get_item(&self.scoped(key))
            .map_err(|err| js_error(COMPONENT, "get_item", err))
    }

    fn set(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.storage
            .set_item(&self.scoped(key), value)
            .map_err(|err| match dom_exception_name(&err).as_deref() {
                Some("QuotaExceededError") => BridgeError::QuotaExceeded(key.to_string()),
                _ => js_error(COMPONENT, "set_item", err),
            })
    }

    fn remove(&self, key: &str) -> BridgeResult<()> {
        self.storage
            .remove_item(&self.scoped(key))
            .map_err(|err| js_error(COMPONENT, "remove_item", err))
    }

    fn keys(&self) -> BridgeResult<Vec<String>> {
        let length = self
            .storage
            .length()
            .map_err(|err| js_error(COMPONENT, "length", err))?;

        let mut keys = Vec::new();
        for index in 0..length {
            if let Some(raw) = self
                .storage
                .key(index)
                .map_err(|err| js_error(COMPONENT, "key", err))?
            {
                if let Some(key) = self.unscoped(&raw) {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }
}
