//! Client-local credential storage.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Access and refresh token issued together on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

/// Key/value store backing the credential pair.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Writes both tokens. Never writes one without the other.
pub(crate) fn save_credentials(store: &dyn TokenStore, credentials: &Credentials) {
    store.set(ACCESS_TOKEN_KEY, &credentials.access_token);
    store.set(REFRESH_TOKEN_KEY, &credentials.refresh_token);
}

/// Removes both tokens.
pub(crate) fn clear_credentials(store: &dyn TokenStore) {
    store.remove(ACCESS_TOKEN_KEY);
    store.remove(REFRESH_TOKEN_KEY);
}

/// In-process store for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// `window.localStorage`. A missing or blocked storage reads as empty and
/// drops writes.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserTokenStore;

#[cfg(target_arch = "wasm32")]
impl BrowserTokenStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenStore for BrowserTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, value).is_err() {
                tracing::warn!(key, "localStorage write rejected");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            if storage.remove_item(key).is_err() {
                tracing::warn!(key, "localStorage remove rejected");
            }
        }
    }
}
