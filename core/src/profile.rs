//! Profile of the signed-in account, held for the lifetime of a session.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Account returned by the backend's profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Holder for the current profile. Calling code sets it after fetching the
/// profile; UI code reads it. No validation is done on either side.
#[derive(Debug, Default)]
pub struct ProfileCache {
    current: RwLock<Option<Account>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Account> {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// `None` is a valid value and clears the profile.
    pub fn set(&self, account: Option<Account>) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = account;
    }
}
