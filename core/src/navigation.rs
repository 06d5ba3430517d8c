//! Navigation after the session ends.
//!
//! In a client-like context the layer performs the navigation itself through a
//! `Navigator`. In a server-like context it can only hand a `Redirect` back to
//! the host framework, which turns it into a redirect response.

use std::sync::Mutex;

use url::form_urlencoded;

/// Where control goes after an authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Full-page navigation already issued through the session's `Navigator`.
    Browser(String),
    /// Redirect instruction for the host to answer the incoming request with.
    Server(String),
}

impl Redirect {
    pub fn location(&self) -> &str {
        match self {
            Redirect::Browser(location) | Redirect::Server(location) => location,
        }
    }

    /// Server-side redirect to the logout page, carrying the access token the
    /// failed request was sent with.
    pub(crate) fn logout(logout_page: &str, access_token: Option<&str>) -> Self {
        let location = match access_token {
            Some(token) => {
                let encoded: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
                format!("{logout_page}?accessToken={encoded}")
            }
            None => logout_page.to_string(),
        };
        Redirect::Server(location)
    }
}

/// Imperative full-page navigation.
pub trait Navigator: Send + Sync {
    fn assign(&self, location: &str);
}

/// Records every navigation instead of performing it. Used on hosts without
/// a browser and in tests.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    visited: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visited().pop()
    }
}

impl Navigator for MemoryNavigator {
    fn assign(&self, location: &str) {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(location.to_string());
    }
}

/// Sets `window.location.href`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

#[cfg(target_arch = "wasm32")]
impl Navigator for BrowserNavigator {
    fn assign(&self, location: &str) {
        let Some(window) = web_sys::window() else {
            tracing::error!("no window to navigate");
            return;
        };
        if window.location().set_href(location).is_err() {
            tracing::error!(location, "navigation failed");
        }
    }
}
