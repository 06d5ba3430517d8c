//! Detects whether the crate runs inside a browser tab or on a server.

use std::sync::OnceLock;

/// Where requests are issued from. Decides whether credentials live in
/// client-local storage and how an authentication failure is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Browser-like: local storage and full-page navigation are available.
    Client,
    /// Server-like: no local storage, failures become redirect instructions.
    Server,
}

impl ExecutionContext {
    /// Context of the current process. Evaluated once and cached.
    pub fn detect() -> Self {
        static DETECTED: OnceLock<ExecutionContext> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            if has_window() {
                ExecutionContext::Client
            } else {
                ExecutionContext::Server
            }
        })
    }

    pub fn is_client(self) -> bool {
        self == ExecutionContext::Client
    }
}

/// Shorthand for `ExecutionContext::detect().is_client()`.
pub fn is_client_context() -> bool {
    ExecutionContext::detect().is_client()
}

#[cfg(target_arch = "wasm32")]
fn has_window() -> bool {
    web_sys::window().is_some()
}

#[cfg(not(target_arch = "wasm32"))]
fn has_window() -> bool {
    false
}
