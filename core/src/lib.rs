//! Session-aware HTTP request layer.
//!
//! # Overview
//! Every call from a browser-executed client to the same-origin API layer or
//! the remote backend goes through `HttpClient`. It attaches the stored bearer
//! credential, classifies failures, keeps the credential pair in client-local
//! storage in step with login/logout responses, and ends the session exactly
//! once when an upstream rejects the credentials.
//!
//! # Design
//! - `HttpRequest` / `HttpResponse` are plain data; the network sits behind
//!   the `Transport` trait so tests can script it.
//! - A `Session` object replaces process-wide globals: it holds the credential
//!   store, navigator, profile cache and the single-flight logout slot.
//! - `HttpError` is closed (generic or entity). A 401 never becomes an
//!   `HttpError`; it ends the session and yields `RequestError::Redirected`.

pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod navigation;
pub mod profile;
pub mod session;
pub mod storage;
pub mod transport;

pub use client::{ApiResponse, Body, HttpClient, RequestOptions};
pub use config::ClientConfig;
pub use context::{is_client_context, ExecutionContext};
pub use error::{EntityError, EntityErrorPayload, FieldError, HttpError, RequestError, TransportError};
pub use http::{normalize_path, HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartBody};
pub use navigation::{MemoryNavigator, Navigator, Redirect};
pub use profile::{Account, ProfileCache};
pub use session::Session;
pub use storage::{Credentials, MemoryTokenStore, TokenStore};
pub use transport::Transport;

#[cfg(not(target_arch = "wasm32"))]
pub use transport::ReqwestTransport;

#[cfg(target_arch = "wasm32")]
pub use navigation::BrowserNavigator;
#[cfg(target_arch = "wasm32")]
pub use storage::BrowserTokenStore;
