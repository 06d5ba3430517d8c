//! Session side effects: credential persistence on login/logout responses and
//! the logout protocol run when an upstream rejects the credentials.
//!
//! # Design
//! One `Session` stands for one logical session (a browser tab, or one
//! server-side request scope). It owns the credential store, the navigator,
//! the profile cache and the logout slot, and is shared by `Arc` between every
//! client that issues requests on its behalf.
//!
//! The logout slot is a single-flight: the first 401 claims it and runs the
//! logout; any 401 observed while it is claimed joins the running logout
//! instead of starting another one. The slot is a `Mutex` so the claim is
//! atomic on multi-threaded runtimes too, and the lock is never held across
//! an `.await`.
//!
//! The slot only keeps a weak handle; the callers awaiting the flight own it.
//! Clearing the tokens, releasing the slot and navigating live in a drop
//! guard, so they happen once the flight completes or once every caller has
//! given up on it, whichever comes first. An abandoned logout call counts as
//! a failed one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{FutureExt, WeakShared};
use serde::Deserialize;
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::RequestError;
use crate::http::{HttpRequest, AUTHORIZATION};
use crate::navigation::{Navigator, Redirect};
use crate::profile::ProfileCache;
use crate::storage::{self, Credentials, TokenStore, ACCESS_TOKEN_KEY};
use crate::transport::Transport;

#[cfg(not(target_arch = "wasm32"))]
type FlightFuture = futures::future::BoxFuture<'static, ()>;
#[cfg(target_arch = "wasm32")]
type FlightFuture = futures::future::LocalBoxFuture<'static, ()>;

struct RunningLogout {
    id: u64,
    handle: WeakShared<FlightFuture>,
}

type LogoutSlot = Arc<Mutex<Option<RunningLogout>>>;

/// Ends the session when dropped: clears both tokens, frees the slot if it
/// still belongs to this flight and navigates to the login page.
struct EndOfFlight {
    id: u64,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    slot: LogoutSlot,
    login_page: String,
}

impl Drop for EndOfFlight {
    fn drop(&mut self) {
        storage::clear_credentials(self.store.as_ref());
        {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|running| running.id == self.id) {
                slot.take();
            }
        }
        self.navigator.assign(&self.login_page);
    }
}

#[derive(Deserialize)]
struct LoginEnvelope {
    data: Credentials,
}

/// Session state shared by every request issued on behalf of one user.
pub struct Session {
    context: ExecutionContext,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    profile: ProfileCache,
    logout: LogoutSlot,
    flights: AtomicU64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("context", &self.context)
            .field("logging_out", &self.is_logging_out())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        context: ExecutionContext,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            context,
            store,
            navigator,
            profile: ProfileCache::new(),
            logout: Arc::new(Mutex::new(None)),
            flights: AtomicU64::new(0),
        }
    }

    /// Session for the detected execution context.
    pub fn detect(store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::new(ExecutionContext::detect(), store, navigator)
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn profile(&self) -> &ProfileCache {
        &self.profile
    }

    /// Stored access token. Always `None` in a server-like context.
    pub fn access_token(&self) -> Option<String> {
        if self.context.is_client() {
            self.store.get(ACCESS_TOKEN_KEY)
        } else {
            None
        }
    }

    /// `true` while a logout call is in flight.
    pub fn is_logging_out(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<RunningLogout>> {
        self.logout.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Storage effects of a successful response to `path` (normalized).
    pub(crate) fn record_success(
        &self,
        path: &str,
        payload: &Value,
        login_path: &str,
        logout_path: &str,
    ) -> Result<(), RequestError> {
        if !self.context.is_client() {
            return Ok(());
        }
        if path == login_path {
            let LoginEnvelope { data } = LoginEnvelope::deserialize(payload)
                .map_err(|err| RequestError::Decode(format!("login response: {err}")))?;
            storage::save_credentials(self.store.as_ref(), &data);
            tracing::debug!("stored credentials from login response");
        } else if path == logout_path {
            storage::clear_credentials(self.store.as_ref());
            tracing::debug!("cleared credentials after logout response");
        }
        Ok(())
    }

    /// Resolves an authentication failure of `failed`.
    ///
    /// Client-like: runs (or joins) the single logout, which calls the local
    /// logout route with `logout_request`, clears both tokens and navigates to
    /// `login_page`. Server-like: returns a redirect to `logout_page` carrying
    /// the bearer token `failed` was sent with; nothing else happens.
    pub(crate) async fn end(
        &self,
        failed: &HttpRequest,
        transport: Arc<dyn Transport>,
        logout_request: HttpRequest,
        login_page: &str,
        logout_page: &str,
    ) -> Redirect {
        if !self.context.is_client() {
            let token = failed
                .header(AUTHORIZATION)
                .and_then(|value| value.split(' ').nth(1));
            return Redirect::logout(logout_page, token);
        }

        let flight = {
            let mut slot = self.slot();
            match slot.as_ref().and_then(|running| running.handle.upgrade()) {
                Some(running) => {
                    tracing::debug!("logout already in flight, joining it");
                    running
                }
                None => {
                    let id = self.flights.fetch_add(1, Ordering::Relaxed);
                    let flight = self
                        .logout_flight(id, transport, logout_request, login_page)
                        .shared();
                    *slot = flight
                        .downgrade()
                        .map(|handle| RunningLogout { id, handle });
                    flight
                }
            }
        };
        flight.await;
        Redirect::Browser(login_page.to_string())
    }

    fn logout_flight(
        &self,
        id: u64,
        transport: Arc<dyn Transport>,
        request: HttpRequest,
        login_page: &str,
    ) -> FlightFuture {
        // Built outside the async block so it drops even if never polled.
        let end = EndOfFlight {
            id,
            store: Arc::clone(&self.store),
            navigator: Arc::clone(&self.navigator),
            slot: Arc::clone(&self.logout),
            login_page: login_page.to_string(),
        };
        let flight = async move {
            tracing::info!("authentication rejected, ending session");
            match transport.send(request).await {
                Ok(response) if !response.is_success() => {
                    tracing::warn!(status = response.status, "logout call returned an error status");
                }
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "logout call failed"),
            }
            drop(end);
        };
        #[cfg(not(target_arch = "wasm32"))]
        let flight = flight.boxed();
        #[cfg(target_arch = "wasm32")]
        let flight = flight.boxed_local();
        flight
    }
}
