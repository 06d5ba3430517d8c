//! In-memory stand-in for the two upstreams of the request layer: the remote
//! backend (`/auth/*`, `/accounts/*`, `/dashboard/*`) and the same-origin API
//! layer (`/api/auth/*`) that relays logins and manages auth cookies.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

mod api_routes;
mod backend;

/// Account as the backend returns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug)]
struct StoredAccount {
    account: Account,
    password: String,
}

#[derive(Default)]
struct Store {
    accounts: Vec<StoredAccount>,
    /// access token -> account id
    access_tokens: HashMap<String, u64>,
    /// refresh token -> account id
    refresh_tokens: HashMap<String, u64>,
}

impl Store {
    fn account_for(&self, access_token: &str) -> Option<&Account> {
        let id = self.access_tokens.get(access_token)?;
        self.accounts
            .iter()
            .map(|stored| &stored.account)
            .find(|account| account.id == *id)
    }
}

/// Shared server state. Cloning shares the same accounts and sessions.
#[derive(Clone, Default)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    local_logouts: Arc<AtomicUsize>,
}

pub const OWNER_EMAIL: &str = "owner@example.com";
pub const EMPLOYEE_EMAIL: &str = "staff@example.com";
pub const SEED_PASSWORD: &str = "123456";

impl AppState {
    /// State with one owner and one employee, both using `SEED_PASSWORD`.
    pub fn seeded() -> Self {
        let accounts = vec![
            StoredAccount {
                account: Account {
                    id: 1,
                    name: "Owner".to_string(),
                    email: OWNER_EMAIL.to_string(),
                    role: "Owner".to_string(),
                    avatar: None,
                },
                password: SEED_PASSWORD.to_string(),
            },
            StoredAccount {
                account: Account {
                    id: 2,
                    name: "Staff".to_string(),
                    email: EMPLOYEE_EMAIL.to_string(),
                    role: "Employee".to_string(),
                    avatar: None,
                },
                password: SEED_PASSWORD.to_string(),
            },
        ];
        Self {
            store: Arc::new(RwLock::new(Store {
                accounts,
                ..Store::default()
            })),
            local_logouts: Arc::default(),
        }
    }

    /// Number of calls the local logout route has received.
    pub fn local_logout_calls(&self) -> usize {
        self.local_logouts.load(Ordering::SeqCst)
    }

    /// Revokes every access token, as if they all expired.
    pub async fn expire_access_tokens(&self) {
        self.store.write().await.access_tokens.clear();
    }

    /// Number of access tokens currently accepted.
    pub async fn active_sessions(&self) -> usize {
        self.store.read().await.access_tokens.len()
    }

    async fn issue_tokens(&self, account_id: u64) -> (String, String) {
        let access_token = format!("at-{}", Uuid::new_v4());
        let refresh_token = format!("rt-{}", Uuid::new_v4());
        let mut store = self.store.write().await;
        store.access_tokens.insert(access_token.clone(), account_id);
        store.refresh_tokens.insert(refresh_token.clone(), account_id);
        (access_token, refresh_token)
    }
}

pub fn app() -> Router {
    app_with_state(AppState::seeded())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(backend::login))
        .route("/auth/logout", post(backend::logout))
        .route("/accounts/me", get(backend::me))
        .route("/dashboard/admin", get(backend::admin_dashboard))
        .route("/api/auth/login", post(api_routes::login))
        .route("/api/auth/logout", post(api_routes::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::seeded()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}
