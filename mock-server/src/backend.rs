//! Remote backend routes.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{Account, AppState};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogoutBody {
    refresh_token: Option<String>,
}

/// Outcome of a login attempt, shared with the local login route.
pub(crate) type LoginOutcome = Result<Value, (StatusCode, Value)>;

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn entity_error(errors: Vec<(&str, &str)>) -> (StatusCode, Value) {
    let errors: Vec<Value> = errors
        .into_iter()
        .map(|(field, message)| json!({ "field": field, "message": message }))
        .collect();
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "message": "Validation failed", "errors": errors }),
    )
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Access token is missing or expired" })),
    )
        .into_response()
}

pub(crate) async fn authenticate(state: &AppState, body: &LoginBody) -> LoginOutcome {
    let mut invalid = Vec::new();
    if !body.email.contains('@') {
        invalid.push(("email", "Email is invalid"));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        invalid.push(("password", "Password must be at least 6 characters"));
    }
    if !invalid.is_empty() {
        return Err(entity_error(invalid));
    }

    let account = {
        let store = state.store.read().await;
        store
            .accounts
            .iter()
            .find(|stored| stored.account.email == body.email && stored.password == body.password)
            .map(|stored| stored.account.clone())
    };
    let Some(account) = account else {
        return Err(entity_error(vec![("email", "Email or password is incorrect")]));
    };

    let (access_token, refresh_token) = state.issue_tokens(account.id).await;
    tracing::info!(account_id = account.id, "issued tokens");
    Ok(json!({
        "message": "Login successful",
        "data": {
            "accessToken": access_token,
            "refreshToken": refresh_token,
            "account": account,
        }
    }))
}

pub(crate) async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    match authenticate(&state, &body).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err((status, payload)) => (status, Json(payload)).into_response(),
    }
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LogoutBody>,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized();
    };
    let mut store = state.store.write().await;
    if store.access_tokens.remove(token).is_none() {
        return unauthorized();
    }
    if let Some(refresh_token) = body.refresh_token {
        store.refresh_tokens.remove(&refresh_token);
    }
    (StatusCode::OK, Json(json!({ "message": "Logged out" }))).into_response()
}

async fn current_account(state: &AppState, headers: &HeaderMap) -> Option<Account> {
    let token = bearer_token(headers)?;
    state.store.read().await.account_for(token).cloned()
}

pub(crate) async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_account(&state, &headers).await {
        Some(account) => (
            StatusCode::OK,
            Json(json!({ "message": "Account fetched", "data": account })),
        )
            .into_response(),
        None => unauthorized(),
    }
}

pub(crate) async fn admin_dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(account) = current_account(&state, &headers).await else {
        return unauthorized();
    };
    if account.role != "Owner" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "Only owners can open the dashboard" })),
        )
            .into_response();
    }
    (
        StatusCode::OK,
        Json(json!({ "message": "Dashboard", "data": { "accounts": 2 } })),
    )
        .into_response()
}
