//! Same-origin API layer: relays logins to the backend logic and keeps the
//! credential pair in `HttpOnly` cookies.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::atomic::Ordering;

use crate::backend::{authenticate, bearer_token, LoginBody};
use crate::AppState;

const ACCESS_TOKEN_MAX_AGE: u64 = 60 * 60;
const REFRESH_TOKEN_MAX_AGE: u64 = 7 * 24 * 60 * 60;

fn cookie(name: &str, value: &str, max_age: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{name}={value}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={max_age}"
    ))
    .ok()
}

pub(crate) async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    let payload = match authenticate(&state, &body).await {
        Ok(payload) => payload,
        Err((status, payload)) => return (status, Json(payload)).into_response(),
    };

    let mut headers = HeaderMap::new();
    let data = &payload["data"];
    for (name, max_age) in [
        ("accessToken", ACCESS_TOKEN_MAX_AGE),
        ("refreshToken", REFRESH_TOKEN_MAX_AGE),
    ] {
        if let Some(value) = data[name].as_str().and_then(|token| cookie(name, token, max_age)) {
            headers.append(SET_COOKIE, value);
        }
    }
    (StatusCode::OK, headers, Json(payload)).into_response()
}

/// Always succeeds, whether or not the caller still had a session.
pub(crate) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.local_logouts.fetch_add(1, Ordering::SeqCst);
    if let Some(token) = bearer_token(&headers) {
        state.store.write().await.access_tokens.remove(token);
    }

    let mut response_headers = HeaderMap::new();
    for name in ["accessToken", "refreshToken"] {
        if let Some(value) = cookie(name, "", 0) {
            response_headers.append(SET_COOKIE, value);
        }
    }
    tracing::info!("cleared auth cookies");
    (
        StatusCode::OK,
        response_headers,
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}
