//! Login and logout requests.
//!
//! `server_*` calls go straight to the remote backend (used by the local
//! login route handler); `client_*` calls go through the local API layer so
//! the credential pair lands in client-local storage.

use serde::{Deserialize, Serialize};

use crate::client::{ApiResponse, HttpClient, RequestOptions};
use crate::error::RequestError;
use crate::http::AUTHORIZATION;
use crate::profile::Account;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub account: Option<Account>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRes {
    pub message: String,
    pub data: LoginData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutBody {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRes {
    pub message: String,
}

pub async fn server_login(
    client: &HttpClient,
    body: &LoginBody,
) -> Result<ApiResponse<LoginRes>, RequestError> {
    client.post("/auth/login", body, RequestOptions::new()).await
}

pub async fn client_login(
    client: &HttpClient,
    body: &LoginBody,
) -> Result<ApiResponse<LoginRes>, RequestError> {
    client.post("/api/auth/login", body, RequestOptions::local()).await
}

/// Revokes the refresh token on the backend, authenticated with
/// `access_token` rather than anything in local storage.
pub async fn server_logout(
    client: &HttpClient,
    body: &LogoutBody,
    access_token: &str,
) -> Result<ApiResponse<MessageRes>, RequestError> {
    let options = RequestOptions::new().header(AUTHORIZATION, format!("Bearer {access_token}"));
    client.post("/auth/logout", body, options).await
}

pub async fn client_logout(client: &HttpClient) -> Result<ApiResponse<MessageRes>, RequestError> {
    client
        .post("/api/auth/logout", &serde_json::Value::Null, RequestOptions::local())
        .await
}
