//! Profile of the signed-in account.

use serde::{Deserialize, Serialize};

use crate::client::{ApiResponse, HttpClient, RequestOptions};
use crate::error::RequestError;
use crate::profile::Account;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRes {
    pub message: String,
    pub data: Account,
}

pub async fn me(client: &HttpClient) -> Result<ApiResponse<AccountRes>, RequestError> {
    client.get("/accounts/me", RequestOptions::new()).await
}

/// Fetches the profile and stores it in the session's profile cache.
pub async fn fetch_profile(client: &HttpClient) -> Result<Account, RequestError> {
    let ApiResponse { payload, .. } = me(client).await?;
    client.session().profile().set(Some(payload.data.clone()));
    Ok(payload.data)
}
