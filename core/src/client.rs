//! Request executor and the typed verb facade.
//!
//! # Design
//! `HttpClient` builds an `HttpRequest` (body encoding, default headers,
//! bearer credential, target URL), sends it through the `Transport`, and
//! dispatches on the status: 401 goes to the session's logout protocol, other
//! failures become an `HttpError`, and successes run the session's storage
//! effects before the payload is decoded for the caller.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{HttpError, RequestError, AUTHENTICATION_ERROR_STATUS};
use crate::http::{
    merge_headers, normalize_path, HttpBody, HttpMethod, HttpRequest, HttpResponse,
    MultipartBody, APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE,
};
use crate::session::Session;
use crate::transport::Transport;

/// Body supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized as JSON. `Value::Null` sends no body.
    Json(Value),
    /// Pre-encoded form data, sent as is.
    Multipart(MultipartBody),
}

impl Body {
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self, RequestError> {
        serde_json::to_value(body)
            .map(Body::Json)
            .map_err(|err| RequestError::Encode(err.to_string()))
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<Body>,
    /// Extra headers. They replace computed defaults with the same name.
    pub headers: Vec<(String, String)>,
    /// Base URL for this request. `Some("")` targets the local API layer.
    pub base_url: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that route the request through the local API layer.
    pub fn local() -> Self {
        Self::new().base_url("")
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }
}

/// Successful response: status plus decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub payload: T,
}

/// Executes requests on behalf of one `Session`.
#[derive(Clone)]
pub struct HttpClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Builds the request `execute` would send, without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, RequestError> {
        let body = match &options.body {
            Some(Body::Multipart(form)) => Some(HttpBody::Multipart(form.clone())),
            Some(Body::Json(Value::Null)) | None => None,
            Some(Body::Json(value)) => Some(HttpBody::Json(
                serde_json::to_string(value).map_err(|err| RequestError::Encode(err.to_string()))?,
            )),
        };
        let defaults = self.default_headers(matches!(body, Some(HttpBody::Multipart(_))));

        let base = options
            .base_url
            .as_deref()
            .unwrap_or(&self.config.api_endpoint);

        Ok(HttpRequest {
            method,
            url: format!("{base}/{}", normalize_path(path)),
            headers: merge_headers(defaults, &options.headers),
            body,
        })
    }

    /// Content type (unless the body is multipart) and, in a client-like
    /// context, the stored bearer credential.
    fn default_headers(&self, multipart: bool) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if !multipart {
            headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
        }
        if let Some(token) = self.session.access_token() {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
        headers
    }

    /// Sends one request and interprets the response.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, RequestError> {
        let request = self.build_request(method, path, &options)?;
        tracing::debug!(%method, url = %request.url, "sending request");

        let response = self.transport.send(request.clone()).await?;
        tracing::debug!(%method, url = %request.url, status = response.status, "received response");

        let status = response.status;
        let payload = decode_body(&response)?;

        if !response.is_success() {
            if status == AUTHENTICATION_ERROR_STATUS {
                let redirect = self
                    .session
                    .end(
                        &request,
                        Arc::clone(&self.transport),
                        self.logout_request(),
                        &self.config.login_page,
                        &self.config.logout_page,
                    )
                    .await;
                return Err(RequestError::Redirected(redirect));
            }
            return Err(HttpError::from_response(status, payload).into());
        }

        // Storage effects follow the raw payload, whatever `T` the caller asked for.
        self.session.record_success(
            normalize_path(path),
            &payload,
            &self.config.login_path,
            &self.config.logout_path,
        )?;
        let typed: T = serde_json::from_value(payload)
            .map_err(|err| RequestError::Decode(err.to_string()))?;

        Ok(ApiResponse {
            status,
            payload: typed,
        })
    }

    /// Best-effort logout call to the local API layer, with the same default
    /// headers the failed request got.
    fn logout_request(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("/{}", self.config.logout_path),
            headers: self.default_headers(false),
            body: None,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, RequestError> {
        self.execute(HttpMethod::Get, path, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, RequestError> {
        self.execute(HttpMethod::Post, path, options.body(Body::json(body)?))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, RequestError> {
        self.execute(HttpMethod::Put, path, options.body(Body::json(body)?))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, RequestError> {
        self.execute(HttpMethod::Delete, path, options).await
    }
}

/// Parses the body as JSON. An empty body reads as `null`; a non-JSON error
/// body is kept as a string so the status still reaches the caller.
fn decode_body(response: &HttpResponse) -> Result<Value, RequestError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(&response.body) {
        Ok(value) => Ok(value),
        Err(_) if !response.is_success() => Ok(Value::String(response.body.clone())),
        Err(err) => Err(RequestError::Decode(err.to_string())),
    }
}
