//! HTTP transport types shared by the executor and every `Transport`.
//!
//! # Design
//! Requests and responses are plain data. The executor builds an
//! `HttpRequest`, hands it to a `Transport`, and interprets the returned
//! `HttpResponse`. Keeping both sides as owned values lets tests script the
//! network without a server and lets hosts that do their own I/O reuse the
//! request-building half.

use std::fmt;

/// Header name used for the JSON content type default.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Header name carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";
/// Content type injected for every non-multipart request.
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `multipart/form-data` payload that was encoded by the caller.
///
/// The executor never touches it. Transports derive the `Content-Type`
/// (with the boundary) from it when the request headers do not set one,
/// the same way `fetch` handles a `FormData` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new(boundary: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            boundary: boundary.into(),
            bytes: bytes.into(),
        }
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Encoded body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// Stringified JSON.
    Json(String),
    Multipart(MultipartBody),
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL, or a server-relative one (`/api/...`) when the request
    /// targets the local API layer.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// `true` for statuses in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Strips a single leading slash so `/foo` and `foo` address the same route.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Layers `overrides` on top of `defaults`. A header present in both keeps
/// the override's value; names compare case-insensitively.
pub(crate) fn merge_headers(
    defaults: Vec<(String, String)>,
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .into_iter()
        .filter(|(name, _)| find_header(overrides, name).is_none())
        .collect();
    merged.extend(overrides.iter().cloned());
    merged
}
