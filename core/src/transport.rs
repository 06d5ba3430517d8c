//! The network call behind every request.
//!
//! The executor depends only on `Transport`: method, URL, headers and body in,
//! status and body out. `ReqwestTransport` is the native implementation.
//! On wasm32 the trait drops its `Send` bounds, since fetch futures hold
//! `JsValue`s; implement it there with `#[async_trait(?Send)]`.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the round-trip. Non-success statuses are data, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
pub trait Transport {
    /// Performs the round-trip. Non-success statuses are data, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use self::native::ReqwestTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use async_trait::async_trait;
    use url::Url;

    use crate::error::TransportError;
    use crate::http::{HttpBody, HttpRequest, HttpResponse, CONTENT_TYPE};

    use super::Transport;

    /// `reqwest`-backed transport. Server-relative URLs resolve against
    /// `origin`, which stands in for the page origin a browser would use.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
        origin: Url,
    }

    impl ReqwestTransport {
        pub fn new(origin: &str) -> Result<Self, TransportError> {
            Ok(Self::with_client(reqwest::Client::new(), parse(origin)?))
        }

        pub fn with_client(client: reqwest::Client, origin: Url) -> Self {
            Self { client, origin }
        }

        fn resolve(&self, url: &str) -> Result<Url, TransportError> {
            if url.starts_with('/') {
                self.origin.join(url).map_err(|err| TransportError::InvalidUrl {
                    url: url.to_string(),
                    reason: err.to_string(),
                })
            } else {
                parse(url)
            }
        }
    }

    fn parse(url: &str) -> Result<Url, TransportError> {
        Url::parse(url).map_err(|err| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }

    fn method(method: crate::http::HttpMethod) -> reqwest::Method {
        match method {
            crate::http::HttpMethod::Get => reqwest::Method::GET,
            crate::http::HttpMethod::Post => reqwest::Method::POST,
            crate::http::HttpMethod::Put => reqwest::Method::PUT,
            crate::http::HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = self.resolve(&request.url)?;
            let has_content_type = request.header(CONTENT_TYPE).is_some();

            let mut builder = self.client.request(method(request.method), url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder = match request.body {
                Some(HttpBody::Json(json)) => builder.body(json),
                Some(HttpBody::Multipart(form)) => {
                    if !has_content_type {
                        builder = builder.header(CONTENT_TYPE, form.content_type());
                    }
                    builder.body(form.bytes)
                }
                None => builder,
            };

            let response = builder
                .send()
                .await
                .map_err(|err| TransportError::Network(err.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|err| TransportError::Network(err.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

}
