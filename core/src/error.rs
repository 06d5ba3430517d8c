//! Error types for the request layer.
//!
//! # Design
//! `HttpError` is the closed taxonomy of upstream failures a caller is
//! expected to render: a validation failure tied to fields (422) or any
//! other non-success status. Authentication failures (401) are deliberately
//! absent: the session layer absorbs them and replaces the caller's control
//! flow with a navigation, surfaced as `RequestError::Redirected`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::navigation::Redirect;

/// Status that marks a validation failure.
pub const ENTITY_ERROR_STATUS: u16 = 422;
/// Status that triggers the logout protocol.
pub const AUTHENTICATION_ERROR_STATUS: u16 = 401;

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Body of a 422 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityErrorPayload {
    pub message: String,
    pub errors: Vec<FieldError>,
}

/// Validation failure returned with status 422.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("entity error: {}", .payload.message)]
pub struct EntityError {
    status: u16,
    payload: EntityErrorPayload,
}

impl EntityError {
    /// # Panics
    ///
    /// Panics when `status` is not 422. Building an entity error for any
    /// other status is a programming error.
    pub fn new(status: u16, payload: EntityErrorPayload) -> Self {
        assert_eq!(
            status, ENTITY_ERROR_STATUS,
            "entity error must have status {ENTITY_ERROR_STATUS}"
        );
        Self { status, payload }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn payload(&self) -> &EntityErrorPayload {
        &self.payload
    }

    /// Message attached to `field`, if the server reported one.
    pub fn field_message(&self, field: &str) -> Option<&str> {
        self.payload
            .errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

/// Non-success response from an upstream service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    /// Any non-success status other than 401 and 422.
    #[error("HTTP error {status}")]
    Generic { status: u16, payload: Value },

    #[error(transparent)]
    Entity(#[from] EntityError),
}

impl HttpError {
    pub fn status(&self) -> u16 {
        match self {
            HttpError::Generic { status, .. } => *status,
            HttpError::Entity(error) => error.status(),
        }
    }

    /// Classifies a non-success, non-401 response.
    pub(crate) fn from_response(status: u16, payload: Value) -> Self {
        if status != ENTITY_ERROR_STATUS {
            return HttpError::Generic { status, payload };
        }
        match serde_json::from_value::<EntityErrorPayload>(payload.clone()) {
            Ok(entity) => HttpError::Entity(EntityError::new(status, entity)),
            Err(err) => {
                tracing::warn!(error = %err, "422 response without field errors");
                HttpError::Generic { status, payload }
            }
        }
    }
}

/// Failure of the underlying network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network error: {0}")]
    Network(String),
}

/// Everything `HttpClient::execute` can return instead of a payload.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request body could not be serialized to JSON.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// The response body could not be decoded into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The session ended after an authentication failure and control moves
    /// to `location`. Callers propagate this; there is nothing to render.
    #[error("session ended, redirecting to {}", .0.location())]
    Redirected(Redirect),
}

impl RequestError {
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            RequestError::Http(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, RequestError::Redirected(_))
    }
}
