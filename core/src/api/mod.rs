//! Typed requests against the backend and the local API layer.

pub mod account;
pub mod auth;
