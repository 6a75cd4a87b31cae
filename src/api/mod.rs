//! HTTP client layer for the remote home-monitoring API.
//!
//! The API is an external collaborator: routes, persistence and validation
//! live on the server. This module only speaks the wire contract — JSON
//! collections on GET, `{message}` bodies on accepted mutations, `{error}`
//! bodies on rejected ones — and classifies every failure into the taxonomy
//! the controllers branch on ([`ApiError`]).

mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;
