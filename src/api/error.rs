//! Error taxonomy for API calls.
//!
//! Three terminal classes, mirrored by how the controllers react:
//!
//! - [`ApiError::Rejected`] — the server answered and said no; its message is
//!   surfaced to the user verbatim and nothing is reloaded.
//! - [`ApiError::Transport`] — the request never produced a usable response;
//!   the user gets a generic notice and the detail goes to the log.
//! - [`ApiError::Malformed`] — an HTTP response arrived but its body was not
//!   the JSON the contract promises; treated like a transport failure.
//!
//! Client-side validation failures never reach this module — they are caught
//! before any network call is made.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx status with a structured `{error}` body (or a synthesized
    /// message when the body carries none).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Network-level failure: unreachable host, timeout, broken connection.
    #[error("could not reach the API: {detail}")]
    Transport { detail: String },

    /// Response body did not parse as the expected JSON shape.
    #[error("unexpected response from the API: {detail}")]
    Malformed { detail: String },
}

impl ApiError {
    /// True for application-level rejections, whose message is meant for the
    /// user as-is.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}
