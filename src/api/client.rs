//! Synchronous HTTP client for the home-monitoring API.
//!
//! Built on `ureq`, one request per call, with the timeout taken from the
//! resolved configuration. A client is cheap to construct and is created
//! fresh for each command invocation — no connection state is cached.

use std::time::Duration;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::config::DomoConfig;
use crate::model::{AggregateRow, Record};

use super::error::ApiError;

/// Timeout for the reachability probe, kept short so `domo health` does not
/// stall when the server is down.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Confirmation surfaced when an accepted mutation carries no `{message}`.
const DEFAULT_CONFIRMATION: &str = "OK";

// ---------------------------------------------------------------------------
// Wire bodies for mutation responses
// ---------------------------------------------------------------------------

/// Body of an accepted mutation: `{"message": "..."}`.
#[derive(Debug, Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Body of a rejected request: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One remote API, addressed by base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Build a client from the resolved config.
    pub fn from_config(config: &DomoConfig) -> Self {
        Self::new(&config.api.base_url, config.api.timeout_ms)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Fetch the full collection view for a record kind.
    ///
    /// Ordering is server-defined (most-recent-N) and opaque to the client —
    /// records are returned exactly as received, never sorted or filtered.
    pub fn list<R: Record>(&self) -> Result<Vec<R>, ApiError> {
        let url = self.url(R::ENDPOINT);
        debug!("GET {url}");
        let resp = ureq::get(&url)
            .timeout(self.timeout)
            .call()
            .map_err(classify)?;
        resp.into_json::<Vec<R>>().map_err(|e| ApiError::Malformed {
            detail: format!("{url}: {e}"),
        })
    }

    /// POST a creation draft and return the server's confirmation message.
    pub fn create(&self, endpoint: &str, draft: &Value) -> Result<String, ApiError> {
        let url = self.url(endpoint);
        debug!("POST {url}");
        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .send_json(draft)
            .map_err(classify)?;
        confirmation(resp, &url)
    }

    /// DELETE one record by id and return the server's confirmation message.
    pub fn delete(&self, endpoint: &str, id: &str) -> Result<String, ApiError> {
        let url = format!("{}/{id}", self.url(endpoint));
        debug!("DELETE {url}");
        let resp = ureq::delete(&url)
            .timeout(self.timeout)
            .call()
            .map_err(classify)?;
        confirmation(resp, &url)
    }

    /// Fetch aggregate rows from a reporting endpoint, with optional query
    /// parameters (e.g. `scale=Mensuel`).
    pub fn aggregates(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<AggregateRow>, ApiError> {
        let url = self.url(endpoint);
        debug!("GET {url} {query:?}");
        let mut req = ureq::get(&url).timeout(self.timeout);
        for &(name, value) in query {
            req = req.query(name, value);
        }
        let resp = req.call().map_err(classify)?;
        resp.into_json::<Vec<AggregateRow>>()
            .map_err(|e| ApiError::Malformed {
                detail: format!("{url}: {e}"),
            })
    }

    /// Check whether the API answers at all. Hits the sensors collection —
    /// the cheapest documented GET — with a short timeout.
    pub fn is_reachable(&self) -> bool {
        ureq::get(&self.url("/api/capteurs"))
            .timeout(PROBE_TIMEOUT)
            .call()
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Map a `ureq` failure onto the error taxonomy. Non-2xx responses become
/// [`ApiError::Rejected`] with the server's `{error}` message when one is
/// present; everything else is transport-level.
fn classify(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, resp) => {
            let message = resp
                .into_json::<ErrorBody>()
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("request failed (HTTP {status})"));
            ApiError::Rejected { status, message }
        }
        other => ApiError::Transport {
            detail: other.to_string(),
        },
    }
}

/// Extract the `{message}` confirmation from an accepted mutation response.
fn confirmation(resp: ureq::Response, url: &str) -> Result<String, ApiError> {
    let body: MessageBody = resp.into_json().map_err(|e| ApiError::Malformed {
        detail: format!("{url}: {e}"),
    })?;
    Ok(body
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIRMATION.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
