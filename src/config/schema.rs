//! Configuration schema and defaults.
//!
//! Maps directly to `~/.domo/config.toml` and `./.domo.toml`. Every field
//! has a built-in default; users only set what they want to override.

use serde::{Deserialize, Serialize};

/// Where the API lives when nothing is configured.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default per-request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomoConfig {
    pub api: ApiSection,
    pub ui: UiSection,
    pub audit: AuditSection,
}

impl DomoConfig {
    /// Annotated default config, written by `domo config init`.
    pub fn default_toml() -> &'static str {
        r#"# domo configuration
#
# Precedence (lowest to highest): built-in defaults, this file,
# ./.domo.toml in the working directory, DOMO_* environment variables.

[api]
# Base URL of the home-monitoring API.
base_url = "http://127.0.0.1:5000"
# Per-request timeout in milliseconds.
timeout_ms = 10000

[ui]
# Colored terminal output.
color = true

[audit]
# Append mutation attempts to ~/.domo/activity.jsonl.
enabled = true
"#
    }
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Base URL of the remote API.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// [ui]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Colored terminal output.
    pub color: bool,
}

impl Default for UiSection {
    fn default() -> Self {
        Self { color: true }
    }
}

// ---------------------------------------------------------------------------
// [audit]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    /// Whether mutation attempts are appended to the activity log.
    pub enabled: bool,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
