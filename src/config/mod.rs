//! Layered configuration.
//!
//! Precedence, lowest to highest:
//!
//! 1. Built-in defaults ([`schema::DomoConfig::default`])
//! 2. User global config — `~/.domo/config.toml`
//! 3. Project local config — `.domo.toml` in the working directory
//! 4. `DOMO_*` environment variables
//!
//! A `--api-url` flag, when given, is applied on top by the caller.
//! Malformed files are ignored rather than fatal — a broken config must
//! never make the console unusable.

pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DomoConfig;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> DomoConfig {
    let mut config = DomoConfig::default();

    if let Some(global) = read_toml(global_config_path()) {
        config = global;
    }

    if let Some(project) = read_toml(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

/// Read and parse one TOML layer. `None` when the file is absent or
/// malformed; fields the file does not set come back as defaults, which is
/// what makes whole-struct replacement a correct merge.
fn read_toml(path: Option<PathBuf>) -> Option<DomoConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".domo").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir().ok().map(|cwd| cwd.join(".domo.toml"))
}

/// Global config path, for display and `config init`.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Project config path, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Apply `DOMO_*` overrides (highest precedence layer).
///
/// - `DOMO_API_URL` — API base URL
/// - `DOMO_API_TIMEOUT_MS` — per-request timeout
/// - `DOMO_COLOR` — colored output (`1`/`true`/`yes`/`on`)
/// - `DOMO_AUDIT` — activity log toggle
fn apply_env_overrides(config: &mut DomoConfig) {
    if let Ok(val) = std::env::var("DOMO_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("DOMO_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("DOMO_COLOR") {
        config.ui.color = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("DOMO_AUDIT") {
        config.audit.enabled = is_truthy(&val);
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// init / set / reset / show
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.domo/config.toml`.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.domo/ directory")?;
    }

    fs::write(&path, DomoConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set one dotted key (e.g. `api.base_url`) in the global config file,
/// creating the file from defaults when it does not exist yet.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DomoConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value = toml::from_str(&content).context("failed to parse config")?;
    set_toml_value(&mut root, key, value)?;

    // Round-trip through the schema so a wrongly typed value fails here
    // rather than being silently ignored on the next load.
    let serialized = toml::to_string_pretty(&root).context("failed to serialize config")?;
    let _: DomoConfig = toml::from_str(&serialized).context("resulting config is invalid")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, serialized).context("failed to write config file")?;

    Ok(())
}

/// Update one dotted key in a TOML tree. The new value's type is inferred:
/// bool, then integer, then float, then string.
fn set_toml_value(root: &mut toml::Value, key: &str, raw: &str) -> Result<()> {
    let (section, leaf) = key
        .split_once('.')
        .with_context(|| format!("expected a dotted key like `api.base_url`, got '{key}'"))?;

    let table = root
        .get_mut(section)
        .with_context(|| format!("unknown config section '{section}'"))?
        .as_table_mut()
        .with_context(|| format!("'{section}' is not a table"))?;

    let parsed = if let Ok(b) = raw.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(n) = raw.parse::<i64>() {
        toml::Value::Integer(n)
    } else if let Ok(f) = raw.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(raw.to_string())
    };

    table.insert(leaf.to_string(), parsed);
    Ok(())
}

/// Overwrite the global config with the annotated defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
