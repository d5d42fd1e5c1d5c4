//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.perch/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::widgets::composer::{
    ComposerSettings, DEFAULT_CHAR_LIMIT, DEFAULT_GROW_PADDING, EnterPolicy,
};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PerchConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SiteConfig {
    pub base_url: Option<String>,
    pub path: Option<String>,
    pub session_cookie: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ComposerConfig {
    pub char_limit: Option<usize>,
    pub grow_padding: Option<u16>,
    pub strip_non_ascii: Option<bool>,
    pub enter: Option<EnterPolicy>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PATH: &str = "/feed";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub path: String,
    pub session_cookie: Option<String>,
    pub request_timeout: Duration,
    pub composer: ComposerSettings,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.perch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".perch").join("config.toml"))
}

/// Load config from `~/.perch/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `PerchConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<PerchConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(PerchConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(PerchConfig::default());
    }

    load_config_from(&path)
}

/// Load and parse a config file at an explicit path.
pub fn load_config_from(path: &Path) -> Result<PerchConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: PerchConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Perch Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [site]
# base_url = "http://localhost:8000"   # Or set PERCH_BASE_URL
# path = "/feed"                       # Page whose list is shown; or PERCH_PATH
# session_cookie = "session=..."       # Forwarded as-is; or PERCH_SESSION_COOKIE

# [http]
# timeout_secs = 10

# [composer]
# char_limit = 480
# grow_padding = 0                     # Rows subtracted from the content height
# strip_non_ascii = false              # Fold to ASCII and drop everything else
# enter = "submit-unless-shift"        # Or "submit"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_base_url` and `cli_path` are from CLI flags (None = not specified).
pub fn resolve(
    config: &PerchConfig,
    cli_base_url: Option<&str>,
    cli_path: Option<&str>,
) -> ResolvedConfig {
    resolve_with_env(config, cli_base_url, cli_path, |key| std::env::var(key).ok())
}

/// [`resolve`] with environment lookups going through `env`.
pub fn resolve_with_env(
    config: &PerchConfig,
    cli_base_url: Option<&str>,
    cli_path: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli_base_url
        .map(|s| s.to_string())
        .or_else(|| env("PERCH_BASE_URL"))
        .or_else(|| config.site.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Path: CLI → env → config → default
    let path = cli_path
        .map(|s| s.to_string())
        .or_else(|| env("PERCH_PATH"))
        .or_else(|| config.site.path.clone())
        .unwrap_or_else(|| DEFAULT_PATH.to_string());

    // Session cookie: env → config
    let session_cookie = env("PERCH_SESSION_COOKIE")
        .or_else(|| config.site.session_cookie.clone())
        .filter(|c| !c.trim().is_empty());

    let timeout_secs = config.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1);

    ResolvedConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        path: normalize_path(&path),
        session_cookie,
        request_timeout: Duration::from_secs(timeout_secs),
        composer: ComposerSettings {
            char_limit: config.composer.char_limit.unwrap_or(DEFAULT_CHAR_LIMIT),
            grow_padding: config.composer.grow_padding.unwrap_or(DEFAULT_GROW_PADDING),
            strip_non_ascii: config.composer.strip_non_ascii.unwrap_or(false),
            enter: config.composer.enter.unwrap_or_default(),
        },
    }
}

/// Page paths are always absolute.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
