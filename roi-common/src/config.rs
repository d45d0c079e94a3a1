//! Configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument
//! 2. Environment variable (`ROI_PREDICTOR_URL`, `ROI_PORT`)
//! 3. TOML config file (`ROI_CONFIG`, else `<config_dir>/roi-dashboard/config.toml`)
//! 4. Compiled default
//!
//! A missing or unreadable TOML file never aborts startup: the loader logs a
//! warning and every key falls through to its default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_PREDICTOR_URL: &str = "ROI_PREDICTOR_URL";
pub const ENV_PORT: &str = "ROI_PORT";
pub const ENV_CONFIG: &str = "ROI_CONFIG";

pub const DEFAULT_PREDICTOR_URL: &str = "http://127.0.0.1:5000/predict";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// 50 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const CONFIG_DIR_NAME: &str = "roi-dashboard";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of the TOML config file
///
/// Every key is optional so the resolver can tell "not set" apart from
/// "set to the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Full URL of the predictor's upload endpoint
    #[serde(default)]
    pub predictor_url: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Timeout for one prediction request, in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Recommendations returned when a request gives no `limit`
    #[serde(default)]
    pub recommendation_count: Option<usize>,

    /// Largest accepted upload body
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Location of the config file: `ROI_CONFIG` if set, else the per-user
/// config directory. `None` when neither can be determined.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file if there is one, defaults otherwise.
///
/// Nothing is logged here because callers read the config before the
/// subscriber exists (the log level comes from it). A file that exists but
/// cannot be read or parsed is returned alongside the defaults so it can be
/// reported once logging is up. A missing file is not a problem.
pub fn load_toml_config_or_default() -> (TomlConfig, Option<Error>) {
    match config_file_path() {
        Some(path) if path.exists() => match load_toml_config(&path) {
            Ok(config) => (config, None),
            Err(e) => (TomlConfig::default(), Some(e)),
        },
        _ => (TomlConfig::default(), None),
    }
}

/// Predictor endpoint: CLI → `ROI_PREDICTOR_URL` → TOML → default
pub fn resolve_predictor_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> String {
    if let Some(url) = cli_arg.filter(|u| !u.trim().is_empty()) {
        return url.to_string();
    }

    if let Ok(url) = std::env::var(ENV_PREDICTOR_URL) {
        if !url.trim().is_empty() {
            return url;
        }
    }

    if let Some(url) = toml_config.predictor_url.as_deref().filter(|u| !u.trim().is_empty()) {
        return url.to_string();
    }

    DEFAULT_PREDICTOR_URL.to_string()
}

/// HTTP port: CLI → `ROI_PORT` → TOML → default
///
/// An unparseable `ROI_PORT` is logged and skipped.
pub fn resolve_port(cli_arg: Option<u16>, toml_config: &TomlConfig) -> u16 {
    if let Some(port) = cli_arg {
        return port;
    }

    if let Ok(raw) = std::env::var(ENV_PORT) {
        match raw.trim().parse::<u16>() {
            Ok(port) => return port,
            Err(_) => warn!("Ignoring invalid {}={:?}", ENV_PORT, raw),
        }
    }

    toml_config.port.unwrap_or(DEFAULT_PORT)
}

impl TomlConfig {
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn recommendation_count(&self) -> usize {
        self.recommendation_count
            .unwrap_or(crate::recommender::DEFAULT_RECOMMENDATION_COUNT)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }
}
