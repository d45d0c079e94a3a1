//! Runtime configuration for roi-ingest
//!
//! Resolved once at startup from CLI → ENV → TOML → defaults (see
//! `roi_common::config`) and shared read-only through `AppState`.

use roi_common::config::{
    resolve_port, resolve_predictor_url, TomlConfig, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_PORT, DEFAULT_PREDICTOR_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use roi_common::DEFAULT_RECOMMENDATION_COUNT;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub predictor_url: String,
    pub port: u16,
    pub request_timeout: Duration,
    /// Used when a recommendation request has no `limit`
    pub recommendation_count: usize,
    pub max_upload_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            predictor_url: DEFAULT_PREDICTOR_URL.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl IngestConfig {
    pub fn resolve(cli_port: Option<u16>, cli_predictor_url: Option<&str>, toml_config: &TomlConfig) -> Self {
        Self {
            predictor_url: resolve_predictor_url(cli_predictor_url, toml_config),
            port: resolve_port(cli_port, toml_config),
            request_timeout: Duration::from_secs(toml_config.request_timeout_secs()),
            recommendation_count: toml_config.recommendation_count(),
            max_upload_bytes: toml_config.max_upload_bytes(),
        }
    }
}
