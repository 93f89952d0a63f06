//! Configuration loading
//!
//! TOML file + `PAPERTRADE__*` environment overlay. Every field has a
//! default so an empty file (or no file at all) still yields a working
//! config pointed at localhost.

use crate::error::Result;
use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paper_trading: PaperTradingConfig,
}

/// Remote REST API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token attached to every request. Usually supplied via
    /// `PAPERTRADE__API__BEARER_TOKEN` rather than the file.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Paper-trading session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperTradingConfig {
    /// Status poll interval while a session is active.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Equity curve ring-buffer capacity.
    #[serde(default = "default_equity_history_len")]
    pub equity_history_len: usize,
    /// Default `?limit=` for the session history listing.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_equity_history_len() -> usize {
    50
}

fn default_history_limit() -> u32 {
    20
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            bearer_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PaperTradingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            equity_history_len: default_equity_history_len(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file (optional) with environment
    /// variables layered on top. `~` in the path is expanded.
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = shellexpand::tilde(path).to_string();
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("PAPERTRADE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

impl PaperTradingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
