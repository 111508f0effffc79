//! Shell Configuration
//!
//! Layered configuration: built-in defaults, then `plinth.toml`, then
//! `PLINTH_*` environment variables.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "PLINTH_";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

/// Shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the app's static assets; also the watched root
    #[serde(default = "default_app_root")]
    pub app_root: PathBuf,

    /// Hostnames (exact) or leading-dot suffixes requests may address
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Whether the file watcher runs
    #[serde(default = "default_watch")]
    pub watch: bool,

    /// Upper bound on the ready-notification idle deferral
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Runtime-error dedup window
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5173
}

fn default_app_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_allowed_hosts() -> Vec<String> {
    [
        "localhost",
        "127.0.0.1",
        "0.0.0.0",
        ".modal.host",
        ".daytona.io",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_watch() -> bool {
    true
}

fn default_idle_timeout_ms() -> u64 {
    1000
}

fn default_dedup_window_ms() -> u64 {
    5000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            app_root: default_app_root(),
            allowed_hosts: default_allowed_hosts(),
            watch: default_watch(),
            idle_timeout_ms: default_idle_timeout_ms(),
            dedup_window_ms: default_dedup_window_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration, layering the file at `path` (if it exists) and
    /// `PLINTH_*` environment variables over the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        Ok(config)
    }
}
