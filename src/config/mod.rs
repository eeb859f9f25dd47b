mod retry;

pub use retry::RetrySettings;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Client configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ClientOptions {
    /// Base URL of the analytics server. TOML: `endpoint`. Must be provided.
    #[serde(default)]
    pub endpoint: String,

    /// Emit a log line for every poll attempt and failed attempt.
    /// TOML: `verbose_logging`. Default: `false`.
    #[serde(default)]
    pub verbose_logging: bool,

    /// Retry schedule for async job polling (see `async_retry` table in castor.toml).
    #[serde(default)]
    pub async_retry: RetrySettings,
}

const DEFAULT_CONFIG_FILE: &str = "castor.toml";

impl ClientOptions {
    /// Options for the given endpoint with the default polling behaviour.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(ClientOptions::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `castor.toml` if present.
    ///
    /// Note: this does **not** validate `endpoint`. Use `ClientOptions::from_toml()`
    /// (or validate explicitly) to reject configurations without one.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional castor.toml): {err}")
        })
    }

    /// Loads configuration from the TOML file (with defaults) and validates required fields.
    pub fn from_toml() -> Self {
        if !PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            panic!("config file not found: {DEFAULT_CONFIG_FILE}");
        }
        let options: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration from {DEFAULT_CONFIG_FILE}: {err}")
        });
        if options.endpoint.trim().is_empty() {
            panic!("endpoint must be set and non-empty");
        }
        options
    }
}
