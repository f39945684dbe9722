//! Configuration loading and the key source the codec reads from.
//!
//! Settings are read from `CRYPT_*` environment variables. The key itself is
//! read from a separate named value (`APP_KEY` by default) through the
//! [`KeySource`] trait, so hosts can supply it from wherever their
//! configuration lives.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the configuration value holding the base64-encoded key.
pub const DEFAULT_KEY_NAME: &str = "APP_KEY";

/// Read-only lookup of named configuration values.
///
/// The codec calls [`KeySource::get`] once per successful key resolution.
#[cfg_attr(test, mockall::automock)]
pub trait KeySource: Send + Sync {
    /// Return the value stored under `name`, or `None` if it is not set.
    fn get(&self, name: &str) -> Option<String>;
}

impl KeySource for config::Config {
    fn get(&self, name: &str) -> Option<String> {
        // The environment source lowercases every key it collects.
        self.get_string(&name.to_ascii_lowercase()).ok()
    }
}

impl KeySource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Build a snapshot of the process environment usable as a [`KeySource`].
///
/// # Errors
///
/// Returns an error if the environment cannot be collected.
pub fn env_source() -> Result<config::Config> {
    config::Config::builder()
        .add_source(config::Environment::default())
        .build()
        .context("failed to build configuration from environment")
}

/// Validated settings for the `crypt` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Name of the value holding the base64-encoded 32-byte key.
    #[serde(default = "default_key_name")]
    pub key_name: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_key_name() -> String {
    DEFAULT_KEY_NAME.into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_name: default_key_name(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load and validate settings from `CRYPT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("CRYPT"))
            .build()
            .context("failed to build crypt settings from environment")?;

        let s: Settings = cfg
            .try_deserialize()
            .context("failed to deserialise crypt settings")?;

        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> Result<()> {
        if self.key_name.trim().is_empty() {
            anyhow::bail!("CRYPT_KEY_NAME must not be empty");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("CRYPT_LOG_LEVEL must not be empty");
        }
        Ok(())
    }
}
