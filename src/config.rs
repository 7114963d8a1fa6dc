// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reconciler Configuration
//!
//! Loaded from environment variables or a TOML file. Every field has a
//! compiled-in default; in particular the retry bound is an ordinary value
//! that callers can override.
//!
//! | variable                     | field                 | default                         |
//! |------------------------------|-----------------------|---------------------------------|
//! | `HCLOUD_ENDPOINT`            | `endpoint`            | `https://api.hetzner.cloud/v1`  |
//! | `HCLOUD_TOKEN`               | `token`               | empty                           |
//! | `HCLOUD_MAX_ATTEMPTS`        | `max_attempts`        | 5                               |
//! | `HCLOUD_POLL_INTERVAL_MS`    | `poll_interval_ms`    | 500                             |
//! | `HCLOUD_ACTION_TIMEOUT_SECS` | `action_timeout_secs` | 300                             |
//! | `HCLOUD_REQUEST_TIMEOUT_SECS`| `request_timeout_secs`| 30                              |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::action::WaitConfig;
use crate::retry::{RetryConfig, DEFAULT_MAX_ATTEMPTS};

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration error: invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration error: {0}")]
    Parse(String),
}

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API token
    #[serde(default)]
    pub token: String,

    /// Total attempts per mutation, counting the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between action polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Budget for waiting on a single action in seconds
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.hetzner.cloud/v1".to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_action_timeout_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: String::new(),
            max_attempts: default_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            action_timeout_secs: default_action_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            endpoint: lookup("HCLOUD_ENDPOINT").unwrap_or(defaults.endpoint),
            token: lookup("HCLOUD_TOKEN").unwrap_or(defaults.token),
            max_attempts: parse_var(&lookup, "HCLOUD_MAX_ATTEMPTS", defaults.max_attempts)?,
            poll_interval_ms: parse_var(
                &lookup,
                "HCLOUD_POLL_INTERVAL_MS",
                defaults.poll_interval_ms,
            )?,
            action_timeout_secs: parse_var(
                &lookup,
                "HCLOUD_ACTION_TIMEOUT_SECS",
                defaults.action_timeout_secs,
            )?,
            request_timeout_secs: parse_var(
                &lookup,
                "HCLOUD_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::default().with_max_attempts(self.max_attempts)
    }

    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.action_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.endpoint, "https://api.hetzner.cloud/v1");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_config().max_attempts, 5);
        assert_eq!(config.wait_config().poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_config_env_overrides() {
        let config = ReconcilerConfig::from_lookup(lookup(&[
            ("HCLOUD_TOKEN", "secret"),
            ("HCLOUD_MAX_ATTEMPTS", "12"),
            ("HCLOUD_ACTION_TIMEOUT_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.token, "secret");
        assert_eq!(config.retry_config().max_attempts, 12);
        assert_eq!(config.wait_config().timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn test_config_env_invalid_number() {
        let err = ReconcilerConfig::from_lookup(lookup(&[("HCLOUD_MAX_ATTEMPTS", "many")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "HCLOUD_MAX_ATTEMPTS".to_string(),
                value: "many".to_string(),
            }
        );
    }

    #[test]
    fn test_config_from_toml() {
        let config = ReconcilerConfig::from_toml_str(
            r#"
            token = "abc"
            max_attempts = 3
            poll_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.token, "abc");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(ReconcilerConfig::from_toml_str("max_attempts = \"x\"").is_err());
    }
}
