//! Configuration management for the dashboard.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::identity::Role;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Marketplace API configuration
    pub api: ApiConfig,
    /// Signed-in account configuration
    pub account: AccountConfig,
    /// How long toasts stay visible, in seconds (0 keeps them until dismissed)
    pub toast_seconds: u64,
}

/// Marketplace API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; `/v1/...` paths are appended
    pub url: String,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Bearer token passed through unchanged
    pub token: Option<String>,
}

/// Account the binary signs in as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account email
    pub email: Option<String>,
    /// Requested role
    pub role: Role,
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset or unparseable values fall
    /// back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        Self {
            api: ApiConfig {
                url: non_empty("MARKETPLACE_API_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
                timeout: non_empty("MARKETPLACE_API_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                token: non_empty("MARKETPLACE_API_TOKEN"),
            },
            account: AccountConfig {
                email: non_empty("MARKETPLACE_EMAIL"),
                role: non_empty("MARKETPLACE_ROLE")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(Role::Customer),
            },
            toast_seconds: non_empty("MARKETPLACE_TOAST_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }

    /// Per-request timeout
    #[must_use]
    pub const fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout)
    }

    /// Toast lifetime; `None` keeps toasts until dismissed
    #[must_use]
    pub const fn toast_ttl(&self) -> Option<Duration> {
        match self.toast_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
