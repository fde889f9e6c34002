//! Runtime configuration for the board client.

use std::env;

/// Environment variable holding the API base URL.
pub const API_BASE_ENV: &str = "BOARD_API_BASE";

/// Variable the web frontend reads the same setting from; consulted when
/// `BOARD_API_BASE` is unset so one deployment config serves both.
pub const FRONTEND_API_BASE_ENV: &str = "NUXT_PUBLIC_API_BASE";

/// Base URL used when neither variable is set to a non-empty value.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the board service; endpoints live under `<api_base>/api`.
    pub api_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup, so tests need not mutate the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        [API_BASE_ENV, FRONTEND_API_BASE_ENV]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|base| !base.trim().is_empty())
            .map(|base| Self::new(base.trim()))
            .unwrap_or_default()
    }
}
