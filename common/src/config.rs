//! Application configuration.
//!
//! Configuration is read from environment variables, optionally seeded from a
//! `.env` file in the working directory.

use std::time::Duration;

/// Default remote API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default location of the durable key/value storage file.
pub const DEFAULT_STORAGE_PATH: &str = ".dashboard/storage.json";

/// Client configuration shared by every component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the running component, used in log fields.
    pub service_name: String,
    /// Base URL of the remote API, without trailing slash.
    pub api_url: String,
    /// Fixed request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Page size used when a list request does not specify one.
    pub default_page_size: u32,
    /// Path of the durable storage file.
    pub storage_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "dashboard".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            default_page_size: DEFAULT_PAGE_SIZE,
            storage_path: DEFAULT_STORAGE_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from the environment and tags it with a component name.
    pub fn load_with_service(service: impl Into<String>) -> Self {
        Self {
            service_name: service.into(),
            ..Self::load()
        }
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: defaults.service_name,
            api_url: lookup("API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_url),
            request_timeout_secs: positive(&lookup, "REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            default_page_size: positive(&lookup, "DEFAULT_PAGE_SIZE")
                .unwrap_or(defaults.default_page_size),
            storage_path: lookup("STORAGE_PATH")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.storage_path),
        }
    }

    /// Returns the request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parses a positive number; invalid values are logged and ignored.
fn positive<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    let Ok(content) = std::fs::read_to_string(env_path) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set by the environment
        if std::env::var(&key).is_err() {
            std::env::set_var(key, value);
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
