//! Configuration module for ticketboard
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`TICKETBOARD_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use ticketboard::config::DashboardConfig;
//!
//! let config = DashboardConfig::default();
//! assert_eq!(config.cache.ttl_seconds, 300);
//!
//! let toml = r#"
//! [cache]
//! ttl_seconds = 60
//! "#;
//! let config: DashboardConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.cache.ttl_seconds, 60);
//! assert!(config.cache.enabled);
//! ```

pub mod api;
pub mod cache;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod retry;
pub mod store;

pub use api::ApiConfig;
pub use cache::CacheConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use monitor::MonitorConfig;
pub use retry::RetryConfig;
pub use store::{SessionConfig, StoreConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the dashboard core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DashboardConfig {
    /// Ticketing API connection
    pub api: ApiConfig,
    /// GET response cache
    pub cache: CacheConfig,
    /// Retry and backoff
    pub retry: RetryConfig,
    /// Request telemetry retention
    pub monitor: MonitorConfig,
    /// Reducer limits
    pub store: StoreConfig,
    /// Token and settings persistence
    pub session: SessionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports TICKETBOARD_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("TICKETBOARD_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(timeout) = std::env::var("TICKETBOARD_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.api.timeout_ms = t;
            }
        }
        if let Ok(retries) = std::env::var("TICKETBOARD_RETRIES") {
            if let Ok(r) = retries.parse() {
                self.retry.max_retries = r;
            }
        }

        if let Ok(cache) = std::env::var("TICKETBOARD_CACHE") {
            self.cache.enabled = cache.to_lowercase() == "true";
        }
        if let Ok(ttl) = std::env::var("TICKETBOARD_CACHE_TTL") {
            if let Ok(t) = ttl.parse() {
                self.cache.ttl_seconds = t;
            }
        }

        if let Ok(level) = std::env::var("TICKETBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TICKETBOARD_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigError::invalid("api.base_url", "URL cannot be empty"));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(ConfigError::invalid(
                "api.base_url",
                "URL must start with http:// or https://",
            ));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::invalid("api.timeout_ms", "timeout must be non-zero"));
        }
        if self.cache.max_size == 0 {
            return Err(ConfigError::invalid(
                "cache.max_size",
                "cache must hold at least one entry",
            ));
        }
        if self.retry.base_delay_ms == 0 && self.retry.jitter {
            return Err(ConfigError::invalid(
                "retry.jitter",
                "jitter requires a non-zero base_delay_ms",
            ));
        }
        if self.monitor.max_metrics == 0 {
            return Err(ConfigError::invalid(
                "monitor.max_metrics",
                "must retain at least one metric",
            ));
        }
        if self.store.max_notifications == 0 {
            return Err(ConfigError::invalid(
                "store.max_notifications",
                "must retain at least one notification",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_dashboard_config_defaults() {
        let config = DashboardConfig::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_size, 100);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert_eq!(config.store.max_notifications, 50);
        assert!(config.session.storage_path.is_none());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [api]
        base_url = "https://glpi.example.com/api"
        "#;

        let config: DashboardConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://glpi.example.com/api");
        assert_eq!(config.api.timeout_ms, 10_000); // Default
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../ticketboard.example.toml");
        let config: DashboardConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[cache]\nmax_size = 7").unwrap();

        let config = DashboardConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.cache.max_size, 7);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = DashboardConfig::load(Some(Path::new("/nonexistent/ticketboard.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[cache\nmax_size = ").unwrap();

        let result = DashboardConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = DashboardConfig::load(None).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
    }

    // Env var tests touch process-global state, so they run in one test.
    #[test]
    fn test_config_env_overrides() {
        std::env::set_var("TICKETBOARD_API_URL", "http://10.0.0.5/api");
        std::env::set_var("TICKETBOARD_RETRIES", "5");
        std::env::set_var("TICKETBOARD_CACHE", "false");
        std::env::set_var("TICKETBOARD_CACHE_TTL", "not-a-number");
        let config = DashboardConfig::default().with_env_overrides();
        std::env::remove_var("TICKETBOARD_API_URL");
        std::env::remove_var("TICKETBOARD_RETRIES");
        std::env::remove_var("TICKETBOARD_CACHE");
        std::env::remove_var("TICKETBOARD_CACHE_TTL");

        assert_eq!(config.api.base_url, "http://10.0.0.5/api");
        assert_eq!(config.retry.max_retries, 5);
        assert!(!config.cache.enabled);
        // Invalid value keeps the default
        assert_eq!(config.cache.ttl_seconds, 300);
    }

    #[test]
    fn test_config_validation_empty_url() {
        let mut config = DashboardConfig::default();
        config.api.base_url = String::new();

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "api.base_url"
        ));
    }

    #[test]
    fn test_config_validation_non_http_url() {
        let mut config = DashboardConfig::default();
        config.api.base_url = "ftp://glpi".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_cache_size() {
        let mut config = DashboardConfig::default();
        config.cache.max_size = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "cache.max_size"
        ));
    }

    #[test]
    fn test_config_validation_jitter_without_delay() {
        let mut config = DashboardConfig::default();
        config.retry.base_delay_ms = 0;
        config.retry.jitter = true;
        assert!(config.validate().is_err());
    }
}
