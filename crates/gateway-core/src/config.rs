//! Process configuration.
//!
//! Debrid API keys are never part of this structure - they are
//! per-request only and must never be defaulted, cached, or read from
//! the environment in `secure_mode`.

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::scorer::ScoringConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub concurrency: ConcurrencyConfig,
    pub filters: FilterConfig,
    pub scoring: ScoringConfig,
    pub providers: ProvidersConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            filters: FilterConfig::default(),
            scoring: ScoringConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load an optional YAML file, then overlay `GATEWAY_*` environment
    /// variables (e.g. `GATEWAY_SERVER_PORT`, `GATEWAY_SECURE_MODE`).
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, config::FileFormat::Yaml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("GATEWAY")
                .separator("_")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::load(None).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When true, debrid keys are never accepted from anywhere but the
    /// current request (no env fallback, no dev shortcuts).
    pub secure_mode: bool,
    pub max_returned_streams: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            secure_mode: true,
            max_returned_streams: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub final_response_capacity: u64,
    pub final_response_ttl_secs: u64,
    pub provider_probe_ttl_secs: u64,
    pub debrid_file_list_capacity: u64,
    pub debrid_file_list_ttl_secs: u64,
    pub debrid_unlock_capacity: u64,
    pub debrid_unlock_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            final_response_capacity: 5_000,
            final_response_ttl_secs: 300,
            provider_probe_ttl_secs: 300,
            debrid_file_list_capacity: 10_000,
            debrid_file_list_ttl_secs: 86_400,
            debrid_unlock_capacity: 10_000,
            debrid_unlock_ttl_secs: 3_600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { requests_per_window: 100, window_secs: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub max_in_flight: usize,
    pub queue_dwell_timeout_ms: u64,
    pub debrid_semaphore_permits: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { max_in_flight: 64, queue_dwell_timeout_ms: 2_000, debrid_semaphore_permits: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub max_size_bytes: Option<u64>,
    pub blacklist_terms: Vec<String>,
    pub strict_language: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { max_size_bytes: None, blacklist_terms: Vec::new(), strict_language: false }
    }
}

/// Upstream base URLs. Never secrets - debrid *keys* stay per-request;
/// these are just the fixed endpoints each resolver/provider talks to,
/// operator-configured like any other deployment target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub torrent_index_a_base_url: String,
    pub torrent_index_b_base_url: String,
    pub direct_host_base_url: String,
    pub realdebrid_base_url: String,
    pub alldebrid_base_url: String,
    pub premiumize_base_url: String,
    pub torbox_base_url: String,
    pub offcloud_base_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            torrent_index_a_base_url: "https://torrent-index-a.example.invalid".to_string(),
            torrent_index_b_base_url: "https://torrent-index-b.example.invalid".to_string(),
            direct_host_base_url: "https://direct-host.example.invalid".to_string(),
            realdebrid_base_url: "https://api.real-debrid.com/rest/1.0".to_string(),
            alldebrid_base_url: "https://api.alldebrid.com/v4".to_string(),
            premiumize_base_url: "https://www.premiumize.me/api".to_string(),
            torbox_base_url: "https://api.torbox.app/v1".to_string(),
            offcloud_base_url: "https://offcloud.com/api".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.port, 8787);
        assert!(config.server.secure_mode);
        assert_eq!(config.concurrency.debrid_semaphore_permits, 3);
    }

    #[test]
    fn from_env_falls_back_to_defaults_without_panicking() {
        let config = GatewayConfig::from_env();
        assert_eq!(config.rate_limit.window_secs, 60);
    }
}
