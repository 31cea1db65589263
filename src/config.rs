//! Configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::ApplicationError;
use crate::domain::SourceType;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub discovery: DiscoveryConfig,
    pub sources: SourcesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI). Should be false in hardened production.
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only). Empty vector -> no external origins.
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Knobs of the discovery engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub enabled_sources: Vec<SourceType>,
    pub max_tools_per_source: usize,
    pub min_popularity_threshold: f64,
    /// Applied when adapters are built; per-call overrides of it are ignored
    pub cache_expiry_seconds: u64,
    /// Records requested per upstream search call
    pub batch_size: usize,
    pub max_results: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled_sources: SourceType::ALL.to_vec(),
            max_tools_per_source: 20,
            min_popularity_threshold: 10.0,
            cache_expiry_seconds: 3600,
            batch_size: 20,
            max_results: 50,
        }
    }
}

impl DiscoveryConfig {
    /// Reject configurations that would silently produce empty results
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.enabled_sources.is_empty() {
            return Err(ApplicationError::configuration(
                "enabled_sources must name at least one source",
            ));
        }
        if self.max_tools_per_source == 0 {
            return Err(ApplicationError::configuration(
                "max_tools_per_source must be greater than zero",
            ));
        }
        if self.batch_size == 0 {
            return Err(ApplicationError::configuration(
                "batch_size must be greater than zero",
            ));
        }
        if self.max_results == 0 {
            return Err(ApplicationError::configuration(
                "max_results must be greater than zero",
            ));
        }
        if !self.min_popularity_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.min_popularity_threshold)
        {
            return Err(ApplicationError::configuration(format!(
                "min_popularity_threshold must be between 0 and 100, got {}",
                self.min_popularity_threshold
            )));
        }
        if self.cache_expiry_seconds == 0 {
            return Err(ApplicationError::configuration(
                "cache_expiry_seconds must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_seconds)
    }

    pub fn is_enabled(&self, source: SourceType) -> bool {
        self.enabled_sources.contains(&source)
    }
}

/// Sliding-window request budget of one client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Upstream catalog endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub npm: NpmSourceConfig,
    pub crates: SourceConfig,
    pub github: GitHubSourceConfig,
    pub dockerhub: SourceConfig,
}

/// Base URL, timeout and budget of a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub rate_limit: RateLimitConfig,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// npm registry search plus the separate downloads API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpmSourceConfig {
    pub base_url: String,
    pub downloads_base_url: String,
    pub timeout_seconds: u64,
    pub rate_limit: RateLimitConfig,
}

/// GitHub repository search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSourceConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub rate_limit: RateLimitConfig,
    /// Budget used instead of `rate_limit` when a token is configured
    pub authenticated_rate_limit: RateLimitConfig,
}

impl GitHubSourceConfig {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn effective_rate_limit(&self) -> RateLimitConfig {
        if self.token().is_some() {
            self.authenticated_rate_limit
        } else {
            self.rate_limit
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            npm: NpmSourceConfig {
                base_url: "https://registry.npmjs.org".to_string(),
                downloads_base_url: "https://api.npmjs.org".to_string(),
                timeout_seconds: 10,
                rate_limit: RateLimitConfig {
                    max_requests: 60,
                    window_ms: 60_000,
                },
            },
            crates: SourceConfig {
                base_url: "https://crates.io".to_string(),
                timeout_seconds: 10,
                // crates.io crawler policy: one request per second
                rate_limit: RateLimitConfig {
                    max_requests: 1,
                    window_ms: 1_000,
                },
            },
            github: GitHubSourceConfig {
                base_url: "https://api.github.com".to_string(),
                token: None,
                timeout_seconds: 10,
                rate_limit: RateLimitConfig {
                    max_requests: 10,
                    window_ms: 60_000,
                },
                authenticated_rate_limit: RateLimitConfig {
                    max_requests: 30,
                    window_ms: 60_000,
                },
            },
            dockerhub: SourceConfig {
                base_url: "https://hub.docker.com".to_string(),
                timeout_seconds: 10,
                rate_limit: RateLimitConfig {
                    max_requests: 30,
                    window_ms: 60_000,
                },
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_docs: true,
                request_timeout_seconds: 60,
                allowed_origins: vec!["*".to_string()],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            discovery: DiscoveryConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Config::default())?;

        let mut builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // Override with environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder
            .add_source(config::Environment::with_prefix("STACKSCOUT").separator("__"))
            .build()?
            .try_deserialize()
    }
}
