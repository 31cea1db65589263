//! Tool source adapters for the external catalogs

pub mod crates_io;
pub mod docker_hub;
pub mod github;
pub mod heuristics;
pub mod npm;
pub mod traits;

pub use crates_io::CratesIoSource;
pub use docker_hub::DockerHubSource;
pub use github::GitHubSource;
pub use npm::NpmSource;
pub use traits::*;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::application::errors::SourceError;
use crate::config::{Config, RateLimitConfig};
use crate::domain::SourceType;
use crate::infrastructure::api_clients::{RateLimitedClient, SlidingWindowRateLimiter};
use crate::infrastructure::cache::TtlCache;

/// Client with its own limiter and cache, owned by a single adapter
fn build_client(
    source_type: SourceType,
    base_url: &str,
    timeout_seconds: u64,
    rate_limit: &RateLimitConfig,
) -> Result<RateLimitedClient, SourceError> {
    RateLimitedClient::new(
        source_type,
        base_url,
        Duration::from_secs(timeout_seconds),
        Arc::new(SlidingWindowRateLimiter::new(
            rate_limit.max_requests,
            rate_limit.window(),
        )),
        Arc::new(TtlCache::new()),
    )
}

fn rate_budget_of(client: &RateLimitedClient) -> RateBudget {
    RateBudget {
        max_requests: client.limiter().max_requests(),
        window_ms: client.limiter().window().as_millis() as u64,
    }
}

/// Build an adapter for every enabled source, in fan-out order
pub fn build_sources(config: &Config) -> Result<Vec<Arc<dyn ToolSource>>, SourceError> {
    let discovery = &config.discovery;
    let mut sources: Vec<Arc<dyn ToolSource>> = Vec::new();

    for source_type in SourceType::ALL {
        if !discovery.is_enabled(source_type) {
            continue;
        }

        let source: Arc<dyn ToolSource> = match source_type {
            SourceType::Npm => Arc::new(NpmSource::new(&config.sources.npm, discovery)?),
            SourceType::Crates => Arc::new(CratesIoSource::new(&config.sources.crates, discovery)?),
            SourceType::GitHub => Arc::new(GitHubSource::new(&config.sources.github, discovery)?),
            SourceType::DockerHub => {
                Arc::new(DockerHubSource::new(&config.sources.dockerhub, discovery)?)
            }
        };
        sources.push(source);
    }

    info!(
        sources = ?sources.iter().map(|s| s.source_type()).collect::<Vec<_>>(),
        "Tool sources initialized"
    );
    Ok(sources)
}
