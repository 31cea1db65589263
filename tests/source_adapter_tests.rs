//! Source adapter tests against mocked catalog APIs
//! Builds the real adapters from configuration and points them at mockito

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use std::sync::Arc;

use stackscout::{
    Config,
    application::{DiscoveryEngine, DiscoveryService},
    config::RateLimitConfig,
    domain::SourceType,
    infrastructure::{AggregatingToolRepository, ToolRepository, build_sources},
};

fn fast_limit() -> RateLimitConfig {
    RateLimitConfig {
        max_requests: 1_000,
        window_ms: 1_000,
    }
}

/// Every source pointed at the mock server with budgets that never block
fn config_for(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    let url = server.url();

    config.sources.npm.base_url = url.clone();
    config.sources.npm.downloads_base_url = url.clone();
    config.sources.npm.rate_limit = fast_limit();
    config.sources.crates.base_url = url.clone();
    config.sources.crates.rate_limit = fast_limit();
    config.sources.github.base_url = url.clone();
    config.sources.github.rate_limit = fast_limit();
    config.sources.github.authenticated_rate_limit = fast_limit();
    config.sources.dockerhub.base_url = url;
    config.sources.dockerhub.rate_limit = fast_limit();
    config
}

fn engine(config: &Config) -> DiscoveryEngine {
    let sources = build_sources(config).unwrap();
    let repository = Arc::new(AggregatingToolRepository::new(sources));
    DiscoveryEngine::new(repository, config.discovery.clone()).unwrap()
}

async fn mock_npm(server: &mut ServerGuard) -> (Mock, Mock) {
    let search = server
        .mock("GET", "/-/v1/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "objects": [{
                    "package": {
                        "name": "vitest",
                        "version": "2.1.0",
                        "description": "Next generation testing framework",
                        "keywords": ["test", "vite"],
                        "date": "2026-10-01T00:00:00.000Z",
                        "links": { "npm": "https://www.npmjs.com/package/vitest" },
                        "license": "MIT"
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let downloads = server
        .mock("GET", "/downloads/point/last-week/vitest")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "downloads": 5_000_000 }).to_string())
        .create_async()
        .await;
    (search, downloads)
}

async fn mock_crates(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/api/v1/crates")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "crates": [{
                    "name": "serde",
                    "description": "A generic serialization/deserialization framework",
                    "repository": "https://github.com/serde-rs/serde",
                    "downloads": 500_000_000,
                    "recent_downloads": 13_000_000,
                    "max_stable_version": "1.0.210",
                    "updated_at": "2026-09-20T12:00:00Z",
                    "keywords": ["serde", "serialization"]
                }]
            })
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_github(server: &mut ServerGuard, status: usize) -> Mock {
    let body = if status == 200 {
        json!({
            "items": [{
                "name": "ripgrep",
                "full_name": "BurntSushi/ripgrep",
                "description": "ripgrep recursively searches directories for a regex pattern",
                "html_url": "https://github.com/BurntSushi/ripgrep",
                "stargazers_count": 45_000,
                "forks_count": 2_000,
                "language": "Rust",
                "topics": ["cli", "search"],
                "license": { "spdx_id": "Unlicense", "name": "The Unlicense" },
                "pushed_at": "2026-10-10T08:00:00Z"
            }]
        })
    } else {
        json!({ "message": "Service Unavailable" })
    };

    server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::Any)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn mock_dockerhub(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/v2/search/repositories/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [{
                    "repo_name": "postgres",
                    "short_description": "The PostgreSQL object-relational database system",
                    "star_count": 13_000,
                    "pull_count": 1_000_000_000u64,
                    "is_official": true
                }]
            })
            .to_string(),
        )
        .create_async()
        .await
}

#[tokio::test]
async fn search_across_every_source() {
    let mut server = mockito::Server::new_async().await;
    let _npm = mock_npm(&mut server).await;
    let _crates = mock_crates(&mut server).await;
    let _github = mock_github(&mut server, 200).await;
    let _docker = mock_dockerhub(&mut server).await;

    let engine = engine(&config_for(&server));
    let report = engine.search_report("tool", None, None).await.unwrap();

    assert_eq!(report.sources.len(), 4);
    assert!(report.sources.iter().all(|s| s.ok && s.records == 1));
    assert_eq!(report.tools.len(), 4);

    let ripgrep = report
        .tools
        .iter()
        .find(|t| t.source_type == SourceType::GitHub)
        .unwrap();
    assert_eq!(ripgrep.id, "github:BurntSushi/ripgrep");
    assert_eq!(ripgrep.slug, "github-burntsushi-ripgrep");
    assert_eq!(ripgrep.metrics.github_stars, Some(45_000));

    let vitest = report
        .tools
        .iter()
        .find(|t| t.source_type == SourceType::Npm)
        .unwrap();
    assert_eq!(vitest.metrics.weekly_downloads, Some(5_000_000));

    let serde = report
        .tools
        .iter()
        .find(|t| t.source_type == SourceType::Crates)
        .unwrap();
    assert_eq!(serde.metrics.weekly_downloads, Some(1_000_000));
    assert_eq!(serde.links.documentation.as_deref(), Some("https://docs.rs/serde"));
}

#[tokio::test]
async fn failing_upstream_is_reported_per_source() {
    let mut server = mockito::Server::new_async().await;
    let _crates = mock_crates(&mut server).await;
    let _github = mock_github(&mut server, 503).await;

    let mut config = config_for(&server);
    config.discovery.enabled_sources = vec![SourceType::Crates, SourceType::GitHub];
    let report = engine(&config)
        .search_report("serde", None, None)
        .await
        .unwrap();

    assert!(report.is_degraded());
    let github = report
        .sources
        .iter()
        .find(|s| s.source == SourceType::GitHub)
        .unwrap();
    assert!(!github.ok);
    assert!(github.error.as_deref().unwrap().contains("503"));
    assert_eq!(report.tools.len(), 1);
}

#[tokio::test]
async fn repeated_search_is_served_from_cache_until_cleared() {
    let mut server = mockito::Server::new_async().await;
    let crates = mock_crates(&mut server).await.expect(2);

    let mut config = config_for(&server);
    config.discovery.enabled_sources = vec![SourceType::Crates];
    let engine = engine(&config);

    engine.search_tools("serde", None, None).await.unwrap();
    engine.search_tools("serde", None, None).await.unwrap();
    engine.clear_all_caches().await;
    engine.search_tools("serde", None, None).await.unwrap();

    crates.assert_async().await;
}

#[tokio::test]
async fn github_token_is_sent_as_bearer() {
    let mut server = mockito::Server::new_async().await;
    let github = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "items": [] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.sources.github.token = Some("secret-token".to_string());
    config.discovery.enabled_sources = vec![SourceType::GitHub];
    let engine = engine(&config);

    let report = engine.search_report("ripgrep", None, None).await.unwrap();
    assert!(report.tools.is_empty());
    assert!(!report.is_degraded());

    let budgets = engine.source_budgets();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].1.unwrap().max_requests, 1_000);

    github.assert_async().await;
}

#[tokio::test]
async fn trending_collects_seed_terms_within_budget() {
    let mut server = mockito::Server::new_async().await;
    let _docker = mock_dockerhub(&mut server).await;

    let mut config = config_for(&server);
    config.discovery.enabled_sources = vec![SourceType::DockerHub];
    let engine = engine(&config);

    let tools = engine.discover_trending_tools(None, None).await.unwrap();

    // Every seed term returns the same image; it is kept once
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "postgres");
    assert_eq!(tools[0].metrics.weekly_downloads, Some(1_000_000_000));
}

#[tokio::test]
async fn monitoring_repo_survives_a_monitoring_category_filter() {
    let mut server = mockito::Server::new_async().await;
    let _github = server
        .mock("GET", "/search/repositories")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [{
                    "name": "prometheus",
                    "full_name": "prometheus/prometheus",
                    "description": "Monitoring system and time series database",
                    "html_url": "https://github.com/prometheus/prometheus",
                    "stargazers_count": 54_000,
                    "forks_count": 9_000,
                    "language": "Go",
                    "topics": ["monitoring", "metrics", "observability"],
                    "pushed_at": "2026-10-12T08:00:00Z"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.discovery.enabled_sources = vec![SourceType::GitHub];
    let repository = AggregatingToolRepository::new(build_sources(&config).unwrap());

    let monitoring = vec!["monitoring".to_string()];
    let aggregated = repository
        .discover_trending(&[SourceType::GitHub], Some(&monitoring), 20)
        .await;

    assert_eq!(aggregated.records.len(), 1);
    assert_eq!(aggregated.records[0].category, "monitoring");
    assert_eq!(aggregated.statuses[0].records, 1);

    // The same repository also comes through a recommendation for a stack
    // whose complements include monitoring
    let engine = DiscoveryEngine::new(Arc::new(repository), config.discovery.clone()).unwrap();
    let request = stackscout::application::RecommendationRequest {
        user_stack: vec!["terraform".to_string()],
        ..Default::default()
    };
    let result = engine.generate_recommendations(&request).await.unwrap();
    assert!(result.categories.contains(&"monitoring".to_string()));
    assert!(result.recommendations.iter().any(|t| t.name == "prometheus"));
}
