//! npm registry source

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::heuristics::{categorize, estimate_difficulty, estimate_popularity, parse_timestamp};
use super::traits::{RateBudget, SearchFilter, ToolSource, collect_trending, transform_batch};
use crate::application::errors::SourceError;
use crate::config::{DiscoveryConfig, NpmSourceConfig};
use crate::domain::{DomainError, RawToolRecord, SourceType};
use crate::infrastructure::api_clients::{RateLimitedClient, RequestOptions};

/// Seed terms fanned through search to approximate a trending listing
const TRENDING_SEED_TERMS: &[&str] = &[
    "framework",
    "react",
    "cli",
    "testing",
    "database",
    "bundler",
    "typescript",
];

/// The registry caps `size` at 250
const MAX_PAGE_SIZE: usize = 250;

#[derive(Debug, Deserialize)]
struct NpmSearchResponse {
    #[serde(default)]
    objects: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct NpmSearchObject {
    package: NpmPackage,
}

#[derive(Debug, Deserialize)]
struct NpmPackage {
    name: String,
    version: Option<String>,
    description: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    date: Option<String>,
    #[serde(default)]
    links: NpmLinks,
    license: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NpmLinks {
    npm: Option<String>,
    homepage: Option<String>,
    repository: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NpmDownloadsPoint {
    downloads: u64,
}

/// npm registry search, enriched with weekly download counts
pub struct NpmSource {
    registry: RateLimitedClient,
    downloads: RateLimitedClient,
    batch_size: usize,
    cache_ttl: Duration,
}

impl NpmSource {
    pub fn new(config: &NpmSourceConfig, discovery: &DiscoveryConfig) -> Result<Self, SourceError> {
        let registry = super::build_client(
            SourceType::Npm,
            &config.base_url,
            config.timeout_seconds,
            &config.rate_limit,
        )?;
        let downloads = super::build_client(
            SourceType::Npm,
            &config.downloads_base_url,
            config.timeout_seconds,
            &config.rate_limit,
        )?;

        Ok(Self {
            registry,
            downloads,
            batch_size: discovery.batch_size,
            cache_ttl: discovery.cache_expiry(),
        })
    }

    /// Weekly downloads for one package; failures leave the metric absent
    async fn weekly_downloads(&self, name: &str) -> Option<u64> {
        let endpoint = format!("downloads/point/last-week/{}", name);
        let cache_key = format!("npm:downloads:{}", name);

        match self
            .downloads
            .request::<NpmDownloadsPoint>(
                &endpoint,
                &RequestOptions::new(),
                Some(cache_key.as_str()),
                self.cache_ttl,
            )
            .await
        {
            Ok(point) => Some(point.downloads),
            Err(e) => {
                warn!(package = name, error = %e, "Failed to fetch npm weekly downloads");
                None
            }
        }
    }
}

#[async_trait]
impl ToolSource for NpmSource {
    fn source_type(&self) -> SourceType {
        SourceType::Npm
    }

    async fn fetch_trending(&self) -> Result<Vec<RawToolRecord>, SourceError> {
        collect_trending(
            self,
            TRENDING_SEED_TERMS,
            &SearchFilter::with_limit(self.batch_size),
        )
        .await
    }

    async fn search(
        &self,
        query: &str,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<RawToolRecord>, SourceError> {
        let size = filter
            .and_then(|f| f.limit)
            .unwrap_or(self.batch_size)
            .clamp(1, MAX_PAGE_SIZE);
        let text = match filter.and_then(|f| f.language.as_deref()) {
            Some(language) => format!("{} keywords:{}", query, language.to_lowercase()),
            None => query.to_string(),
        };
        let cache_key = format!("npm:search:{}:{}", text.to_lowercase(), size);
        let options = RequestOptions::new().query("text", &text).query("size", size);

        let response: NpmSearchResponse = self
            .registry
            .request("-/v1/search", &options, Some(cache_key.as_str()), self.cache_ttl)
            .await?;

        let mut records = transform_batch(self, &response.objects);
        // Lookups run concurrently; the downloads limiter still paces them
        let downloads =
            join_all(records.iter().map(|record| self.weekly_downloads(&record.name))).await;
        let now = Utc::now();
        for (record, weekly) in records.iter_mut().zip(downloads) {
            record.weekly_downloads = weekly;
            let metrics: Vec<u64> = record.weekly_downloads.into_iter().collect();
            record.popularity_score =
                Some(estimate_popularity(&metrics, record.last_updated, now));
        }

        debug!(query, count = records.len(), "npm search complete");
        Ok(records)
    }

    fn transform_to_raw_record(&self, native: &Value) -> Result<RawToolRecord, DomainError> {
        let object =
            NpmSearchObject::deserialize(native).map_err(|e| DomainError::MalformedRecord {
                source_type: SourceType::Npm.to_string(),
                message: e.to_string(),
            })?;
        let package = object.package;

        let name = package.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::MalformedRecord {
                source_type: SourceType::Npm.to_string(),
                message: "package has no name".to_string(),
            });
        }

        let description = package.description.unwrap_or_default();
        let last_updated = parse_timestamp(package.date.as_deref());
        let languages = if package
            .keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case("typescript"))
        {
            vec!["TypeScript".to_string()]
        } else {
            vec!["JavaScript".to_string()]
        };

        let mut record = RawToolRecord::new(name.clone(), SourceType::Npm);
        record.category = categorize(&name, &description, &package.keywords);
        record.difficulty =
            Some(estimate_difficulty(&name, &description, &package.keywords).to_string());
        record.popularity_score = Some(estimate_popularity(&[], last_updated, Utc::now()));
        record.description = description;
        record.source_id = Some(name.clone());
        record.homepage_url = package.links.homepage;
        record.repository_url = package.links.repository;
        record.package_url = Some(
            package
                .links
                .npm
                .unwrap_or_else(|| format!("https://www.npmjs.com/package/{}", name)),
        );
        record.languages = languages;
        record.tags = package.keywords;
        record.license = package.license;
        record.version = package.version;
        record.last_updated = last_updated;

        Ok(record)
    }

    async fn clear_cache(&self) {
        self.registry.clear_cache().await;
        self.downloads.clear_cache().await;
    }

    fn rate_budget(&self) -> Option<RateBudget> {
        Some(super::rate_budget_of(&self.registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use serde_json::json;

    fn source(url: &str) -> NpmSource {
        let config = NpmSourceConfig {
            base_url: url.to_string(),
            downloads_base_url: url.to_string(),
            timeout_seconds: 5,
            rate_limit: RateLimitConfig {
                max_requests: 100,
                window_ms: 1_000,
            },
        };
        NpmSource::new(&config, &DiscoveryConfig::default()).unwrap()
    }

    fn search_body() -> String {
        json!({
            "objects": [
                {
                    "package": {
                        "name": "vitest",
                        "version": "1.6.0",
                        "description": "Next generation testing framework",
                        "keywords": ["test", "typescript"],
                        "date": "2024-05-01T12:00:00.000Z",
                        "links": {
                            "npm": "https://www.npmjs.com/package/vitest",
                            "homepage": "https://vitest.dev",
                            "repository": "https://github.com/vitest-dev/vitest"
                        }
                    }
                },
                { "package": { "version": "0.0.1" } },
                {
                    "package": {
                        "name": "left-pad",
                        "description": "String left pad"
                    }
                }
            ],
            "total": 3
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_search_transforms_and_attaches_downloads() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/-/v1/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("text".into(), "test".into()),
                mockito::Matcher::UrlEncoded("size".into(), "20".into()),
            ]))
            .with_status(200)
            .with_body(search_body())
            .create_async()
            .await;
        let _vitest = server
            .mock("GET", "/downloads/point/last-week/vitest")
            .with_status(200)
            .with_body(r#"{"downloads": 5400, "package": "vitest"}"#)
            .create_async()
            .await;
        let _left_pad = server
            .mock("GET", "/downloads/point/last-week/left-pad")
            .with_status(404)
            .with_body(r#"{"error": "not found"}"#)
            .create_async()
            .await;

        let source = source(&server.url());
        let records = source.search("test", None).await.unwrap();

        search.assert_async().await;
        assert_eq!(records.len(), 2);

        let vitest = &records[0];
        assert_eq!(vitest.source_id.as_deref(), Some("vitest"));
        assert_eq!(vitest.weekly_downloads, Some(5400));
        assert_eq!(vitest.category, "testing");
        assert_eq!(vitest.languages, vec!["TypeScript".to_string()]);
        assert_eq!(vitest.homepage_url.as_deref(), Some("https://vitest.dev"));
        assert!(vitest.last_updated.is_some());
        assert!(vitest.popularity_score.unwrap() > 0.0);

        let left_pad = &records[1];
        assert_eq!(left_pad.weekly_downloads, None);
        assert_eq!(
            left_pad.package_url.as_deref(),
            Some("https://www.npmjs.com/package/left-pad")
        );
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/-/v1/search")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("registry unavailable")
            .create_async()
            .await;

        let source = source(&server.url());
        let result = source.search("anything", None).await;
        match result {
            Err(SourceError::Http { status, message, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "registry unavailable");
            }
            other => panic!("expected HTTP 500, got {other:?}"),
        }
    }

    #[test]
    fn test_transform_rejects_nameless_package() {
        let source = source("http://localhost:1");
        let result = source.transform_to_raw_record(&json!({"package": {"name": "  "}}));
        assert!(matches!(result, Err(DomainError::MalformedRecord { .. })));

        let result = source.transform_to_raw_record(&json!({"unexpected": true}));
        assert!(result.is_err());
    }
}
