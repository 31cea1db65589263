//! crates.io source

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::heuristics::{categorize, estimate_difficulty, estimate_popularity, parse_timestamp};
use super::traits::{RateBudget, SearchFilter, ToolSource, collect_trending, transform_batch};
use crate::application::errors::SourceError;
use crate::config::{DiscoveryConfig, SourceConfig};
use crate::domain::{DomainError, RawToolRecord, SourceType};
use crate::infrastructure::api_clients::{RateLimitedClient, RequestOptions};

const TRENDING_SEED_TERMS: &[&str] = &["web", "cli", "async", "database", "serialization", "testing"];

/// crates.io caps `per_page` at 100
const MAX_PAGE_SIZE: usize = 100;

/// `recent_downloads` covers the last 90 days
const RECENT_DOWNLOAD_WEEKS: u64 = 13;

#[derive(Debug, Deserialize)]
struct CratesSearchResponse {
    #[serde(default)]
    crates: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CrateSummary {
    name: String,
    description: Option<String>,
    homepage: Option<String>,
    documentation: Option<String>,
    repository: Option<String>,
    #[serde(default)]
    downloads: u64,
    recent_downloads: Option<u64>,
    max_stable_version: Option<String>,
    newest_version: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

pub struct CratesIoSource {
    client: RateLimitedClient,
    batch_size: usize,
    cache_ttl: Duration,
}

impl CratesIoSource {
    pub fn new(config: &SourceConfig, discovery: &DiscoveryConfig) -> Result<Self, SourceError> {
        let client = super::build_client(
            SourceType::Crates,
            &config.base_url,
            config.timeout_seconds,
            &config.rate_limit,
        )?;

        Ok(Self {
            client,
            batch_size: discovery.batch_size,
            cache_ttl: discovery.cache_expiry(),
        })
    }
}

#[async_trait]
impl ToolSource for CratesIoSource {
    fn source_type(&self) -> SourceType {
        SourceType::Crates
    }

    async fn fetch_trending(&self) -> Result<Vec<RawToolRecord>, SourceError> {
        collect_trending(
            self,
            TRENDING_SEED_TERMS,
            &SearchFilter::with_limit(self.batch_size),
        )
        .await
    }

    /// Every crate is Rust, so a language filter is ignored
    async fn search(
        &self,
        query: &str,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<RawToolRecord>, SourceError> {
        let per_page = filter
            .and_then(|f| f.limit)
            .unwrap_or(self.batch_size)
            .clamp(1, MAX_PAGE_SIZE);
        let cache_key = format!("crates:search:{}:{}", query.to_lowercase(), per_page);
        let options = RequestOptions::new()
            .query("q", query)
            .query("per_page", per_page)
            .query("sort", "relevance");

        let response: CratesSearchResponse = self
            .client
            .request("api/v1/crates", &options, Some(cache_key.as_str()), self.cache_ttl)
            .await?;

        let records = transform_batch(self, &response.crates);
        debug!(query, count = records.len(), "crates.io search complete");
        Ok(records)
    }

    fn transform_to_raw_record(&self, native: &Value) -> Result<RawToolRecord, DomainError> {
        let summary = CrateSummary::deserialize(native).map_err(|e| DomainError::MalformedRecord {
            source_type: SourceType::Crates.to_string(),
            message: e.to_string(),
        })?;

        let name = summary.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::MalformedRecord {
                source_type: SourceType::Crates.to_string(),
                message: "crate has no name".to_string(),
            });
        }

        let description = summary.description.unwrap_or_default().trim().to_string();
        let last_updated = parse_timestamp(summary.updated_at.as_deref());
        let weekly_downloads = summary
            .recent_downloads
            .map(|recent| recent / RECENT_DOWNLOAD_WEEKS);

        let metrics: Vec<u64> = weekly_downloads.into_iter().collect();

        let mut record = RawToolRecord::new(name.clone(), SourceType::Crates);
        record.category = categorize(&name, &description, &summary.keywords);
        record.difficulty =
            Some(estimate_difficulty(&name, &description, &summary.keywords).to_string());
        record.popularity_score = Some(estimate_popularity(&metrics, last_updated, Utc::now()));
        record.description = description;
        record.source_id = Some(name.clone());
        record.homepage_url = summary.homepage;
        record.documentation_url = summary
            .documentation
            .or_else(|| Some(format!("https://docs.rs/{}", name)));
        record.repository_url = summary.repository;
        record.package_url = Some(format!("https://crates.io/crates/{}", name));
        record.languages = vec!["Rust".to_string()];
        record.tags = summary.keywords;
        record.weekly_downloads = weekly_downloads.or(Some(summary.downloads / 52).filter(|d| *d > 0));
        record.version = summary.max_stable_version.or(summary.newest_version);
        record.last_updated = last_updated;

        Ok(record)
    }

    async fn clear_cache(&self) {
        self.client.clear_cache().await;
    }

    fn rate_budget(&self) -> Option<RateBudget> {
        Some(super::rate_budget_of(&self.client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use serde_json::json;

    fn source(url: &str) -> CratesIoSource {
        let config = SourceConfig {
            base_url: url.to_string(),
            timeout_seconds: 5,
            rate_limit: RateLimitConfig {
                max_requests: 100,
                window_ms: 1_000,
            },
        };
        CratesIoSource::new(&config, &DiscoveryConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_crates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/crates")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("q".into(), "serde".into()),
                mockito::Matcher::UrlEncoded("per_page".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "crates": [
                        {
                            "id": "serde",
                            "name": "serde",
                            "description": "A generic serialization/deserialization framework",
                            "homepage": "https://serde.rs",
                            "documentation": "https://docs.rs/serde",
                            "repository": "https://github.com/serde-rs/serde",
                            "downloads": 300000000,
                            "recent_downloads": 1300000,
                            "max_stable_version": "1.0.200",
                            "newest_version": "1.0.200",
                            "updated_at": "2024-05-01T12:00:00.000000+00:00"
                        },
                        { "id": "broken" }
                    ],
                    "meta": { "total": 2 }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let source = source(&server.url());
        let records = source
            .search("serde", Some(&SearchFilter::with_limit(5)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);

        let serde = &records[0];
        assert_eq!(serde.source_type, SourceType::Crates);
        assert_eq!(serde.source_id.as_deref(), Some("serde"));
        assert_eq!(serde.weekly_downloads, Some(100_000));
        assert_eq!(serde.version.as_deref(), Some("1.0.200"));
        assert_eq!(serde.languages, vec!["Rust".to_string()]);
        assert_eq!(
            serde.package_url.as_deref(),
            Some("https://crates.io/crates/serde")
        );
        assert!(serde.last_updated.is_some());
    }

    #[test]
    fn test_transform_defaults_documentation_to_docs_rs() {
        let source = source("http://localhost:1");
        let record = source
            .transform_to_raw_record(&json!({"name": "tiny", "downloads": 0}))
            .unwrap();

        assert_eq!(record.documentation_url.as_deref(), Some("https://docs.rs/tiny"));
        assert_eq!(record.weekly_downloads, None);
        assert_eq!(record.category, "library");
    }
}
