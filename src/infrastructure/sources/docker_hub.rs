//! Docker Hub image search source

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
use crate::domain::{DEFAULT_CATEGORY, DomainError, RawToolRecord, SourceType};
use crate::infrastructure::api_clients::{RateLimitedClient, RequestOptions};

const TRENDING_SEED_TERMS: &[&str] = &["database", "web server", "monitoring", "ci", "runtime"];

const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct DockerSearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct DockerRepository {
    repo_name: String,
    short_description: Option<String>,
    #[serde(default)]
    star_count: u64,
    #[serde(default)]
    pull_count: u64,
    #[serde(default)]
    is_official: bool,
    last_updated: Option<String>,
}

pub struct DockerHubSource {
    client: RateLimitedClient,
    batch_size: usize,
    cache_ttl: Duration,
}

impl DockerHubSource {
    pub fn new(config: &SourceConfig, discovery: &DiscoveryConfig) -> Result<Self, SourceError> {
        let client = super::build_client(
            SourceType::DockerHub,
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
impl ToolSource for DockerHubSource {
    fn source_type(&self) -> SourceType {
        SourceType::DockerHub
    }

    async fn fetch_trending(&self) -> Result<Vec<RawToolRecord>, SourceError> {
        collect_trending(
            self,
            TRENDING_SEED_TERMS,
            &SearchFilter::with_limit(self.batch_size),
        )
        .await
    }

    /// Images carry no language metadata, so a language filter is ignored
    async fn search(
        &self,
        query: &str,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<RawToolRecord>, SourceError> {
        let page_size = filter
            .and_then(|f| f.limit)
            .unwrap_or(self.batch_size)
            .clamp(1, MAX_PAGE_SIZE);
        let cache_key = format!("dockerhub:search:{}:{}", query.to_lowercase(), page_size);
        let options = RequestOptions::new()
            .query("query", query)
            .query("page_size", page_size);

        let response: DockerSearchResponse = self
            .client
            .request(
                "v2/search/repositories/",
                &options,
                Some(cache_key.as_str()),
                self.cache_ttl,
            )
            .await?;

        let records = transform_batch(self, &response.results);
        debug!(query, count = records.len(), "Docker Hub search complete");
        Ok(records)
    }

    fn transform_to_raw_record(&self, native: &Value) -> Result<RawToolRecord, DomainError> {
        let repo = DockerRepository::deserialize(native).map_err(|e| DomainError::MalformedRecord {
            source_type: SourceType::DockerHub.to_string(),
            message: e.to_string(),
        })?;

        let repo_name = repo.repo_name.trim().to_string();
        if repo_name.is_empty() {
            return Err(DomainError::MalformedRecord {
                source_type: SourceType::DockerHub.to_string(),
                message: "image has no repo_name".to_string(),
            });
        }

        // Official images are published as "library/<name>" or a bare name
        let display_name = repo_name
            .strip_prefix("library/")
            .unwrap_or(&repo_name)
            .to_string();
        let package_url = if repo.is_official {
            format!("https://hub.docker.com/_/{}", display_name)
        } else {
            format!("https://hub.docker.com/r/{}", repo_name)
        };

        let mut tags = vec!["docker".to_string(), "container".to_string()];
        if repo.is_official {
            tags.push("official".to_string());
        }

        let description = repo.short_description.unwrap_or_default();
        let last_updated = parse_timestamp(repo.last_updated.as_deref());

        let category = match categorize(&display_name, &description, &[]) {
            category if category == DEFAULT_CATEGORY => "devops".to_string(),
            category => category,
        };

        let mut record = RawToolRecord::new(display_name.clone(), SourceType::DockerHub);
        record.category = category;
        record.difficulty = Some(estimate_difficulty(&display_name, &description, &[]).to_string());
        record.popularity_score = Some(estimate_popularity(
            &[repo.pull_count, repo.star_count],
            last_updated,
            Utc::now(),
        ));
        record.description = description;
        record.source_id = Some(repo_name);
        record.package_url = Some(package_url);
        record.tags = tags;
        record.docker_pulls = Some(repo.pull_count);
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
