//! GitHub repository search source

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::heuristics::{categorize, estimate_difficulty, estimate_popularity, parse_timestamp};
use super::traits::{RateBudget, SearchFilter, ToolSource, collect_trending, transform_batch};
use crate::application::errors::SourceError;
use crate::config::{DiscoveryConfig, GitHubSourceConfig};
use crate::domain::{DomainError, RawToolRecord, SourceType};
use crate::infrastructure::api_clients::{RateLimitedClient, RequestOptions};

const TRENDING_SEED_TERMS: &[&str] = &[
    "topic:developer-tools stars:>1000",
    "topic:cli stars:>1000",
    "topic:framework stars:>1000",
    "topic:devops stars:>1000",
    "topic:database stars:>1000",
];

const MAX_PAGE_SIZE: usize = 100;
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct GitHubSearchResponse {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    full_name: Option<String>,
    description: Option<String>,
    html_url: Option<String>,
    homepage: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    license: Option<GitHubLicense>,
    pushed_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubLicense {
    spdx_id: Option<String>,
    name: Option<String>,
}

impl GitHubLicense {
    fn identifier(self) -> Option<String> {
        self.spdx_id
            .filter(|id| !id.is_empty() && id != "NOASSERTION")
            .or(self.name)
    }
}

/// GitHub `/search/repositories`, sorted by stars
pub struct GitHubSource {
    client: RateLimitedClient,
    batch_size: usize,
    cache_ttl: Duration,
}

impl GitHubSource {
    pub fn new(config: &GitHubSourceConfig, discovery: &DiscoveryConfig) -> Result<Self, SourceError> {
        let token = config.token().map(str::to_string);
        if token.is_none() {
            info!("GitHub token not provided; using the unauthenticated search budget");
        }

        let client = super::build_client(
            SourceType::GitHub,
            &config.base_url,
            config.timeout_seconds,
            &config.effective_rate_limit(),
        )?
        .with_bearer_token(token);

        Ok(Self {
            client,
            batch_size: discovery.batch_size,
            cache_ttl: discovery.cache_expiry(),
        })
    }
}

#[async_trait]
impl ToolSource for GitHubSource {
    fn source_type(&self) -> SourceType {
        SourceType::GitHub
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
        let per_page = filter
            .and_then(|f| f.limit)
            .unwrap_or(self.batch_size)
            .clamp(1, MAX_PAGE_SIZE);
        let q = match filter.and_then(|f| f.language.as_deref()) {
            Some(language) => format!("{} language:{}", query, language),
            None => query.to_string(),
        };
        let cache_key = format!("github:search:{}:{}", q.to_lowercase(), per_page);
        let options = RequestOptions::new()
            .query("q", &q)
            .query("sort", "stars")
            .query("order", "desc")
            .query("per_page", per_page)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        let response: GitHubSearchResponse = self
            .client
            .request("search/repositories", &options, Some(cache_key.as_str()), self.cache_ttl)
            .await?;

        let records = transform_batch(self, &response.items);
        debug!(query = %q, count = records.len(), "GitHub search complete");
        Ok(records)
    }

    fn transform_to_raw_record(&self, native: &Value) -> Result<RawToolRecord, DomainError> {
        let repo = GitHubRepository::deserialize(native).map_err(|e| DomainError::MalformedRecord {
            source_type: SourceType::GitHub.to_string(),
            message: e.to_string(),
        })?;

        let name = repo.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::MalformedRecord {
                source_type: SourceType::GitHub.to_string(),
                message: "repository has no name".to_string(),
            });
        }

        let description = repo.description.unwrap_or_default();
        let last_updated = parse_timestamp(repo.pushed_at.as_deref())
            .or_else(|| parse_timestamp(repo.updated_at.as_deref()));
        let popularity = estimate_popularity(
            &[repo.stargazers_count, repo.forks_count],
            last_updated,
            Utc::now(),
        );

        let mut record = RawToolRecord::new(name.clone(), SourceType::GitHub);
        record.category = categorize(&name, &description, &repo.topics);
        record.difficulty = Some(estimate_difficulty(&name, &description, &repo.topics).to_string());
        record.popularity_score = Some(popularity);
        record.description = description;
        record.source_id = repo.full_name.filter(|n| !n.trim().is_empty());
        record.homepage_url = repo.homepage.filter(|h| !h.trim().is_empty());
        record.repository_url = repo.html_url;
        record.languages = repo.language.into_iter().collect();
        record.tags = repo.topics;
        record.github_stars = Some(repo.stargazers_count);
        record.github_forks = Some(repo.forks_count);
        record.license = repo.license.and_then(GitHubLicense::identifier);
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
