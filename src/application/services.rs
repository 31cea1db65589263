//! Application services for orchestrating tool discovery

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::ApplicationError;
use super::ranking::{deduplicate_records, rank_search, rank_trending};
use super::recommendations::{
    RecommendationRequest, RecommendationResult, build_reasoning, complementary_categories,
    confidence_score, infer_stack_categories, select_recommendations, target_categories,
};
use crate::config::DiscoveryConfig;
use crate::domain::{
    DiscoveryReport, RawToolRecord, ScoringProfile, SourceType, ToolSummary, enrich_record,
    map_to_discovery_tool_dto,
};
use crate::infrastructure::repositories::{AggregatedRecords, ToolRepository};
use crate::infrastructure::sources::{RateBudget, SearchFilter};

/// Service exposing tool discovery to the web layer
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    /// Ranked trending tools plus per-source status
    async fn discover_trending_report(
        &self,
        config: Option<&DiscoveryConfig>,
        categories: Option<&[String]>,
    ) -> Result<DiscoveryReport, ApplicationError>;

    /// Relevance-ranked search results plus per-source status, optionally
    /// narrowed to one language on sources that can filter by it
    async fn search_report_in_language(
        &self,
        query: &str,
        language: Option<&str>,
        source_types: Option<&[SourceType]>,
        config: Option<&DiscoveryConfig>,
    ) -> Result<DiscoveryReport, ApplicationError>;

    /// Relevance-ranked search results plus per-source status
    async fn search_report(
        &self,
        query: &str,
        source_types: Option<&[SourceType]>,
        config: Option<&DiscoveryConfig>,
    ) -> Result<DiscoveryReport, ApplicationError> {
        self.search_report_in_language(query, None, source_types, config)
            .await
    }

    async fn generate_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResult, ApplicationError>;

    async fn clear_all_caches(&self);

    fn source_budgets(&self) -> Vec<(SourceType, Option<RateBudget>)>;

    /// The configuration calls run with unless they pass their own
    fn discovery_config(&self) -> &DiscoveryConfig;

    async fn discover_trending_tools(
        &self,
        config: Option<&DiscoveryConfig>,
        categories: Option<&[String]>,
    ) -> Result<Vec<ToolSummary>, ApplicationError> {
        Ok(self.discover_trending_report(config, categories).await?.tools)
    }

    async fn search_tools(
        &self,
        query: &str,
        source_types: Option<&[SourceType]>,
        config: Option<&DiscoveryConfig>,
    ) -> Result<Vec<ToolSummary>, ApplicationError> {
        Ok(self.search_report(query, source_types, config).await?.tools)
    }

    /// Pure canonicalization of a raw record, no I/O
    fn map_to_discovery_tool_dto(&self, raw: &RawToolRecord) -> ToolSummary {
        map_to_discovery_tool_dto(raw)
    }
}

/// Enriches, deduplicates and ranks what the tool repository aggregates
pub struct DiscoveryEngine {
    repository: Arc<dyn ToolRepository>,
    config: DiscoveryConfig,
    profile: ScoringProfile,
}

impl DiscoveryEngine {
    /// Create an engine; an invalid configuration fails here rather than
    /// producing empty results later
    pub fn new(
        repository: Arc<dyn ToolRepository>,
        config: DiscoveryConfig,
    ) -> Result<Self, ApplicationError> {
        config.validate()?;
        Ok(Self {
            repository,
            config,
            profile: ScoringProfile::default(),
        })
    }

    /// Replace the scoring rules and weights
    pub fn with_profile(mut self, profile: ScoringProfile) -> Self {
        self.profile = profile;
        self
    }

    fn effective_config<'a>(
        &'a self,
        config: Option<&'a DiscoveryConfig>,
    ) -> Result<&'a DiscoveryConfig, ApplicationError> {
        match config {
            Some(config) => {
                config.validate()?;
                if config.cache_expiry_seconds != self.config.cache_expiry_seconds {
                    debug!(
                        requested = config.cache_expiry_seconds,
                        active = self.config.cache_expiry_seconds,
                        "Per-call cache expiry is ignored; adapters keep their configured TTL"
                    );
                }
                Ok(config)
            }
            None => Ok(&self.config),
        }
    }

    /// Enabled sources that are also configured, optionally narrowed further
    fn select_sources(
        &self,
        config: &DiscoveryConfig,
        requested: Option<&[SourceType]>,
    ) -> Result<Vec<SourceType>, ApplicationError> {
        let available: Vec<SourceType> = self
            .repository
            .source_budgets()
            .into_iter()
            .map(|(source, _)| source)
            .collect();

        let selected: Vec<SourceType> = config
            .enabled_sources
            .iter()
            .copied()
            .filter(|s| available.contains(s))
            .filter(|s| requested.is_none_or(|r| r.contains(s)))
            .collect();

        if selected.is_empty() {
            return Err(ApplicationError::invalid_input(
                "sources",
                "none of the requested sources are enabled",
            ));
        }
        Ok(selected)
    }

    /// Fail when every invoked source failed, otherwise enrich and canonicalize
    fn process(&self, aggregated: AggregatedRecords) -> Result<Vec<ToolSummary>, ApplicationError> {
        if aggregated.all_failed() {
            let failures = aggregated.failures();
            warn!(failures = ?failures, "Every source failed");
            return Err(ApplicationError::AllSourcesFailed { failures });
        }

        let now = Utc::now();
        let tools: Vec<ToolSummary> = deduplicate_records(aggregated.records)
            .into_iter()
            .map(|record| map_to_discovery_tool_dto(&enrich_record(record, &self.profile, now)))
            .collect();
        Ok(tools)
    }
}

#[async_trait]
impl DiscoveryService for DiscoveryEngine {
    async fn discover_trending_report(
        &self,
        config: Option<&DiscoveryConfig>,
        categories: Option<&[String]>,
    ) -> Result<DiscoveryReport, ApplicationError> {
        let config = self.effective_config(config)?;
        let sources = self.select_sources(config, None)?;

        info!(sources = ?sources, categories = ?categories, "Discovering trending tools");
        let aggregated = self
            .repository
            .discover_trending(&sources, categories, config.max_tools_per_source)
            .await;
        let statuses = aggregated.statuses.clone();

        let tools = rank_trending(
            self.process(aggregated)?,
            config.min_popularity_threshold,
            config.max_results,
        );

        Ok(DiscoveryReport {
            tools,
            sources: statuses,
        })
    }

    async fn search_report_in_language(
        &self,
        query: &str,
        language: Option<&str>,
        source_types: Option<&[SourceType]>,
        config: Option<&DiscoveryConfig>,
    ) -> Result<DiscoveryReport, ApplicationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApplicationError::invalid_input("q", "query must not be empty"));
        }

        let config = self.effective_config(config)?;
        let sources = self.select_sources(config, source_types)?;

        let language = language.map(str::trim).filter(|l| !l.is_empty());
        info!(query, language, sources = ?sources, "Searching tools");
        let filter = SearchFilter {
            language: language.map(str::to_string),
            ..SearchFilter::with_limit(config.batch_size)
        };
        let aggregated = self
            .repository
            .search(query, &sources, &filter, config.max_tools_per_source)
            .await;
        let statuses = aggregated.statuses.clone();

        let tools = rank_search(self.process(aggregated)?, query, config.max_results);

        Ok(DiscoveryReport {
            tools,
            sources: statuses,
        })
    }

    async fn generate_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResult, ApplicationError> {
        let covered = infer_stack_categories(&request.user_stack);
        let complements = complementary_categories(&covered);
        let targets = target_categories(&request.user_categories, &complements);

        let sources = self.select_sources(&self.config, None)?;
        let categories = (!targets.is_empty()).then_some(targets.as_slice());
        let aggregated = self
            .repository
            .discover_trending(&sources, categories, self.config.max_tools_per_source)
            .await;

        let recommendations = select_recommendations(self.process(aggregated)?, request);
        let reasoning = build_reasoning(request, &covered, &complements, &recommendations);
        let confidence = confidence_score(&recommendations, request.user_stack.len());

        info!(
            recommendations = recommendations.len(),
            confidence,
            "Generated recommendations"
        );

        Ok(RecommendationResult {
            recommendations,
            reasoning,
            based_on_stack: request.user_stack.clone(),
            confidence_score: confidence,
            categories: targets,
        })
    }

    async fn clear_all_caches(&self) {
        self.repository.clear_all_caches().await;
    }

    fn source_budgets(&self) -> Vec<(SourceType, Option<RateBudget>)> {
        self.repository.source_budgets()
    }

    fn discovery_config(&self) -> &DiscoveryConfig {
        &self.config
    }
}
