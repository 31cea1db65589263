//! Repository implementations

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::sources::{RateBudget, SearchFilter, ToolSource};
use crate::application::errors::SourceError;
use crate::domain::{RawToolRecord, SourceStatus, SourceType};

/// Merged raw records of one fan-out call plus the outcome of every source involved
#[derive(Debug, Clone, Default)]
pub struct AggregatedRecords {
    pub records: Vec<RawToolRecord>,
    pub statuses: Vec<SourceStatus>,
}

impl AggregatedRecords {
    /// True when at least one source was invoked and none succeeded
    pub fn all_failed(&self) -> bool {
        !self.statuses.is_empty() && self.statuses.iter().all(|s| !s.ok)
    }

    /// `"{source}: {error}"` for every failed source
    pub fn failures(&self) -> Vec<String> {
        self.statuses
            .iter()
            .filter(|s| !s.ok)
            .map(|s| {
                format!(
                    "{}: {}",
                    s.source,
                    s.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect()
    }
}

/// Repository trait for raw tool data across every configured catalog
#[async_trait]
pub trait ToolRepository: Send + Sync {
    /// Trending records from `sources`, optionally keeping only the given
    /// categories, at most `limit_per_source` records per source
    async fn discover_trending(
        &self,
        sources: &[SourceType],
        categories: Option<&[String]>,
        limit_per_source: usize,
    ) -> AggregatedRecords;

    async fn search(
        &self,
        query: &str,
        sources: &[SourceType],
        filter: &SearchFilter,
        limit_per_source: usize,
    ) -> AggregatedRecords;

    async fn clear_all_caches(&self);

    /// Configured sources with their request budgets, in fan-out order
    fn source_budgets(&self) -> Vec<(SourceType, Option<RateBudget>)>;
}

/// Aggregating repository that fans out to every tool source concurrently.
///
/// A failing source contributes zero records and a failed status; it never
/// fails the call as a whole.
pub struct AggregatingToolRepository {
    sources: Vec<Arc<dyn ToolSource>>,
}

impl AggregatingToolRepository {
    pub fn new(sources: Vec<Arc<dyn ToolSource>>) -> Self {
        Self { sources }
    }

    pub fn source_types(&self) -> Vec<SourceType> {
        self.sources.iter().map(|s| s.source_type()).collect()
    }

    /// Run `op` against every selected source, one task per source.
    /// Outcomes come back in source order regardless of completion order.
    async fn fan_out<F, Fut>(
        &self,
        selected: &[SourceType],
        op: F,
    ) -> Vec<(SourceType, Option<Result<Vec<RawToolRecord>, SourceError>>)>
    where
        F: Fn(Arc<dyn ToolSource>) -> Fut,
        Fut: Future<Output = Result<Vec<RawToolRecord>, SourceError>> + Send + 'static,
    {
        let targets: Vec<Arc<dyn ToolSource>> = self
            .sources
            .iter()
            .filter(|s| selected.contains(&s.source_type()))
            .cloned()
            .collect();

        let mut join_set = JoinSet::new();
        for (index, source) in targets.iter().enumerate() {
            let task = op(source.clone());
            join_set.spawn(async move { (index, task.await) });
        }

        let mut outcomes: Vec<Option<Result<Vec<RawToolRecord>, SourceError>>> =
            targets.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!(error = %e, "Source task failed to complete"),
            }
        }

        targets
            .iter()
            .map(|s| s.source_type())
            .zip(outcomes)
            .collect()
    }

    fn merge(
        outcomes: Vec<(SourceType, Option<Result<Vec<RawToolRecord>, SourceError>>)>,
        categories: Option<&[String]>,
        limit_per_source: usize,
    ) -> AggregatedRecords {
        let categories: Option<Vec<String>> = categories
            .filter(|c| !c.is_empty())
            .map(|c| c.iter().map(|c| c.trim().to_lowercase()).collect());

        let mut aggregated = AggregatedRecords::default();
        for (source, outcome) in outcomes {
            match outcome {
                Some(Ok(records)) => {
                    let kept: Vec<RawToolRecord> = records
                        .into_iter()
                        .filter(|r| match &categories {
                            Some(wanted) => wanted.contains(&r.category.to_lowercase()),
                            None => true,
                        })
                        .take(limit_per_source)
                        .collect();

                    debug!(source = %source, records = kept.len(), "Source returned records");
                    aggregated
                        .statuses
                        .push(SourceStatus::succeeded(source, kept.len()));
                    aggregated.records.extend(kept);
                }
                Some(Err(e)) => {
                    warn!(source = %source, error = %e, "Source query failed");
                    aggregated
                        .statuses
                        .push(SourceStatus::failed(source, e.to_string()));
                }
                None => {
                    aggregated
                        .statuses
                        .push(SourceStatus::failed(source, "source task did not complete"));
                }
            }
        }

        let successful = aggregated.statuses.iter().filter(|s| s.ok).count();
        info!(
            successful_sources = successful,
            failed_sources = aggregated.statuses.len() - successful,
            records = aggregated.records.len(),
            "Aggregated tool records"
        );
        aggregated
    }
}

#[async_trait]
impl ToolRepository for AggregatingToolRepository {
    async fn discover_trending(
        &self,
        sources: &[SourceType],
        categories: Option<&[String]>,
        limit_per_source: usize,
    ) -> AggregatedRecords {
        let outcomes = self
            .fan_out(sources, |source| async move { source.fetch_trending().await })
            .await;
        Self::merge(outcomes, categories, limit_per_source)
    }

    async fn search(
        &self,
        query: &str,
        sources: &[SourceType],
        filter: &SearchFilter,
        limit_per_source: usize,
    ) -> AggregatedRecords {
        let outcomes = self
            .fan_out(sources, |source| {
                let query = query.to_string();
                let filter = filter.clone();
                async move { source.search(&query, Some(&filter)).await }
            })
            .await;
        Self::merge(outcomes, None, limit_per_source)
    }

    async fn clear_all_caches(&self) {
        for source in &self.sources {
            source.clear_cache().await;
        }
        info!(sources = self.sources.len(), "Cleared all source caches");
    }

    fn source_budgets(&self) -> Vec<(SourceType, Option<RateBudget>)> {
        self.sources
            .iter()
            .map(|s| (s.source_type(), s.rate_budget()))
            .collect()
    }
}
