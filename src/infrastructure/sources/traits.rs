//! The capability set every tool source implements

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::application::errors::SourceError;
use crate::domain::{DomainError, RawToolRecord, SourceType};

/// Upper bound on records a single trending fetch returns
pub const MAX_TRENDING_RECORDS: usize = 50;

/// Optional narrowing of a source search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    /// Records requested from the upstream search call
    pub limit: Option<usize>,
    /// Restrict to a language, where the source supports it
    pub language: Option<String>,
}

impl SearchFilter {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            language: None,
        }
    }
}

/// Request budget a source's client runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    pub max_requests: usize,
    pub window_ms: u64,
}

/// A tool catalog reachable over the network
#[async_trait]
pub trait ToolSource: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Up to [`MAX_TRENDING_RECORDS`] popular records
    async fn fetch_trending(&self) -> Result<Vec<RawToolRecord>, SourceError>;

    async fn search(
        &self,
        query: &str,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<RawToolRecord>, SourceError>;

    /// Map one native search item to a raw record
    fn transform_to_raw_record(&self, native: &Value) -> Result<RawToolRecord, DomainError>;

    async fn clear_cache(&self);

    fn rate_budget(&self) -> Option<RateBudget> {
        None
    }
}

/// Transform a batch of native items, logging and skipping the malformed ones
pub fn transform_batch<S: ToolSource + ?Sized>(source: &S, items: &[Value]) -> Vec<RawToolRecord> {
    items
        .iter()
        .filter_map(|item| match source.transform_to_raw_record(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(source = %source.source_type(), error = %e, "Skipping malformed item");
                None
            }
        })
        .collect()
}

/// Build a trending list by running each seed term through `search`.
///
/// Terms run sequentially. A failing term is logged and skipped; the call only
/// fails when every term failed, with the last error seen.
pub async fn collect_trending<S: ToolSource + ?Sized>(
    source: &S,
    seed_terms: &[&str],
    filter: &SearchFilter,
) -> Result<Vec<RawToolRecord>, SourceError> {
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut last_error = None;
    let mut succeeded = 0usize;

    for term in seed_terms {
        if records.len() >= MAX_TRENDING_RECORDS {
            break;
        }

        match source.search(term, Some(filter)).await {
            Ok(batch) => {
                succeeded += 1;
                for record in batch {
                    let key = record
                        .stable_source_id()
                        .map(str::to_string)
                        .unwrap_or_else(|| record.name.trim().to_lowercase());
                    if seen.insert(key) {
                        records.push(record);
                    }
                    if records.len() >= MAX_TRENDING_RECORDS {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!(source = %source.source_type(), term, error = %e, "Trending seed term failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if succeeded == 0 => Err(e),
        _ => {
            debug!(source = %source.source_type(), count = records.len(), "Collected trending records");
            Ok(records)
        }
    }
}
