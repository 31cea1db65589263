//! Deduplication and ranking of enriched tools

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::{RawToolRecord, ToolSummary, trending_rank};

/// Collapse records sharing (lowercased name, source type); the first occurrence wins
pub fn deduplicate_records(records: Vec<RawToolRecord>) -> Vec<RawToolRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.dedup_key()))
        .collect()
}

/// Drop tools under `min_popularity`, order by popularity plus weighted
/// quality, keep the best `max_results`
pub fn rank_trending(
    tools: Vec<ToolSummary>,
    min_popularity: f64,
    max_results: usize,
) -> Vec<ToolSummary> {
    let mut ranked: Vec<(f64, ToolSummary)> = tools
        .into_iter()
        .filter(|tool| tool.metrics.popularity >= min_popularity)
        .map(|tool| (trending_rank(tool.metrics.popularity, tool.metrics.quality), tool))
        .collect();

    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked
        .into_iter()
        .take(max_results)
        .map(|(_, tool)| tool)
        .collect()
}

/// Text relevance of a tool for a free-text query.
///
/// Name: exact 100, name contains query 50, query contains name 30.
/// Description +20, each matching tag +10, category +15.
pub fn relevance_score(tool: &ToolSummary, query: &str) -> f64 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }

    let name = tool.name.trim().to_lowercase();
    let mut score = if name == query {
        100.0
    } else if name.contains(&query) {
        50.0
    } else if !name.is_empty() && query.contains(&name) {
        30.0
    } else {
        0.0
    };

    if tool.description.to_lowercase().contains(&query) {
        score += 20.0;
    }

    let matching_tags = tool
        .tech
        .tags
        .iter()
        .filter(|tag| tag.to_lowercase().contains(&query))
        .count();
    score += matching_tags as f64 * 10.0;

    if tool.category.to_lowercase().contains(&query) {
        score += 15.0;
    }

    score
}

/// Order by relevance, then popularity, keep the best `max_results`
pub fn rank_search(tools: Vec<ToolSummary>, query: &str, max_results: usize) -> Vec<ToolSummary> {
    let mut ranked: Vec<(f64, ToolSummary)> = tools
        .into_iter()
        .map(|tool| (relevance_score(&tool, query), tool))
        .collect();

    ranked.sort_by(|a, b| match b.0.total_cmp(&a.0) {
        Ordering::Equal => b.1.metrics.popularity.total_cmp(&a.1.metrics.popularity),
        other => other,
    });

    ranked
        .into_iter()
        .take(max_results)
        .map(|(_, tool)| tool)
        .collect()
}
