//! Source-side heuristics applied while transforming native items
//!
//! These are coarse first guesses. The discovery engine re-scores every record
//! with the full rule set; adapters only need something sensible to pass on.

use chrono::{DateTime, Utc};

use crate::domain::{DEFAULT_CATEGORY, Difficulty, difficulty_from_text};

/// Short fixed taxonomy used by the adapters, checked in order.
///
/// Bucket names are the engine's rule names, so a category filter applied to
/// adapter output can select anything the engine classifies into. Buckets with
/// narrow vocabularies come first ("time series database" is monitoring).
const SOURCE_TAXONOMY: &[(&str, &[&str])] = &[
    ("testing", &["test", "testing", "mock", "assert", "spec"]),
    (
        "monitoring",
        &["monitoring", "observability", "metrics", "prometheus", "grafana", "alerting", "apm"],
    ),
    ("mobile", &["mobile", "android", "ios", "flutter", "react native", "swiftui"]),
    ("database", &["database", "sql", "orm", "postgres", "mongo", "redis"]),
    ("frontend", &["frontend", "react", "vue", "angular", "svelte", "css", "ui"]),
    ("backend", &["backend", "server", "http", "api", "framework", "web"]),
    (
        "data-processing",
        &["etl", "dataframe", "kafka", "spark", "analytics", "data pipeline", "stream processing"],
    ),
    ("devops", &["devops", "docker", "kubernetes", "deploy", "ci", "infrastructure"]),
    ("ai-ml", &["machine learning", "ml", "ai", "llm", "neural"]),
    ("cli", &["cli", "command line", "terminal"]),
    ("security", &["security", "auth", "crypto", "jwt"]),
];

/// Place a tool in the short taxonomy by keyword containment.
///
/// Single words match whole tokens only, so "ui" does not match "build".
pub fn categorize(name: &str, description: &str, keywords: &[String]) -> String {
    let text = format!("{} {} {}", name, description, keywords.join(" ")).to_lowercase();
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    SOURCE_TAXONOMY
        .iter()
        .find(|(_, terms)| {
            terms.iter().any(|term| {
                if term.contains(' ') {
                    text.contains(term)
                } else {
                    tokens.contains(term)
                }
            })
        })
        .map(|(category, _)| category.to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Log-scaled popularity guess from whichever metrics the source exposes,
/// plus a recency bonus (+10 within 30 days, +5 within 90).
pub fn estimate_popularity(
    metrics: &[u64],
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let base = if metrics.is_empty() {
        0.0
    } else {
        // 10^6 of anything saturates the signal
        let sum: f64 = metrics
            .iter()
            .map(|m| ((*m as f64 + 1.0).log10() / 6.0).min(1.0))
            .sum();
        sum / metrics.len() as f64 * 85.0
    };

    let bonus = match last_updated.map(|updated| (now - updated).num_days()) {
        Some(days) if days <= 30 => 10.0,
        Some(days) if days <= 90 => 5.0,
        _ => 0.0,
    };

    (base + bonus).clamp(0.0, 100.0)
}

/// Difficulty guess from the same vocabularies the engine votes with
pub fn estimate_difficulty(name: &str, description: &str, keywords: &[String]) -> Difficulty {
    let text = format!("{} {} {}", name, description, keywords.join(" ")).to_lowercase();
    difficulty_from_text(&text)
}

/// Parse an RFC 3339 timestamp, ignoring anything unparseable
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
