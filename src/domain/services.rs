//! Domain services: the pure enrichment pipeline and DTO canonicalization
//!
//! Nothing in here performs I/O. Time-dependent scores take `now` explicitly.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entities::{
    RawToolRecord, ToolBadges, ToolLinks, ToolMetrics, ToolSummary, ToolTech,
};
use super::rules::{
    BEGINNER_TERMS, CategoryRuleSet, ENTERPRISE_KEYWORDS, EXPERT_TERMS, FREE_KEYWORDS,
    FREEMIUM_KEYWORDS, OPEN_LICENSE_MARKERS, PAID_KEYWORDS, PREFERRED_LICENSES, PopularityWeights,
};
use super::value_objects::{Difficulty, PricingTier};

/// Trending score at or above which a tool earns the trending badge
pub const TRENDING_BADGE_THRESHOLD: f64 = 70.0;
/// Weight of the quality score in the trending rank
pub const TRENDING_QUALITY_WEIGHT: f64 = 0.3;

/// Scoring data an engine instance runs with
#[derive(Debug, Clone, Default)]
pub struct ScoringProfile {
    pub rules: CategoryRuleSet,
    pub weights: PopularityWeights,
}

/// Run the full enrichment pipeline over one raw record
pub fn enrich_record(
    mut record: RawToolRecord,
    profile: &ScoringProfile,
    now: DateTime<Utc>,
) -> RawToolRecord {
    record.category = profile.rules.classify(&record);

    let popularity = popularity_score(&record, &profile.weights, now);
    let quality = quality_score(&record);
    record.popularity_score = Some(round_score(popularity));
    record.quality_score = Some(round_score(quality));
    record.trending_score = Some(round_score(trending_rank(popularity, quality).min(100.0)));

    record.difficulty = Some(estimate_difficulty(&record).as_str().to_string());

    // A pricing model reported by the source wins over the heuristic
    let tier = record
        .pricing_model
        .as_deref()
        .and_then(parse_pricing_tier)
        .unwrap_or_else(|| estimate_pricing(&record));
    if record.pricing_model.is_none() {
        record.pricing_model = Some(tier.as_str().to_string());
    }
    record.estimated_monthly_cost = Some(tier.monthly_cost());
    record.cost_category = Some(tier.cost_category().as_str().to_string());

    record
}

/// Rank value used to order trending listings
pub fn trending_rank(popularity: f64, quality: f64) -> f64 {
    popularity + TRENDING_QUALITY_WEIGHT * quality
}

/// Weighted popularity composite in [0, 100].
///
/// Metric signals (stars, forks, downloads or pulls) only count toward the
/// achievable maximum when the source reported them, so a record is never
/// penalized for a metric its source does not expose. A record with no metric
/// signal at all scores 0.
pub fn popularity_score(
    record: &RawToolRecord,
    weights: &PopularityWeights,
    now: DateTime<Utc>,
) -> f64 {
    let mut weighted = 0.0;
    let mut achievable = 0.0;

    if let Some(stars) = record.github_stars {
        weighted += weights.stars * log_normalize(stars, weights.stars_ceiling);
        achievable += weights.stars;
    }

    if let Some(forks) = record.github_forks {
        weighted += weights.forks * log_normalize(forks, weights.forks_ceiling);
        achievable += weights.forks;
    }

    let downloads = record
        .weekly_downloads
        .map(|d| log_normalize(d, weights.downloads_ceiling));
    let pulls = record
        .docker_pulls
        .map(|p| log_normalize(p, weights.pulls_ceiling));
    if let Some(signal) = match (downloads, pulls) {
        (Some(d), Some(p)) => Some(d.max(p)),
        (d, p) => d.or(p),
    } {
        weighted += weights.downloads * signal;
        achievable += weights.downloads;
    }

    if achievable == 0.0 {
        return 0.0;
    }

    if let Some(updated) = record.last_updated {
        let weeks = (now - updated).num_seconds() as f64 / (7.0 * 24.0 * 3600.0);
        let bonus = (1.0 - weeks / weights.recency_weeks).clamp(0.0, 1.0);
        weighted += weights.recency * bonus;
        achievable += weights.recency;
    }

    let documented = record.documentation_url.is_some() || record.homepage_url.is_some();
    weighted += weights.documentation * if documented { 1.0 } else { 0.0 };
    achievable += weights.documentation;

    (weighted / achievable * 100.0).clamp(0.0, 100.0)
}

/// Average of five 0..1 indicators, scaled to [0, 100]
pub fn quality_score(record: &RawToolRecord) -> f64 {
    let indicators = [
        license_indicator(record.license.as_deref()),
        documentation_indicator(record),
        description_indicator(&record.description),
        keyword_indicator(record.tags.len()),
        version_indicator(record.version.as_deref()),
    ];

    let average = indicators.iter().sum::<f64>() / indicators.len() as f64;
    (average * 100.0).clamp(0.0, 100.0)
}

fn license_indicator(license: Option<&str>) -> f64 {
    match license.map(|l| l.trim().to_lowercase()) {
        Some(l) if PREFERRED_LICENSES.contains(&l.as_str()) => 1.0,
        Some(l) if !l.is_empty() => 0.5,
        _ => 0.0,
    }
}

fn documentation_indicator(record: &RawToolRecord) -> f64 {
    let shared = [&record.homepage_url, &record.repository_url];
    match &record.documentation_url {
        Some(docs) if !shared.iter().any(|u| u.as_ref() == Some(docs)) => 1.0,
        Some(_) => 0.5,
        None if shared.iter().any(|u| u.is_some()) => 0.5,
        None => 0.0,
    }
}

fn description_indicator(description: &str) -> f64 {
    match description.trim().chars().count() {
        0 => 0.0,
        1..=19 => 0.2,
        20..=49 => 0.4,
        50..=99 => 0.7,
        _ => 1.0,
    }
}

fn keyword_indicator(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1..=2 => 0.4,
        3..=4 => 0.7,
        _ => 1.0,
    }
}

fn version_indicator(version: Option<&str>) -> f64 {
    match version.map(str::trim) {
        Some(v) if semver::Version::parse(v.strip_prefix('v').unwrap_or(v)).is_ok() => 1.0,
        _ => 0.0,
    }
}

/// Keyword vote over name, description and tags
pub fn estimate_difficulty(record: &RawToolRecord) -> Difficulty {
    difficulty_from_text(&record.search_text())
}

/// Keyword vote over already-lowercased text. A side needs at least two
/// votes and a strict majority to win.
pub fn difficulty_from_text(text: &str) -> Difficulty {
    let expert = EXPERT_TERMS.iter().filter(|t| text.contains(*t)).count();
    let beginner = BEGINNER_TERMS.iter().filter(|t| text.contains(*t)).count();

    if expert >= 2 && expert > beginner {
        Difficulty::Expert
    } else if beginner >= 2 && beginner > expert {
        Difficulty::Beginner
    } else {
        Difficulty::Intermediate
    }
}

/// License and keyword driven pricing estimate. Open licenses and explicit
/// free-software keywords short-circuit to free.
pub fn estimate_pricing(record: &RawToolRecord) -> PricingTier {
    let text = record.search_text();
    let license = record
        .license
        .as_deref()
        .map(|l| l.trim().to_lowercase())
        .unwrap_or_default();

    let open_license = OPEN_LICENSE_MARKERS.iter().any(|m| license.contains(m));
    if open_license || FREE_KEYWORDS.iter().any(|k| text.contains(k)) {
        return PricingTier::Free;
    }

    if ENTERPRISE_KEYWORDS.iter().any(|k| text.contains(k)) {
        PricingTier::Enterprise
    } else if PAID_KEYWORDS.iter().any(|k| text.contains(k))
        || license.contains("proprietary")
        || license.contains("commercial")
    {
        PricingTier::Paid
    } else if FREEMIUM_KEYWORDS.iter().any(|k| text.contains(k)) {
        PricingTier::Freemium
    } else {
        PricingTier::Free
    }
}

fn parse_pricing_tier(value: &str) -> Option<PricingTier> {
    match value.trim().to_lowercase().as_str() {
        "free" | "open-source" | "open source" => Some(PricingTier::Free),
        "freemium" => Some(PricingTier::Freemium),
        "paid" => Some(PricingTier::Paid),
        "enterprise" => Some(PricingTier::Enterprise),
        _ => None,
    }
}

/// Canonicalize a raw record into the external-facing summary.
///
/// Pure apart from the fallback identifier: when the record has no source id
/// a fresh uuid is generated, so repeated calls differ only in `id` and `slug`.
pub fn map_to_discovery_tool_dto(raw: &RawToolRecord) -> ToolSummary {
    let (id, slug) = match raw.stable_source_id() {
        Some(source_id) => (
            format!("{}:{}", raw.source_type, source_id),
            slugify(&format!("{}-{}", raw.source_type, source_id)),
        ),
        None => {
            let fallback = Uuid::new_v4().simple().to_string();
            let base = match slugify(&raw.name) {
                name if name.is_empty() => raw.source_type.as_str().to_string(),
                name => name,
            };
            (
                format!("{}:{}", raw.source_type, fallback),
                format!("{}-{}", base, &fallback[..8]),
            )
        }
    };

    let trending = score_or_zero(raw.trending_score);

    ToolSummary {
        id,
        slug,
        name: raw.name.trim().to_string(),
        description: raw.description.trim().to_string(),
        category: raw.category.clone(),
        source_type: raw.source_type,
        source_id: raw.stable_source_id().map(str::to_string),
        links: ToolLinks {
            homepage: raw.homepage_url.clone(),
            repository: raw.repository_url.clone(),
            documentation: raw.documentation_url.clone(),
            package: raw.package_url.clone(),
        },
        license: raw.license.clone(),
        version: raw.version.clone(),
        last_updated: raw.last_updated,
        cost_category: raw.cost_category.clone(),
        badges: ToolBadges {
            pricing: non_blank(raw.pricing_model.as_deref()).unwrap_or("unknown").to_string(),
            difficulty: non_blank(raw.difficulty.as_deref())
                .unwrap_or(Difficulty::Intermediate.as_str())
                .to_string(),
            trending: trending >= TRENDING_BADGE_THRESHOLD,
        },
        metrics: ToolMetrics {
            github_stars: raw.github_stars,
            github_forks: raw.github_forks,
            weekly_downloads: raw.weekly_downloads.or(raw.docker_pulls),
            trending,
            popularity: score_or_zero(raw.popularity_score),
            quality: score_or_zero(raw.quality_score),
            estimated_monthly_cost: raw.estimated_monthly_cost,
        },
        tech: ToolTech {
            languages: raw.languages.clone(),
            frameworks: raw.frameworks.clone(),
            tags: raw.tags.clone(),
        },
        evaluation: None,
    }
}

/// Lowercase, collapse every run of non-alphanumerics to one dash, trim dashes
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn log_normalize(value: u64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 {
        return 0.0;
    }
    ((value as f64 + 1.0).log10() / (ceiling + 1.0).log10()).clamp(0.0, 1.0)
}

fn score_or_zero(score: Option<f64>) -> f64 {
    score
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, 100.0))
        .unwrap_or(0.0)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceType;
    use chrono::Duration;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn scenario_record() -> RawToolRecord {
        serde_json::from_value(json!({
            "name": "Test Tool",
            "sourceType": "npm",
            "sourceId": "test-tool",
            "githubStars": 1200,
            "githubForks": 180,
            "npmWeeklyDownloads": 5400,
            "license": "MIT",
            "pricingModel": "freemium",
            "trendingScore": "65",
            "popularityScore": "75"
        }))
        .unwrap()
    }

    #[test]
    fn test_map_scenario_record() {
        let dto = map_to_discovery_tool_dto(&scenario_record());

        assert_eq!(dto.id, "npm:test-tool");
        assert_eq!(dto.slug, "npm-test-tool");
        assert_eq!(dto.badges.pricing, "freemium");
        assert_eq!(dto.metrics.github_stars, Some(1200));
        assert_eq!(dto.metrics.weekly_downloads, Some(5400));
        assert_eq!(dto.metrics.trending, 65.0);
        assert_eq!(dto.metrics.popularity, 75.0);
        assert!(!dto.badges.trending);
    }

    #[test]
    fn test_map_is_deterministic_with_source_id() {
        let record = scenario_record();
        assert_eq!(
            map_to_discovery_tool_dto(&record),
            map_to_discovery_tool_dto(&record)
        );
    }

    #[test]
    fn test_map_without_source_id_uses_fresh_fallback() {
        let record = RawToolRecord::new("Some Repo", SourceType::GitHub);

        let first = map_to_discovery_tool_dto(&record);
        let second = map_to_discovery_tool_dto(&record);

        assert!(first.id.starts_with("github:"));
        assert!(first.id.len() > "github:".len());
        assert_ne!(first.id, second.id);
        assert!(first.slug.starts_with("some-repo-"));
        assert_eq!(first.badges.pricing, "unknown");
        assert_eq!(first.metrics.weekly_downloads, None);
        assert_eq!(first.metrics.github_stars, None);
        assert_eq!(first.metrics.popularity, 0.0);
        assert_eq!(first.metrics.trending, 0.0);
        assert_eq!(first.metrics.quality, 0.0);

        // Only the fallback-derived fields differ
        let mut aligned = second.clone();
        aligned.id = first.id.clone();
        aligned.slug = first.slug.clone();
        assert_eq!(first, aligned);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("github-facebook/react"), "github-facebook-react");
        assert_eq!(slugify("npm-@scope/My Pkg"), "npm-scope-my-pkg");
        assert_eq!(slugify("--A__b--"), "a-b");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_popularity_does_not_penalize_missing_signals() {
        let weights = PopularityWeights::default();

        let mut stars_only = RawToolRecord::new("a", SourceType::GitHub);
        stars_only.github_stars = Some(50);
        let mut downloads_only = RawToolRecord::new("b", SourceType::Npm);
        downloads_only.weekly_downloads = Some(50_000);

        let stars_score = popularity_score(&stars_only, &weights, now());
        let downloads_score = popularity_score(&downloads_only, &weights, now());

        // Each is judged only against its own signal plus documentation:
        // 0.30 * log(51)/log(100_001) / 0.40 and 0.30 * log(50_001)/log(10^7 + 1) / 0.40
        assert!((stars_score - 25.61).abs() < 0.01, "stars only: {}", stars_score);
        assert!((downloads_score - 50.35).abs() < 0.01, "downloads only: {}", downloads_score);

        // A reported zero counts against the record; an absent signal does not
        let mut with_zero_downloads = stars_only.clone();
        with_zero_downloads.weekly_downloads = Some(0);
        let zero_score = popularity_score(&with_zero_downloads, &weights, now());
        assert!((zero_score - 14.64).abs() < 0.01, "zero downloads: {}", zero_score);
    }

    #[test]
    fn test_popularity_without_metrics_is_zero() {
        let mut record = RawToolRecord::new("a", SourceType::GitHub);
        record.homepage_url = Some("https://example.com".to_string());
        record.last_updated = Some(now());
        assert_eq!(
            popularity_score(&record, &PopularityWeights::default(), now()),
            0.0
        );
    }

    #[test]
    fn test_popularity_recency_decays_over_twenty_weeks() {
        let weights = PopularityWeights::default();
        let mut record = RawToolRecord::new("a", SourceType::GitHub);
        record.github_stars = Some(1000);

        record.last_updated = Some(now());
        let fresh = popularity_score(&record, &weights, now());
        record.last_updated = Some(now() - Duration::weeks(10));
        let aging = popularity_score(&record, &weights, now());
        record.last_updated = Some(now() - Duration::weeks(40));
        let stale = popularity_score(&record, &weights, now());

        assert!(fresh > aging);
        assert!(aging > stale);
    }

    #[test]
    fn test_popularity_is_bounded() {
        let mut record = RawToolRecord::new("huge", SourceType::GitHub);
        record.github_stars = Some(u64::MAX);
        record.github_forks = Some(u64::MAX);
        record.weekly_downloads = Some(u64::MAX);
        record.last_updated = Some(now() + Duration::weeks(3));
        record.documentation_url = Some("https://docs.example.com".to_string());

        let score = popularity_score(&record, &PopularityWeights::default(), now());
        assert!((0.0..=100.0).contains(&score));
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_quality_score_indicators() {
        let mut record = RawToolRecord::new("q", SourceType::Npm);
        assert_eq!(quality_score(&record), 0.0);

        record.license = Some("MIT".to_string());
        record.documentation_url = Some("https://docs.q.dev".to_string());
        record.homepage_url = Some("https://q.dev".to_string());
        record.description = "x".repeat(120);
        record.tags = vec!["a", "b", "c", "d", "e"]
            .into_iter()
            .map(String::from)
            .collect();
        record.version = Some("v1.2.3".to_string());
        assert_eq!(quality_score(&record), 100.0);

        record.license = Some("GPL-3.0".to_string());
        record.documentation_url = record.homepage_url.clone();
        record.version = Some("latest".to_string());
        // (0.5 + 0.5 + 1 + 1 + 0) / 5
        assert!((quality_score(&record) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_vote_requires_majority_of_two() {
        assert_eq!(
            difficulty_from_text("a distributed compiler toolkit"),
            Difficulty::Expert
        );
        assert_eq!(
            difficulty_from_text("a simple starter template"),
            Difficulty::Beginner
        );
        assert_eq!(
            difficulty_from_text("an advanced yet simple tool"),
            Difficulty::Intermediate
        );
        assert_eq!(
            difficulty_from_text("distributed and scalable but a simple minimal starter"),
            Difficulty::Beginner
        );
    }

    #[test]
    fn test_pricing_estimate() {
        let mut record = RawToolRecord::new("p", SourceType::GitHub);
        record.license = Some("Apache-2.0".to_string());
        record.description = "enterprise platform".to_string();
        assert_eq!(estimate_pricing(&record), PricingTier::Free);

        record.license = None;
        assert_eq!(estimate_pricing(&record), PricingTier::Enterprise);

        record.description = "commercial sdk".to_string();
        assert_eq!(estimate_pricing(&record), PricingTier::Paid);

        record.description = "hosted saas with a free tier".to_string();
        assert_eq!(estimate_pricing(&record), PricingTier::Freemium);

        record.description = "an open-source saas".to_string();
        assert_eq!(estimate_pricing(&record), PricingTier::Free);
    }

    #[test]
    fn test_enrich_record_fills_every_score() {
        let mut record = RawToolRecord::new("pg-orm", SourceType::Crates);
        record.source_id = Some("pg-orm".to_string());
        record.description = "A type-safe ORM and query builder for Postgres".to_string();
        record.weekly_downloads = Some(20_000);
        record.license = Some("MIT".to_string());
        record.version = Some("0.4.1".to_string());
        record.last_updated = Some(now() - Duration::weeks(1));

        let enriched = enrich_record(record, &ScoringProfile::default(), now());

        assert_eq!(enriched.category, "database");
        assert_eq!(enriched.pricing_model.as_deref(), Some("free"));
        assert_eq!(enriched.estimated_monthly_cost, Some(0.0));
        assert_eq!(enriched.cost_category.as_deref(), Some("free"));
        assert_eq!(enriched.difficulty.as_deref(), Some("intermediate"));

        let popularity = enriched.popularity_score.unwrap();
        let quality = enriched.quality_score.unwrap();
        let trending = enriched.trending_score.unwrap();
        assert!(popularity > 0.0 && popularity <= 100.0);
        assert!(quality > 0.0 && quality <= 100.0);
        assert!(trending >= popularity && trending <= 100.0);
    }

    #[test]
    fn test_enrich_keeps_reported_pricing_model() {
        let mut record = RawToolRecord::new("hosted", SourceType::GitHub);
        record.pricing_model = Some("enterprise".to_string());
        record.license = Some("MIT".to_string());

        let enriched = enrich_record(record, &ScoringProfile::default(), now());

        assert_eq!(enriched.pricing_model.as_deref(), Some("enterprise"));
        assert_eq!(enriched.estimated_monthly_cost, Some(500.0));
        assert_eq!(enriched.cost_category.as_deref(), Some("high"));
    }
}
