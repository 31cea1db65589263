//! Personalized recommendation heuristics
//!
//! Confidence and industry alignment are fixed keyword heuristics, not a
//! calibrated model.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{Difficulty, ToolSummary};

/// Number of recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 15;
/// Number of justification strings returned
pub const MAX_REASONS: usize = 3;

const CATEGORY_MATCH_BOOST: f64 = 1.3;
const LANGUAGE_MATCH_BOOST: f64 = 1.2;
const TEAM_FIT_BOOST: f64 = 1.1;
const INDUSTRY_MATCH_BOOST: f64 = 1.15;

/// Popularity at which a recommendation counts toward confidence
const HIGH_POPULARITY: f64 = 70.0;

/// Tool-name fragments that reveal which categories a stack already covers
const TOOL_CATEGORY_HINTS: &[(&str, &str)] = &[
    ("react", "frontend"),
    ("vue", "frontend"),
    ("angular", "frontend"),
    ("svelte", "frontend"),
    ("next", "frontend"),
    ("express", "backend"),
    ("django", "backend"),
    ("flask", "backend"),
    ("rails", "backend"),
    ("spring", "backend"),
    ("fastapi", "backend"),
    ("axum", "backend"),
    ("postgres", "database"),
    ("mysql", "database"),
    ("mongo", "database"),
    ("redis", "database"),
    ("sqlite", "database"),
    ("docker", "devops"),
    ("kubernetes", "devops"),
    ("terraform", "devops"),
    ("jenkins", "devops"),
    ("jest", "testing"),
    ("pytest", "testing"),
    ("cypress", "testing"),
    ("playwright", "testing"),
    ("prometheus", "monitoring"),
    ("grafana", "monitoring"),
    ("sentry", "monitoring"),
    ("tensorflow", "ai-ml"),
    ("pytorch", "ai-ml"),
    ("kafka", "data-processing"),
    ("spark", "data-processing"),
    ("flutter", "mobile"),
    ("swift", "mobile"),
];

/// Categories that usually accompany a covered category
const COMPLEMENTARY_CATEGORIES: &[(&str, &[&str])] = &[
    ("frontend", &["testing", "backend", "monitoring"]),
    ("backend", &["database", "testing", "monitoring", "security"]),
    ("database", &["backend", "monitoring", "data-processing"]),
    ("devops", &["monitoring", "security"]),
    ("testing", &["devops"]),
    ("ai-ml", &["data-processing", "database"]),
    ("mobile", &["backend", "testing"]),
    ("monitoring", &["devops"]),
    ("data-processing", &["database", "ai-ml"]),
    ("security", &["monitoring"]),
    ("cli", &["testing"]),
];

const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    ("fintech", &["payment", "finance", "banking", "ledger", "compliance"]),
    ("healthcare", &["health", "medical", "hipaa", "fhir", "patient"]),
    ("ecommerce", &["commerce", "shop", "cart", "payment", "checkout"]),
    ("gaming", &["game", "graphics", "realtime", "engine"]),
    ("education", &["learning", "course", "education", "student"]),
    ("media", &["video", "streaming", "media", "image", "audio"]),
];

/// What the caller already uses and prefers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationRequest {
    pub user_stack: Vec<String>,
    pub user_categories: Vec<String>,
    pub user_languages: Vec<String>,
    pub team_size: Option<u32>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub recommendations: Vec<ToolSummary>,
    pub reasoning: Vec<String>,
    pub based_on_stack: Vec<String>,
    pub confidence_score: f64,
    /// Categories the recommendations were drawn from
    pub categories: Vec<String>,
}

/// Categories the current stack covers, in stack order
pub fn infer_stack_categories(user_stack: &[String]) -> Vec<String> {
    let mut categories = Vec::new();
    for tool in user_stack {
        let tool = tool.to_lowercase();
        for (hint, category) in TOOL_CATEGORY_HINTS {
            if tool.contains(hint) && !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
    }
    categories
}

/// Adjacent categories of everything in `covered`, without duplicates and
/// without anything `covered` already contains
pub fn complementary_categories(covered: &[String]) -> Vec<String> {
    let mut complements: Vec<String> = Vec::new();
    for category in covered {
        let adjacent = COMPLEMENTARY_CATEGORIES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(category))
            .map(|(_, adjacent)| *adjacent)
            .unwrap_or_default();
        for candidate in adjacent {
            let already_covered = covered.iter().any(|c| c.eq_ignore_ascii_case(candidate));
            if !already_covered && !complements.iter().any(|c| c == candidate) {
                complements.push(candidate.to_string());
            }
        }
    }
    complements
}

/// Preferred categories followed by the complements of the stack, deduplicated
pub fn target_categories(preferred: &[String], complements: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    preferred
        .iter()
        .chain(complements)
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

fn difficulty_for_team(team_size: u32) -> Difficulty {
    match team_size {
        0..=3 => Difficulty::Beginner,
        4..=20 => Difficulty::Intermediate,
        _ => Difficulty::Expert,
    }
}

fn industry_keywords(industry: &str) -> &'static [&'static str] {
    let industry = industry.trim().to_lowercase();
    INDUSTRY_KEYWORDS
        .iter()
        .find(|(name, _)| industry.contains(name))
        .map(|(_, keywords)| *keywords)
        .unwrap_or_default()
}

fn matches_industry(tool: &ToolSummary, keywords: &[&str]) -> bool {
    let text = format!(
        "{} {} {}",
        tool.name,
        tool.description,
        tool.tech.tags.join(" ")
    )
    .to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}

fn matches_language(tool: &ToolSummary, languages: &[String]) -> bool {
    tool.tech
        .languages
        .iter()
        .any(|l| languages.iter().any(|wanted| wanted.eq_ignore_ascii_case(l)))
}

/// Popularity scaled by how well the tool fits the request
pub fn contextual_score(tool: &ToolSummary, request: &RecommendationRequest) -> f64 {
    let mut score = tool.metrics.popularity;

    if request
        .user_categories
        .iter()
        .any(|c| c.trim().eq_ignore_ascii_case(&tool.category))
    {
        score *= CATEGORY_MATCH_BOOST;
    }

    if matches_language(tool, &request.user_languages) {
        score *= LANGUAGE_MATCH_BOOST;
    }

    if let Some(team_size) = request.team_size {
        if tool.badges.difficulty == difficulty_for_team(team_size).as_str() {
            score *= TEAM_FIT_BOOST;
        }
    }

    if let Some(industry) = &request.industry {
        if matches_industry(tool, industry_keywords(industry)) {
            score *= INDUSTRY_MATCH_BOOST;
        }
    }

    score
}

/// Drop tools already in the stack and duplicates, rank by contextual score,
/// keep the top [`MAX_RECOMMENDATIONS`]
pub fn select_recommendations(
    candidates: Vec<ToolSummary>,
    request: &RecommendationRequest,
) -> Vec<ToolSummary> {
    let stack: HashSet<String> = request
        .user_stack
        .iter()
        .map(|t| t.trim().to_lowercase())
        .collect();
    let mut seen = HashSet::new();

    let mut scored: Vec<(f64, ToolSummary)> = candidates
        .into_iter()
        .filter(|tool| !stack.contains(&tool.name.trim().to_lowercase()))
        .filter(|tool| seen.insert((tool.name.trim().to_lowercase(), tool.source_type)))
        .map(|tool| (contextual_score(&tool, request), tool))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(_, tool)| tool)
        .collect()
}

/// 0-100 from the number of highly popular picks, category diversity and
/// stack size; 0 when nothing was recommended
pub fn confidence_score(recommendations: &[ToolSummary], stack_size: usize) -> f64 {
    if recommendations.is_empty() {
        return 0.0;
    }

    let high_popularity = recommendations
        .iter()
        .filter(|t| t.metrics.popularity >= HIGH_POPULARITY)
        .count()
        .min(5);
    let diversity = recommendations
        .iter()
        .map(|t| t.category.as_str())
        .collect::<HashSet<_>>()
        .len()
        .min(4);
    let stack_bonus = if stack_size > 3 { 20.0 } else { 10.0 };

    (high_popularity as f64 * 10.0 + diversity as f64 * 7.5 + stack_bonus).clamp(0.0, 100.0)
}

/// Up to [`MAX_REASONS`] human-readable justifications
pub fn build_reasoning(
    request: &RecommendationRequest,
    covered: &[String],
    complements: &[String],
    recommendations: &[ToolSummary],
) -> Vec<String> {
    let mut reasons = Vec::new();

    if !covered.is_empty() && !complements.is_empty() {
        reasons.push(format!(
            "Your stack already covers {}; these picks add {}",
            covered.join(", "),
            complements.join(", ")
        ));
    } else if !request.user_categories.is_empty() {
        reasons.push(format!(
            "Focused on your preferred categories: {}",
            request.user_categories.join(", ")
        ));
    }

    let language_matches = recommendations
        .iter()
        .filter(|t| matches_language(t, &request.user_languages))
        .count();
    if language_matches > 0 {
        reasons.push(format!(
            "{} recommendations use your preferred languages ({})",
            language_matches,
            request.user_languages.join(", ")
        ));
    }

    if let Some(industry) = request.industry.as_deref().filter(|i| !i.trim().is_empty()) {
        let keywords = industry_keywords(industry);
        if recommendations.iter().any(|t| matches_industry(t, keywords)) {
            reasons.push(format!("Prioritized tools relevant to {}", industry.trim()));
        }
    }

    if let Some(team_size) = request.team_size {
        reasons.push(format!(
            "Favored {} tools for a team of {}",
            difficulty_for_team(team_size),
            team_size
        ));
    }

    reasons.truncate(MAX_REASONS);
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryRuleSet, RawToolRecord, SourceType, map_to_discovery_tool_dto};

    fn tool(name: &str, category: &str, popularity: f64) -> ToolSummary {
        let mut record = RawToolRecord::new(name, SourceType::Npm);
        record.source_id = Some(name.to_string());
        record.category = category.to_string();
        record.popularity_score = Some(popularity);
        map_to_discovery_tool_dto(&record)
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_infer_and_complement_categories() {
        let covered = infer_stack_categories(&strings(&["React", "express", "PostgreSQL"]));
        assert_eq!(covered, strings(&["frontend", "backend", "database"]));

        let complements = complementary_categories(&covered);
        assert_eq!(
            complements,
            strings(&["testing", "monitoring", "security", "data-processing"])
        );
        assert!(complements.iter().all(|c| !covered.contains(c)));

        let targets = target_categories(&strings(&["Security", "ai-ml"]), &complements);
        assert_eq!(targets[0], "security");
        assert_eq!(targets[1], "ai-ml");
        assert_eq!(targets.iter().filter(|c| *c == "security").count(), 1);
    }

    #[test]
    fn test_adjacency_uses_engine_categories() {
        let rules = CategoryRuleSet::default();
        let known = |name: &str| rules.rules().iter().any(|r| r.name == name);

        for (category, adjacent) in COMPLEMENTARY_CATEGORIES {
            assert!(known(category), "unknown category {}", category);
            assert!(adjacent.iter().all(|a| known(a)), "unknown complement of {}", category);
        }
        for (_, category) in TOOL_CATEGORY_HINTS {
            assert!(known(category), "unknown hint category {}", category);
        }
    }

    #[test]
    fn test_contextual_multipliers() {
        let mut candidate = tool("ledger-kit", "backend", 50.0);
        candidate.tech.languages = strings(&["Rust"]);
        candidate.description = "payment processing".to_string();

        let plain = RecommendationRequest::default();
        assert_eq!(contextual_score(&candidate, &plain), 50.0);

        let request = RecommendationRequest {
            user_categories: strings(&["backend"]),
            user_languages: strings(&["rust"]),
            team_size: Some(10),
            industry: Some("Fintech".to_string()),
            ..Default::default()
        };
        let expected = 50.0 * 1.3 * 1.2 * 1.1 * 1.15;
        assert!((contextual_score(&candidate, &request) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_select_excludes_stack_and_caps() {
        let mut candidates: Vec<ToolSummary> = (0..20)
            .map(|i| tool(&format!("tool-{}", i), "testing", i as f64))
            .collect();
        candidates.push(tool("jest", "testing", 99.0));
        candidates.push(tool("tool-19", "testing", 1.0));

        let request = RecommendationRequest {
            user_stack: strings(&["Jest"]),
            ..Default::default()
        };
        let selected = select_recommendations(candidates, &request);

        assert_eq!(selected.len(), MAX_RECOMMENDATIONS);
        assert!(selected.iter().all(|t| t.name != "jest"));
        assert_eq!(selected[0].name, "tool-19");
        assert_eq!(selected[0].metrics.popularity, 19.0);
    }

    #[test]
    fn test_confidence_score() {
        assert_eq!(confidence_score(&[], 10), 0.0);

        let picks = vec![
            tool("a", "testing", 90.0),
            tool("b", "database", 75.0),
            tool("c", "database", 20.0),
        ];
        // 2 popular * 10 + 2 categories * 7.5 + small stack 10
        assert_eq!(confidence_score(&picks, 2), 45.0);
        assert_eq!(confidence_score(&picks, 4), 55.0);
    }

    #[test]
    fn test_reasoning_is_capped() {
        let mut pick = tool("pay", "backend", 80.0);
        pick.tech.languages = strings(&["Go"]);
        pick.description = "payment gateway".to_string();

        let request = RecommendationRequest {
            user_stack: strings(&["react"]),
            user_languages: strings(&["go"]),
            team_size: Some(2),
            industry: Some("fintech".to_string()),
            ..Default::default()
        };
        let reasons = build_reasoning(
            &request,
            &strings(&["frontend"]),
            &strings(&["testing"]),
            &[pick],
        );

        assert_eq!(reasons.len(), MAX_REASONS);
        assert!(reasons[0].contains("frontend"));
        assert!(reasons[1].starts_with("1 recommendations"));
        assert!(reasons[2].contains("fintech"));
    }
}
