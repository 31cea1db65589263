//! Domain entities representing discovered tools

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::errors::DomainError;
use super::value_objects::SourceType;

/// Category assigned when neither the source nor the rule set can place a tool
pub const DEFAULT_CATEGORY: &str = "library";

/// Source-agnostic intermediate shape produced by a source adapter.
///
/// Records are ephemeral: one is built per adapter call, enriched by the
/// discovery engine and then mapped to a [`ToolSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawToolRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub source_id: Option<String>,

    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub documentation_url: Option<String>,
    #[serde(default)]
    pub package_url: Option<String>,

    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub github_stars: Option<u64>,
    #[serde(default)]
    pub github_forks: Option<u64>,
    /// Weekly downloads reported (or estimated) by a package registry
    #[serde(default, alias = "npmWeeklyDownloads")]
    pub weekly_downloads: Option<u64>,
    #[serde(default)]
    pub docker_pulls: Option<u64>,

    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub pricing_model: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub popularity_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub trending_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub quality_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub estimated_monthly_cost: Option<f64>,
    #[serde(default)]
    pub cost_category: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Accept scores as JSON numbers or numeric strings; anything else is absent
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
        #[allow(dead_code)]
        Other(serde_json::Value),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrString::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

impl RawToolRecord {
    /// Create a record with only the mandatory identity fields populated
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: default_category(),
            source_type,
            source_id: None,
            homepage_url: None,
            repository_url: None,
            documentation_url: None,
            package_url: None,
            languages: Vec::new(),
            frameworks: Vec::new(),
            tags: Vec::new(),
            github_stars: None,
            github_forks: None,
            weekly_downloads: None,
            docker_pulls: None,
            license: None,
            version: None,
            last_updated: None,
            pricing_model: None,
            difficulty: None,
            popularity_score: None,
            trending_score: None,
            quality_score: None,
            estimated_monthly_cost: None,
            cost_category: None,
        }
    }

    /// Key used for cross-source deduplication
    pub fn dedup_key(&self) -> (String, SourceType) {
        (self.name.trim().to_lowercase(), self.source_type)
    }

    /// Source id when present and non-blank
    pub fn stable_source_id(&self) -> Option<&str> {
        self.source_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// Reject records that cannot identify a tool
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput {
                field: "name".to_string(),
                message: "tool name must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Lowercased name, description and tags joined for keyword scans
    pub fn search_text(&self) -> String {
        let mut text = format!("{} {}", self.name, self.description);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text.to_lowercase()
    }
}

/// Links exposed for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolLinks {
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub documentation: Option<String>,
    pub package: Option<String>,
}

/// Presentation badges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolBadges {
    pub pricing: String,
    pub difficulty: String,
    pub trending: bool,
}

/// Metrics bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetrics {
    pub github_stars: Option<u64>,
    pub github_forks: Option<u64>,
    pub weekly_downloads: Option<u64>,
    pub trending: f64,
    pub popularity: f64,
    pub quality: f64,
    pub estimated_monthly_cost: Option<f64>,
}

/// Technology bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolTech {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub tags: Vec<String>,
}

/// A user's own evaluation of a tool, attached by the stack management layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEvaluation {
    /// Rating from 1 to 5
    pub rating: u8,
    pub notes: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl ToolEvaluation {
    /// Create a new evaluation with validation
    pub fn new(rating: u8, notes: Option<String>) -> Result<Self, DomainError> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::InvalidInput {
                field: "rating".to_string(),
                message: format!("must be between 1 and 5, got {}", rating),
            });
        }

        Ok(Self {
            rating,
            notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            evaluated_at: Utc::now(),
        })
    }
}

/// Canonical, enriched tool summary handed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    /// `{sourceType}:{sourceId}`, or `{sourceType}:{uuid}` when the source gave no id
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub source_type: SourceType,
    pub source_id: Option<String>,
    pub links: ToolLinks,
    pub license: Option<String>,
    pub version: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub cost_category: Option<String>,
    pub badges: ToolBadges,
    pub metrics: ToolMetrics,
    pub tech: ToolTech,
    pub evaluation: Option<ToolEvaluation>,
}

impl ToolSummary {
    /// Attach a user evaluation
    pub fn with_evaluation(mut self, evaluation: ToolEvaluation) -> Self {
        self.evaluation = Some(evaluation);
        self
    }

    /// Check whether this summary refers to the same tool as another
    pub fn matches(&self, other: &ToolSummary) -> bool {
        self.source_type == other.source_type
            && self.name.trim().eq_ignore_ascii_case(other.name.trim())
    }
}

/// Outcome of one source adapter within an aggregation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub source: SourceType,
    pub ok: bool,
    pub records: usize,
    pub error: Option<String>,
}

impl SourceStatus {
    pub fn succeeded(source: SourceType, records: usize) -> Self {
        Self {
            source,
            ok: true,
            records,
            error: None,
        }
    }

    pub fn failed(source: SourceType, error: impl Into<String>) -> Self {
        Self {
            source,
            ok: false,
            records: 0,
            error: Some(error.into()),
        }
    }
}

/// Ranked tools together with the per-source status of the call that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub tools: Vec<ToolSummary>,
    pub sources: Vec<SourceStatus>,
}

impl DiscoveryReport {
    /// True when at least one source failed but the call still produced a result
    pub fn is_degraded(&self) -> bool {
        self.sources.iter().any(|s| !s.ok)
    }
}
