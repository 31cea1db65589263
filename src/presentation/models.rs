//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::application::{RecommendationRequest, RecommendationResult};
use crate::domain::{DiscoveryReport, SourceStatus, SourceType, ToolSummary};

/// Query parameters for trending discovery
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendingQuery {
    /// Comma-separated categories to keep
    #[param(example = "testing,frontend")]
    pub categories: Option<String>,

    /// Comma-separated sources to query
    #[param(example = "npm,github")]
    pub sources: Option<String>,

    /// Minimum popularity score (0-100)
    #[param(example = 25.0)]
    pub min_popularity: Option<f64>,

    /// Maximum number of tools returned
    #[param(example = 20)]
    pub max_results: Option<usize>,
}

/// Query parameters for tool search
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text query
    #[param(example = "react")]
    pub q: Option<String>,

    /// Comma-separated sources to query
    #[param(example = "npm,crates")]
    pub sources: Option<String>,

    /// Restrict to one language on sources that support it (npm, github)
    #[param(example = "TypeScript")]
    pub language: Option<String>,

    /// Maximum number of tools returned
    #[param(example = 10)]
    pub max_results: Option<usize>,
}

/// Outcome of one source during a discovery call
#[derive(Debug, Serialize, ToSchema)]
pub struct SourceStatusDto {
    #[schema(example = "github")]
    pub source: String,

    pub ok: bool,

    /// Records the source contributed
    #[schema(example = 20)]
    pub records: usize,

    #[schema(example = "github responded with HTTP 503: unavailable")]
    pub error: Option<String>,
}

impl From<SourceStatus> for SourceStatusDto {
    fn from(status: SourceStatus) -> Self {
        Self {
            source: status.source.to_string(),
            ok: status.ok,
            records: status.records,
            error: status.error,
        }
    }
}

/// Ranked tools plus per-source outcome
#[derive(Debug, Serialize, ToSchema)]
pub struct DiscoveryResponse {
    /// Canonical tool summaries
    #[schema(value_type = Vec<Object>)]
    pub tools: Vec<ToolSummary>,

    pub sources: Vec<SourceStatusDto>,

    /// True when at least one source failed
    pub degraded: bool,
}

impl From<DiscoveryReport> for DiscoveryResponse {
    fn from(report: DiscoveryReport) -> Self {
        let degraded = report.is_degraded();
        Self {
            tools: report.tools,
            sources: report.sources.into_iter().map(Into::into).collect(),
            degraded,
        }
    }
}

/// Request body for recommendations
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationRequestDto {
    /// Tools already in use
    #[schema(example = json!(["react", "express", "postgres"]))]
    pub user_stack: Vec<String>,

    /// Categories the caller wants covered
    #[schema(example = json!(["testing"]))]
    pub user_categories: Vec<String>,

    #[schema(example = json!(["typescript"]))]
    pub user_languages: Vec<String>,

    #[schema(example = 8)]
    pub team_size: Option<u32>,

    #[schema(example = "fintech")]
    pub industry: Option<String>,
}

impl From<RecommendationRequestDto> for RecommendationRequest {
    fn from(dto: RecommendationRequestDto) -> Self {
        Self {
            user_stack: dto.user_stack,
            user_categories: dto.user_categories,
            user_languages: dto.user_languages,
            team_size: dto.team_size,
            industry: dto.industry,
        }
    }
}

/// Recommended tools with the reasoning behind them
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    #[schema(value_type = Vec<Object>)]
    pub recommendations: Vec<ToolSummary>,

    pub reasoning: Vec<String>,

    pub based_on_stack: Vec<String>,

    /// Confidence in the recommendation set (0-100)
    #[schema(example = 65.0)]
    pub confidence_score: f64,

    pub categories: Vec<String>,
}

impl From<RecommendationResult> for RecommendationResponse {
    fn from(result: RecommendationResult) -> Self {
        Self {
            recommendations: result.recommendations,
            reasoning: result.reasoning,
            based_on_stack: result.based_on_stack,
            confidence_score: result.confidence_score,
            categories: result.categories,
        }
    }
}

/// Error response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "INVALID_INPUT")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Invalid input for q: query must not be empty")]
    pub message: String,

    /// Additional error context
    #[schema(example = r#"{"failures": ["npm: request timed out"]}"#)]
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Uuid,

    /// Error timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Health check response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health status
    #[schema(example = "healthy")]
    pub status: String,

    /// Current service version
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Health check timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Build information
    #[schema(example = r#"{"build_date": "2024-01-15"}"#)]
    pub details: Option<serde_json::Value>,
}

/// Request budget of one configured source
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SourceHealth {
    #[schema(example = "npm")]
    pub source: String,

    #[schema(example = 60)]
    pub max_requests: Option<usize>,

    #[schema(example = 60000)]
    pub window_ms: Option<u64>,
}

/// Configured sources and their request budgets
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SourcesHealthResponse {
    pub sources: Vec<SourceHealth>,

    /// Sources enabled for discovery calls
    #[schema(example = json!(["npm", "crates", "github", "dockerhub"]))]
    pub enabled: Vec<String>,
}

/// Split a comma-separated list, dropping blanks
pub fn parse_list(raw: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Parse a comma-separated list of source names
pub fn parse_sources(raw: Option<&str>) -> Result<Option<Vec<SourceType>>, ApplicationError> {
    parse_list(raw)
        .map(|names| {
            names
                .iter()
                .map(|name| {
                    name.parse::<SourceType>()
                        .map_err(|e| ApplicationError::invalid_input("sources", e))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
}
