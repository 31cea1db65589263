//! Discovery controller: trending, search, recommendations and mapping

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use crate::application::errors::ApplicationError;
use crate::domain::{RawToolRecord, ToolSummary};
use crate::presentation::controllers::AppState;
use crate::presentation::models::{
    DiscoveryResponse, ErrorResponse, RecommendationRequestDto, RecommendationResponse,
    SearchQuery, TrendingQuery, parse_list, parse_sources,
};

/// Trending tools across the enabled sources
#[utoipa::path(
    get,
    path = "/api/v1/tools/trending",
    tag = "discovery",
    params(TrendingQuery),
    responses(
        (status = 200, description = "Ranked trending tools", body = DiscoveryResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 502, description = "Every source failed", body = ErrorResponse)
    )
)]
pub async fn trending_tools(
    State(app_state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<DiscoveryResponse>, ApplicationError> {
    let service = &app_state.discovery_service;
    let mut config = service.discovery_config().clone();
    if let Some(sources) = parse_sources(query.sources.as_deref())? {
        config.enabled_sources = sources;
    }
    if let Some(min_popularity) = query.min_popularity {
        config.min_popularity_threshold = min_popularity;
    }
    if let Some(max_results) = query.max_results {
        config.max_results = max_results;
    }
    let categories = parse_list(query.categories.as_deref());

    let report = service
        .discover_trending_report(Some(&config), categories.as_deref())
        .await?;
    Ok(Json(report.into()))
}

/// Relevance-ranked search across the enabled sources
#[utoipa::path(
    get,
    path = "/api/v1/tools/search",
    tag = "discovery",
    params(SearchQuery),
    responses(
        (status = 200, description = "Relevance-ranked tools", body = DiscoveryResponse),
        (status = 400, description = "Missing or blank query", body = ErrorResponse),
        (status = 502, description = "Every source failed", body = ErrorResponse)
    )
)]
pub async fn search_tools(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DiscoveryResponse>, ApplicationError> {
    let service = &app_state.discovery_service;
    let text = query.q.unwrap_or_default();
    let sources = parse_sources(query.sources.as_deref())?;

    let mut config = service.discovery_config().clone();
    if let Some(max_results) = query.max_results {
        config.max_results = max_results;
    }

    let report = service
        .search_report_in_language(
            &text,
            query.language.as_deref(),
            sources.as_deref(),
            Some(&config),
        )
        .await?;
    Ok(Json(report.into()))
}

/// Recommendations complementing the caller's stack
#[utoipa::path(
    post,
    path = "/api/v1/tools/recommendations",
    tag = "discovery",
    request_body = RecommendationRequestDto,
    responses(
        (status = 200, description = "Recommended tools", body = RecommendationResponse),
        (status = 502, description = "Every source failed", body = ErrorResponse)
    )
)]
pub async fn recommend_tools(
    State(app_state): State<AppState>,
    Json(request): Json<RecommendationRequestDto>,
) -> Result<Json<RecommendationResponse>, ApplicationError> {
    let result = app_state
        .discovery_service
        .generate_recommendations(&request.into())
        .await?;
    Ok(Json(result.into()))
}

/// Canonicalize a raw record without contacting any source
#[utoipa::path(
    post,
    path = "/api/v1/tools/map",
    tag = "discovery",
    request_body(content = Object, description = "Raw tool record"),
    responses(
        (status = 200, description = "Canonical tool summary", body = Object),
        (status = 400, description = "Record has no usable name", body = ErrorResponse)
    )
)]
pub async fn map_tool(
    State(app_state): State<AppState>,
    Json(record): Json<RawToolRecord>,
) -> Result<Json<ToolSummary>, ApplicationError> {
    record.validate()?;
    Ok(Json(
        app_state.discovery_service.map_to_discovery_tool_dto(&record),
    ))
}

/// Drop every cached upstream response
#[utoipa::path(
    delete,
    path = "/api/v1/cache",
    tag = "cache",
    responses(
        (status = 204, description = "Caches cleared")
    )
)]
pub async fn clear_caches(State(app_state): State<AppState>) -> StatusCode {
    app_state.discovery_service.clear_all_caches().await;
    info!("Source caches cleared on request");
    StatusCode::NO_CONTENT
}
