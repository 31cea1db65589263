//! Route definitions and server setup

use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    routing::{delete, get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::presentation::{
    controllers::{
        AppState,
        discovery::{clear_caches, map_tool, recommend_tools, search_tools, trending_tools},
        health::{health_check, liveness_check, sources_health},
    },
    middleware::logging_middleware,
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::discovery::trending_tools,
        crate::presentation::controllers::discovery::search_tools,
        crate::presentation::controllers::discovery::recommend_tools,
        crate::presentation::controllers::discovery::map_tool,
        crate::presentation::controllers::discovery::clear_caches,
        crate::presentation::controllers::health::health_check,
        crate::presentation::controllers::health::sources_health,
        crate::presentation::controllers::health::liveness_check
    ),
    components(
        schemas(
            DiscoveryResponse,
            SourceStatusDto,
            RecommendationRequestDto,
            RecommendationResponse,
            ErrorResponse,
            HealthResponse,
            SourceHealth,
            SourcesHealthResponse
        )
    ),
    tags(
        (name = "discovery", description = "Trending, search and recommendation endpoints"),
        (name = "cache", description = "Upstream response cache management"),
        (name = "health", description = "Service and source health endpoints")
    ),
    info(
        title = "StackScout API",
        version = "0.1.0",
        description = "Discovers developer tools across npm, crates.io, GitHub and Docker Hub, then scores, classifies and ranks them.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    )
)]
pub struct ApiDoc;

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let origins = &config.server.allowed_origins;
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

/// Create the application router with the middleware stack
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/tools/trending", get(trending_tools))
        .route("/tools/search", get(search_tools))
        .route("/tools/recommendations", post(recommend_tools))
        .route("/tools/map", post(map_tool))
        .route("/cache", delete(clear_caches));

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/health/sources", get(sources_health))
        .route("/health/live", get(liveness_check));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes);

    if config.server.enable_docs {
        router =
            router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(
            ServiceBuilder::new()
                // HTTP tracing
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.server.request_timeout_seconds),
                ))
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(app_state)
}
