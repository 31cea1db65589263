//! HTTP middleware for the web server

use axum::{
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use std::time::Instant;
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::presentation::models::ErrorResponse;

/// Header carrying the per-request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Error handling middleware
impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApplicationError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApplicationError::Configuration { .. } => {
                (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR")
            }
            ApplicationError::Domain(_) => (StatusCode::BAD_REQUEST, "INVALID_RECORD"),
            ApplicationError::AllSourcesFailed { .. } => {
                (StatusCode::BAD_GATEWAY, "ALL_SOURCES_FAILED")
            }
        };

        let details = match &self {
            ApplicationError::AllSourcesFailed { failures } => json!({ "failures": failures }),
            ApplicationError::InvalidInput { field, .. } => json!({ "field": field }),
            other => json!({ "error": other.to_string() }),
        };

        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        } else {
            tracing::debug!(code, error = %self, "Request rejected");
        }

        let error_response = ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
            details: Some(details),
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Request logging middleware with timing and request ID
pub async fn logging_middleware(request: Request<axum::body::Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let mut response = next.run(request).await;
    let duration = start_time.elapsed();

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_error_status_mapping() {
        let cases = vec![
            (
                ApplicationError::invalid_input("q", "empty"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::configuration("max_results must be greater than zero"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::AllSourcesFailed {
                    failures: vec!["npm: down".to_string()],
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApplicationError::Domain(DomainError::InvalidInput {
                    field: "name".to_string(),
                    message: "blank".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
