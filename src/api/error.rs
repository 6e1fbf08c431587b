//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::client::FetchError;
use crate::export::ExportError;
use crate::normalize::InvalidRange;
use crate::preferences::PreferencesError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream failure: {0}")]
    Upstream(#[from] FetchError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::Upstream(FetchError::Client(detail)) => {
                tracing::error!(detail, "HTTP client construction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Upstream(err) => {
                tracing::error!("Clinic API failure: {err}");
                let code = match err {
                    FetchError::Transport(_) => "UPSTREAM_UNREACHABLE",
                    FetchError::Server { .. } => "UPSTREAM_ERROR",
                    _ => "UPSTREAM_SHAPE",
                };
                (
                    StatusCode::BAD_GATEWAY,
                    code,
                    "Failed to load report data".to_string(),
                )
            }
            ApiError::Export(err) => {
                tracing::error!("Export failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_FAILED",
                    "Report export failed".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<PreferencesError> for ApiError {
    fn from(err: PreferencesError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<InvalidRange> for ApiError {
    fn from(err: InvalidRange) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn bad_request_returns_400() {
        let response = ApiError::BadRequest("start_date is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "start_date is required");
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound("language".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transport_failure_returns_502_without_details() {
        let response =
            ApiError::from(FetchError::Transport("connection refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "UPSTREAM_UNREACHABLE");
        assert_eq!(json["error"]["message"], "Failed to load report data");
    }

    #[tokio::test]
    async fn server_failure_returns_502() {
        let err = FetchError::Server {
            status: 500,
            body: "stack trace".into(),
        };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn shape_failure_returns_502() {
        let response = ApiError::from(FetchError::Shape("no visits".into())).into_response();
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "UPSTREAM_SHAPE");
    }

    #[tokio::test]
    async fn client_build_failure_is_internal() {
        let response = ApiError::from(FetchError::Client("tls".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("lock poisoned".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn export_failure_returns_500() {
        let response = ApiError::from(ExportError::Pdf("font".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "EXPORT_FAILED");
    }

    #[test]
    fn reversed_range_maps_to_bad_request() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = crate::normalize::DateRange::new(start, end).unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
    }
}
