//! Report preview and export endpoints.
//!
//! `POST /api/reports/preview` applies a selection and returns the
//! localized preview; `GET /api/reports/preview` returns the current one.
//! `POST /api/reports/export` streams the rendered file as an attachment.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::export::{self, ExportArtifact};
use crate::models::{ReportFormat, ReportQuery, ReportType};
use crate::normalize::DateRange;
use crate::preview::{PreviewRequest, PreviewView};

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub report_type: ReportType,
    pub format: ReportFormat,
    #[serde(flatten)]
    pub query: ReportQuery,
}

/// `POST /api/reports/preview`
pub async fn refresh_preview(
    State(ctx): State<ApiContext>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewView>, ApiError> {
    if let (Some(start), Some(end)) = (request.query.start_date, request.query.end_date) {
        DateRange::new(start, end)?;
    }
    let language = ctx.language()?;
    let fetcher = ctx.fetcher()?;

    let view = ctx.preview.refresh(&fetcher, &request, language).await;
    Ok(Json(view))
}

/// `GET /api/reports/preview`
pub async fn current_preview(State(ctx): State<ApiContext>) -> Result<Json<PreviewView>, ApiError> {
    let language = ctx.language()?;
    Ok(Json(ctx.preview.snapshot(language)))
}

/// `POST /api/reports/export`
pub async fn export(
    State(ctx): State<ApiContext>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let (Some(start), Some(end)) = (request.query.start_date, request.query.end_date) else {
        return Err(ApiError::BadRequest(
            "start_date and end_date are required".into(),
        ));
    };
    let range = DateRange::new(start, end)?;
    let language = ctx.language()?;
    let fetcher = ctx.fetcher()?;

    let records = fetcher
        .fetch_report(request.report_type, &request.query, range)
        .await?;

    let format = request.format;
    let generated_at = chrono::Local::now().naive_local();
    let artifact = tokio::task::spawn_blocking(move || {
        export::export_report(&records, format, language, generated_at)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("export task failed: {e}")))??;

    Ok(attachment(artifact))
}

fn attachment(artifact: ExportArtifact) -> Response {
    let ExportArtifact {
        filename,
        content_type,
        bytes,
    } = artifact;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(header::CONTENT_LENGTH, bytes.len().to_string())
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(bytes))
        .unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "Response build failed").into_response()
        })
}
