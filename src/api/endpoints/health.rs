//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::i18n::Language;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub api_base_url: String,
    pub has_auth_token: bool,
    pub language: Language,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let prefs = ctx.read_preferences()?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        api_base_url: ctx.config.api_base_url.clone(),
        has_auth_token: prefs.auth_token().is_some(),
        language: prefs.language(),
    }))
}
