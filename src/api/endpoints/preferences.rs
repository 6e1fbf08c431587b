//! Language and auth token preferences.
//!
//! The token itself is never echoed back; responses only say whether one
//! is stored.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::i18n::{Direction, Language};
use crate::preferences::PreferenceStore;

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub language: Language,
    pub direction: Direction,
    pub has_auth_token: bool,
}

impl From<&PreferenceStore> for PreferencesResponse {
    fn from(store: &PreferenceStore) -> Self {
        let language = store.language();
        Self {
            language,
            direction: language.direction(),
            has_auth_token: store.auth_token().is_some(),
        }
    }
}

/// Absent fields are left unchanged. An empty `auth_token` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePreferences {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// `GET /api/preferences`
pub async fn get(State(ctx): State<ApiContext>) -> Result<Json<PreferencesResponse>, ApiError> {
    let prefs = ctx.read_preferences()?;
    Ok(Json(PreferencesResponse::from(&*prefs)))
}

/// `PUT /api/preferences`
pub async fn update(
    State(ctx): State<ApiContext>,
    Json(update): Json<UpdatePreferences>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let mut prefs = ctx.write_preferences()?;

    if let Some(language) = update.language {
        let direction = prefs.set_language(language)?;
        tracing::info!(language = language.code(), ?direction, "Language changed");
    }
    if let Some(token) = update.auth_token {
        let cleared = token.trim().is_empty();
        prefs.set_auth_token(Some(token))?;
        tracing::info!(cleared, "Auth token updated");
    }

    Ok(Json(PreferencesResponse::from(&*prefs)))
}
