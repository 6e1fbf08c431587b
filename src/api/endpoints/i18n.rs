//! Translation tables for the admin UI.

use std::collections::HashMap;

use axum::extract::Path;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::i18n::{self, Direction, Language};

#[derive(Serialize)]
pub struct TranslationsResponse {
    pub language: Language,
    pub direction: Direction,
    pub strings: HashMap<&'static str, &'static str>,
}

/// `GET /api/i18n/:lang`
pub async fn strings(Path(lang): Path<String>) -> Result<Json<TranslationsResponse>, ApiError> {
    let language: Language = lang.parse().map_err(ApiError::NotFound)?;

    Ok(Json(TranslationsResponse {
        language,
        direction: language.direction(),
        strings: i18n::strings_for(language),
    }))
}
