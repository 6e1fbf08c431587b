//! Report API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Layers (outermost → innermost): CORS → access log → handler.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the report API router.
pub fn reports_api_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/i18n/:lang", get(endpoints::i18n::strings))
        .route(
            "/preferences",
            get(endpoints::preferences::get).put(endpoints::preferences::update),
        )
        .route(
            "/reports/preview",
            get(endpoints::reports::current_preview).post(endpoints::reports::refresh_preview),
        )
        .route("/reports/export", post(endpoints::reports::export))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn(middleware::log_access))
        .layer(CorsLayer::permissive())
}
