//! Local HTTP surface for the admin UI.
//!
//! Translations, preferences, report preview and report export, all under
//! `/api/`. The router is composable: `reports_api_router()` returns a
//! `Router` that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::reports_api_router;
pub use server::{start_report_server, ReportServer, ServerError};
pub use types::ApiContext;
