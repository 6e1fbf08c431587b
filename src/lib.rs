pub mod api;
pub mod client;
pub mod config;
pub mod export;
pub mod fetcher;
pub mod i18n;
pub mod models;
pub mod normalize;
pub mod preferences;
pub mod preview;

use tracing_subscriber::EnvFilter;

use crate::api::{ApiContext, ServerError};
use crate::config::ServiceConfig;
use crate::preferences::PreferenceStore;

/// Load `.env`, initialize logging, and serve the report API until Ctrl-C.
pub fn run() -> Result<(), ServerError> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
    }

    let config = ServiceConfig::from_env();
    let preferences = PreferenceStore::load(&config.preferences_path);
    tracing::info!(
        api = %config.api_base_url,
        bind = %config.bind_addr,
        language = preferences.language().code(),
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Runtime)?;

    runtime.block_on(async move {
        let bind_addr = config.bind_addr;
        let ctx = ApiContext::new(config, preferences);
        let mut server = api::start_report_server(ctx, bind_addr).await?;

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for shutdown signal: {e}");
        }
        server.shutdown();
        server.stopped().await
    })
}
