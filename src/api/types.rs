//! Shared state for the report API router.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::error::ApiError;
use crate::client::HttpClinicApi;
use crate::config::ServiceConfig;
use crate::fetcher::ReportFetcher;
use crate::i18n::Language;
use crate::preferences::PreferenceStore;
use crate::preview::PreviewSession;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<ServiceConfig>,
    pub preferences: Arc<RwLock<PreferenceStore>>,
    pub preview: Arc<PreviewSession>,
}

impl ApiContext {
    pub fn new(config: ServiceConfig, preferences: PreferenceStore) -> Self {
        Self {
            config: Arc::new(config),
            preferences: Arc::new(RwLock::new(preferences)),
            preview: Arc::new(PreviewSession::new()),
        }
    }

    pub fn read_preferences(&self) -> Result<RwLockReadGuard<'_, PreferenceStore>, ApiError> {
        self.preferences
            .read()
            .map_err(|_| ApiError::Internal("preferences lock poisoned".into()))
    }

    pub fn write_preferences(&self) -> Result<RwLockWriteGuard<'_, PreferenceStore>, ApiError> {
        self.preferences
            .write()
            .map_err(|_| ApiError::Internal("preferences lock poisoned".into()))
    }

    pub fn language(&self) -> Result<Language, ApiError> {
        Ok(self.read_preferences()?.language())
    }

    /// A fetcher bound to the configured base URL and the currently stored
    /// auth token. Built per request so a token change applies immediately.
    pub fn fetcher(&self) -> Result<ReportFetcher<HttpClinicApi>, ApiError> {
        let token = self.read_preferences()?.auth_token().map(str::to_string);
        let api = HttpClinicApi::new(&self.config.api_base_url, self.config.api_timeout_secs, token)?;
        Ok(ReportFetcher::new(api))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::context;
    use super::*;
    use crate::i18n::Language;

    #[test]
    fn language_follows_preferences() {
        let (ctx, _tmp) = context("http://127.0.0.1:9");
        assert_eq!(ctx.language().unwrap(), Language::En);

        ctx.write_preferences().unwrap().set_language(Language::Ar).unwrap();
        assert_eq!(ctx.language().unwrap(), Language::Ar);
    }

    #[test]
    fn fetcher_picks_up_current_token() {
        let (ctx, _tmp) = context("http://127.0.0.1:9/api/");
        assert!(!ctx.fetcher().unwrap().api().has_token());

        ctx.write_preferences()
            .unwrap()
            .set_auth_token(Some("abc".into()))
            .unwrap();
        let fetcher = ctx.fetcher().unwrap();
        assert!(fetcher.api().has_token());
        assert_eq!(fetcher.api().base_url(), "http://127.0.0.1:9/api");
    }
}
