//! HTTP access to the external clinic API.
//!
//! `ClinicApi` is the seam between the report fetcher and the network:
//! `HttpClinicApi` talks to the real backend via `reqwest`, tests use an
//! in-memory mock keyed by path.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

/// Failure taxonomy for upstream calls. An empty result is not an error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FetchError {
    /// No response received (connect failure, timeout, DNS).
    #[error("Cannot reach clinic API: {0}")]
    Transport(String),
    /// Non-2xx response.
    #[error("Clinic API returned {status}: {body}")]
    Server { status: u16, body: String },
    /// Response received but not the expected structure.
    #[error("Unexpected response shape: {0}")]
    Shape(String),
    #[error("Cannot build HTTP client: {0}")]
    Client(String),
}

/// Read-only JSON access to the clinic API.
pub trait ClinicApi: Send + Sync {
    /// `GET {base}{path}?{query}` and decode the body as JSON.
    fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// `reqwest`-backed client. Attaches `Authorization: Bearer` only when a
/// token is configured.
#[derive(Debug, Clone)]
pub struct HttpClinicApi {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
    timeout_secs: u64,
}

impl HttpClinicApi {
    pub fn new(base_url: &str, timeout_secs: u64, token: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: token.filter(|t| !t.trim().is_empty()),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl ClinicApi for HttpClinicApi {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Transport(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "Clinic API request failed");
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Shape(format!("Body is not JSON: {e}")))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory clinic API: canned responses per path, with a call log.
    #[derive(Default)]
    pub struct MockClinicApi {
        responses: HashMap<String, Result<Value, FetchError>>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockClinicApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, path: &str, response: Result<Value, FetchError>) -> Self {
            self.responses.insert(path.to_string(), response);
            self
        }

        pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn called(&self, path: &str) -> bool {
            self.calls().iter().any(|(p, _)| p == path)
        }
    }

    impl ClinicApi for MockClinicApi {
        async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((
                    path.to_string(),
                    query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                ));
            }
            self.responses
                .get(path)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Server { status: 404, body: "not found".into() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_trims_trailing_slash() {
        let api = HttpClinicApi::new("http://localhost:5000/api/", 10, None).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn blank_token_is_not_attached() {
        let api = HttpClinicApi::new("http://localhost", 10, Some("  ".into())).unwrap();
        assert!(!api.has_token());

        let api = HttpClinicApi::new("http://localhost", 10, Some("tok".into())).unwrap();
        assert!(api.has_token());
    }

    #[tokio::test]
    async fn transport_failure_is_classified() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let api = HttpClinicApi::new("http://127.0.0.1:9", 2, None).unwrap();
        let err = api.get_json("/patients/doctor/d1", &[]).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn mock_records_calls_and_defaults_to_404() {
        let api = mock::MockClinicApi::new();
        let err = api
            .get_json("/missing", &[("doctor_id", "d1".to_string())])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Server { status: 404, .. }));
        assert!(api.called("/missing"));
        assert_eq!(api.calls()[0].1, vec![("doctor_id".to_string(), "d1".to_string())]);
    }
}
