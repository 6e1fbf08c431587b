use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ClinicReports";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Page size requested from the dedicated visits endpoint.
pub const VISITS_PAGE_SIZE: u32 = 1000;

/// Maximum rows shown in a report preview.
pub const PREVIEW_ROW_CAP: usize = 10;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Get the application data directory
/// ~/ClinicReports/ on all platforms. Falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Location of the persisted language / auth token file.
pub fn preferences_path() -> PathBuf {
    app_data_dir().join("preferences.json")
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinic_reports_lib=info,tower_http=warn"
}

/// Runtime settings for the report service, read from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the external clinic REST API (no trailing slash).
    pub api_base_url: String,
    /// Address the local HTTP surface binds to.
    pub bind_addr: SocketAddr,
    /// Transport timeout for upstream requests.
    pub api_timeout_secs: u64,
    /// Where the language and auth token are persisted.
    pub preferences_path: PathBuf,
}

impl ServiceConfig {
    /// Build from `CLINIC_API_BASE_URL`, `CLINIC_REPORTS_BIND` and
    /// `CLINIC_API_TIMEOUT_SECS`, falling back to defaults for anything
    /// missing or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("CLINIC_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = lookup("CLINIC_REPORTS_BIND")
            .and_then(|v| match v.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!(value = %v, "Ignoring invalid CLINIC_REPORTS_BIND: {e}");
                    None
                }
            })
            .unwrap_or_else(default_bind_addr);

        let api_timeout_secs = lookup("CLINIC_API_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        Self {
            api_base_url,
            bind_addr,
            api_timeout_secs,
            preferences_path: preferences_path(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8787)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let dir = app_data_dir();
        assert!(dir.ends_with(APP_NAME));
    }

    #[test]
    fn preferences_under_app_data() {
        let prefs = preferences_path();
        assert!(prefs.starts_with(app_data_dir()));
        assert!(prefs.ends_with("preferences.json"));
    }

    #[test]
    fn defaults_when_env_empty() {
        let cfg = ServiceConfig::from_lookup(|_| None);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.api_timeout_secs, DEFAULT_API_TIMEOUT_SECS);
    }

    #[test]
    fn env_overrides_and_trailing_slash_trimmed() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("CLINIC_API_BASE_URL", "https://clinic.example.com/api/"),
            ("CLINIC_REPORTS_BIND", "0.0.0.0:9000"),
            ("CLINIC_API_TIMEOUT_SECS", "12"),
        ]));
        assert_eq!(cfg.api_base_url, "https://clinic.example.com/api");
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.api_timeout_secs, 12);
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("CLINIC_REPORTS_BIND", "not-an-addr"),
            ("CLINIC_API_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.api_timeout_secs, DEFAULT_API_TIMEOUT_SECS);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
