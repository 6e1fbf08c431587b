//! Persisted local state: UI language and the upstream auth token.
//!
//! Stored as a small JSON file under the app data directory. Read once at
//! startup; written whenever a value changes. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::i18n::{Direction, Language};

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("Preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preferences file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// File-backed preference store.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    current: Preferences,
}

impl PreferenceStore {
    /// Load preferences from `path`. A missing file yields defaults; a
    /// malformed file is logged and replaced with defaults on next save.
    pub fn load(path: &Path) -> Self {
        let current = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Preferences>(&raw) {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Ignoring malformed preferences: {e}");
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Cannot read preferences: {e}");
                Preferences::default()
            }
        };

        tracing::debug!(language = current.language.code(), "Preferences loaded");

        Self {
            path: path.to_path_buf(),
            current,
        }
    }

    pub fn get(&self) -> &Preferences {
        &self.current
    }

    pub fn language(&self) -> Language {
        self.current.language
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.current
            .auth_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    /// Persist a new language and return the text direction it implies.
    pub fn set_language(&mut self, language: Language) -> Result<Direction, PreferencesError> {
        self.current.language = language;
        self.save()?;
        Ok(language.direction())
    }

    /// Store (or clear, with `None`) the upstream bearer token.
    pub fn set_auth_token(&mut self, token: Option<String>) -> Result<(), PreferencesError> {
        self.current.auth_token = token.filter(|t| !t.trim().is_empty());
        self.save()
    }

    fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PreferenceStore::load(&tmp.path().join("preferences.json"));
        assert_eq!(store.language(), Language::En);
        assert!(store.auth_token().is_none());
    }

    #[test]
    fn set_language_persists_and_returns_direction() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("preferences.json");

        let mut store = PreferenceStore::load(&path);
        let dir = store.set_language(Language::Ar).unwrap();
        assert_eq!(dir, Direction::Rtl);

        let reloaded = PreferenceStore::load(&path);
        assert_eq!(reloaded.language(), Language::Ar);
    }

    #[test]
    fn auth_token_round_trip_and_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("preferences.json");

        let mut store = PreferenceStore::load(&path);
        store.set_auth_token(Some("abc123".into())).unwrap();
        assert_eq!(PreferenceStore::load(&path).auth_token(), Some("abc123"));

        store.set_auth_token(None).unwrap();
        assert!(PreferenceStore::load(&path).auth_token().is_none());
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::load(&tmp.path().join("p.json"));
        store.set_auth_token(Some("   ".into())).unwrap();
        assert!(store.auth_token().is_none());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = PreferenceStore::load(&path);
        assert_eq!(store.get(), &Preferences::default());
    }
}
