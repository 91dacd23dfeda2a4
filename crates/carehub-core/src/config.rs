//! Client configuration
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. TOML file
//! 3. `CAREHUB_*` environment variables
//!
//! The result is validated before use.

use crate::error::ConfigError;
use crate::pricing::FeeSchedule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "carehub.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
    pub fees: FeeSchedule,
}

/// Hosted backend connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
    /// Signed-in user's access token, if any
    pub access_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            timeout_secs: 15,
        }
    }
}

/// Where local drafts are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".carehub"),
        }
    }
}

/// Search behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Terms shorter than this never reach the backend
    pub min_chars: usize,
    /// Maximum rows per section
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_chars: 2,
            limit: 20,
        }
    }
}

/// Catalog cache sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: u64,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            ttl_secs: 300,
        }
    }
}

impl AppConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend URL and anon key
    #[inline]
    #[must_use]
    pub fn with_backend(mut self, url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        self.backend.url = url.into();
        self.backend.anon_key = anon_key.into();
        self
    }

    /// With access token of the signed-in user
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.backend.access_token = Some(token.into());
        self
    }

    /// With storage directory
    #[inline]
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.dir = dir.into();
        self
    }

    /// With fee schedule
    #[inline]
    #[must_use]
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load defaults, then `path` (or `carehub.toml` if present), then env
    ///
    /// # Errors
    /// I/O and parse failures for an explicitly given file, and validation
    /// failures for the merged result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::read_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    /// Overlay `CAREHUB_*` variables read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CAREHUB_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(key) = lookup("CAREHUB_ANON_KEY") {
            self.backend.anon_key = key;
        }
        if let Some(token) = lookup("CAREHUB_ACCESS_TOKEN") {
            self.backend.access_token = (!token.is_empty()).then_some(token);
        }
        if let Some(dir) = lookup("CAREHUB_STORAGE_DIR") {
            self.storage.dir = PathBuf::from(dir);
        }
    }

    /// Reject unusable combinations
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending field, or
    /// `ConfigError::Fee` for a bad fee constant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend.url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend.url must start with http:// or https://, got {url}"
            )));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid("backend.timeout_secs must be positive".into()));
        }
        if self.search.limit == 0 {
            return Err(ConfigError::Invalid("search.limit must be positive".into()));
        }
        self.fees.validate()?;
        Ok(())
    }

    /// Whether a backend URL is configured
    #[inline]
    #[must_use]
    pub fn has_backend(&self) -> bool {
        !self.backend.url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.min_chars, 2);
        assert_eq!(config.fees.standard_tax, 18.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [backend]
            url = "https://demo.supabase.co"
            anon_key = "anon"

            [fees]
            home_care_tax = 60.0
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.timeout_secs, 15);
        assert_eq!(config.fees.home_care_tax, 60.0);
        assert_eq!(config.fees.standard_tax, 18.0);
        assert!(config.has_backend());
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("CAREHUB_BACKEND_URL", "https://env.example.com"),
            ("CAREHUB_ACCESS_TOKEN", ""),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::new().with_access_token("stale");
        config.apply_env(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.backend.url, "https://env.example.com");
        assert_eq!(config.backend.access_token, None);
    }

    #[test]
    fn bad_url_rejected() {
        let config = AppConfig::new().with_backend("ftp://nope", "k");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn negative_fee_in_toml_rejected() {
        let config = AppConfig::from_toml_str(
            r#"
            [fees]
            lab_home_collection_fee = -100.0
            "#,
        )
        .unwrap();
        match config.validate() {
            Err(ConfigError::Fee(err)) => assert_eq!(err.field, "lab_home_collection_fee"),
            other => panic!("expected fee error, got {other:?}"),
        }
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carehub.toml");
        std::fs::write(&path, "[search]\nlimit = 5\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.search.limit, 5);
    }

    #[test]
    fn load_missing_explicit_file_errors() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
