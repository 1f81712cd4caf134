//! Runtime switches for talking to the backend.
//!
//! Read from `KEHATI_*` environment variables through the `config` crate:
//!
//! | variable              | field          | default                 |
//! |-----------------------|----------------|-------------------------|
//! | `KEHATI_USE_REAL_API` | `use_real_api` | `false`                 |
//! | `KEHATI_BASE_URL`     | `base_url`     | `http://localhost:8000` |
//! | `KEHATI_TOKEN_DIR`    | `token_dir`    | unset (memory only)     |
//!
//! Real calls are enabled only by the exact value `true`; anything else
//! leaves them off.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Deserializer};

use crate::token::{FileStorage, TokenStore};

pub const ENV_PREFIX: &str = "KEHATI";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// When off, callers are expected to stay on local fixtures and issue no
    /// network calls.
    #[serde(default, deserialize_with = "exactly_true")]
    pub use_real_api: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Directory holding the persisted token. Without it the token store has
    /// no persistent medium.
    #[serde(default)]
    pub token_dir: Option<PathBuf>,
}

fn exactly_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(String::deserialize(deserializer)? == "true")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            use_real_api: false,
            base_url: default_base_url(),
            token_dir: None,
        }
    }
}

impl ApiConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(env: Environment) -> Result<Self, ConfigError> {
        Config::builder().add_source(env).build()?.try_deserialize()
    }

    /// Token store matching `token_dir`, not yet initialised.
    pub fn token_store(&self) -> TokenStore {
        match &self.token_dir {
            Some(dir) => TokenStore::new(FileStorage::new(dir)),
            None => TokenStore::memory_only(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = ApiConfig::from_vars(HashMap::new()).unwrap();
        assert_eq!(cfg, ApiConfig::default());
        assert!(!cfg.use_real_api);
        assert_eq!(cfg.base_url, "http://localhost:8000");
    }

    #[test]
    fn reads_prefixed_variables() {
        let cfg = ApiConfig::from_vars(vars(&[
            ("KEHATI_USE_REAL_API", "true"),
            ("KEHATI_BASE_URL", "https://api.tamankehati.id"),
            ("KEHATI_TOKEN_DIR", "/tmp/kehati"),
        ]))
        .unwrap();
        assert!(cfg.use_real_api);
        assert_eq!(cfg.base_url, "https://api.tamankehati.id");
        assert_eq!(cfg.token_dir, Some(PathBuf::from("/tmp/kehati")));
    }

    #[test]
    fn only_literal_true_enables_real_calls() {
        for value in ["enabled", "1", "yes", "TRUE", ""] {
            let cfg = ApiConfig::from_vars(vars(&[("KEHATI_USE_REAL_API", value)])).unwrap();
            assert!(!cfg.use_real_api, "{value:?} must leave real calls off");
        }
    }

    #[test]
    fn ignores_unprefixed_variables() {
        let cfg = ApiConfig::from_vars(vars(&[("BASE_URL", "http://elsewhere")])).unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn token_store_persistence_follows_token_dir() {
        assert!(!ApiConfig::default().token_store().is_persistent());
        let cfg = ApiConfig {
            token_dir: Some(PathBuf::from("/tmp/kehati")),
            ..Default::default()
        };
        assert!(cfg.token_store().is_persistent());
    }
}
