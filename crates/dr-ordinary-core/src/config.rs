//! Runtime configuration.
//!
//! Configuration is loaded once at startup and passed by reference to the
//! components that need it. Nothing here reads the environment lazily.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::db::{Database, DbError};

pub const DEFAULT_AGENT_BASE_URL: &str = "https://api.letta.com";
pub const DEFAULT_COMPANION_URL: &str = "http://localhost:3000/";
pub const DEFAULT_PREDICTION_URL: &str = "http://localhost:8000/predict";
pub const DEFAULT_TEXT_CAP: usize = 15_000;

pub const ENV_API_KEY: &str = "LETTA_API_KEY";
pub const ENV_AGENT_ID: &str = "LETTA_AGENT_ID";
pub const ENV_BASE_URL: &str = "LETTA_BASE_URL";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("JSON configuration error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings store error: {0}")]
    Store(#[from] DbError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_base_url() -> String {
    DEFAULT_AGENT_BASE_URL.to_string()
}

/// Agent API credentials and endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub api_key: String,
    pub agent_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl AgentConfig {
    pub fn new(api_key: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            base_url: default_base_url(),
        }
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from `LETTA_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let config = Self {
            api_key: non_empty(ENV_API_KEY).ok_or(ConfigError::Missing("api_key"))?,
            agent_id: non_empty(ENV_AGENT_ID).ok_or(ConfigError::Missing("agent_id"))?,
            base_url: non_empty(ENV_BASE_URL).unwrap_or_else(default_base_url),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from the settings store, falling back to `fallback_agent_id` when unset.
    pub fn from_store(db: &Database, fallback_agent_id: Option<&str>) -> ConfigResult<Self> {
        let api_key = db.api_key()?.ok_or(ConfigError::Missing("api_key"))?;
        let agent_id = match db.agent_id()? {
            Some(id) => id,
            None => fallback_agent_id
                .map(str::to_owned)
                .ok_or(ConfigError::Missing("agent_id"))?,
        };

        let config = Self::new(api_key, agent_id);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.agent_id.trim().is_empty() {
            return Err(ConfigError::Missing("agent_id"));
        }
        self.messages_url()?;
        Ok(())
    }

    /// `<base>/v1/agents/<agent_id>/messages`
    pub fn messages_url(&self) -> ConfigResult<Url> {
        let base = Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl {
            field: "base_url",
            source,
        })?;
        let path = format!("v1/agents/{}/messages", self.agent_id.trim());
        let mut with_slash = base;
        if !with_slash.path().ends_with('/') {
            let joined = format!("{}/", with_slash.path());
            with_slash.set_path(&joined);
        }
        with_slash.join(&path).map_err(|source| ConfigError::InvalidUrl {
            field: "agent_id",
            source,
        })
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.trim())
    }
}

fn default_text_cap() -> usize {
    DEFAULT_TEXT_CAP
}

fn default_excluded_prefixes() -> Vec<String> {
    [
        "google.com/search",
        "chrome://",
        "chrome-extension://",
        "about:",
        "edge://",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Page scan limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum characters of page text sent for analysis
    #[serde(default = "default_text_cap")]
    pub text_cap: usize,
    /// URL prefixes never analyzed
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            text_cap: default_text_cap(),
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

fn default_companion_url() -> String {
    DEFAULT_COMPANION_URL.to_string()
}

fn default_prediction_url() -> String {
    DEFAULT_PREDICTION_URL.to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: Option<AgentConfig>,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default = "default_companion_url")]
    pub companion_url: String,
    #[serde(default = "default_prediction_url")]
    pub prediction_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: None,
            scan: ScanConfig::default(),
            companion_url: default_companion_url(),
            prediction_url: default_prediction_url(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(agent) = &self.agent {
            agent.validate()?;
        }
        self.companion_base()?;
        self.prediction_endpoint()?;
        Ok(())
    }

    pub fn prediction_endpoint(&self) -> ConfigResult<Url> {
        Url::parse(&self.prediction_url).map_err(|source| ConfigError::InvalidUrl {
            field: "prediction_url",
            source,
        })
    }

    pub fn companion_base(&self) -> ConfigResult<Url> {
        Url::parse(&self.companion_url).map_err(|source| ConfigError::InvalidUrl {
            field: "companion_url",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_agent_config_from_json_defaults_base_url() {
        let config = AgentConfig::from_json(r#"{"api_key":"sk-1","agent_id":"agent-1"}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_AGENT_BASE_URL);
        assert_eq!(
            config.messages_url().unwrap().as_str(),
            "https://api.letta.com/v1/agents/agent-1/messages"
        );
        assert_eq!(config.bearer(), "Bearer sk-1");
    }

    #[test]
    fn test_messages_url_keeps_base_path() {
        let mut config = AgentConfig::new("sk", "agent-9");
        config.base_url = "http://localhost:8283/letta".into();
        assert_eq!(
            config.messages_url().unwrap().as_str(),
            "http://localhost:8283/letta/v1/agents/agent-9/messages"
        );
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = AgentConfig::from_json(r#"{"api_key":"  ","agent_id":"agent-1"}"#);
        assert!(matches!(result, Err(ConfigError::Missing("api_key"))));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = AgentConfig::from_json(
            r#"{"api_key":"sk","agent_id":"agent-1","base_url":"not a url"}"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidUrl { field: "base_url", .. })));
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-env"),
            (ENV_AGENT_ID, "agent-env"),
            (ENV_BASE_URL, ""),
        ]
        .into_iter()
        .collect();

        let config = AgentConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.agent_id, "agent-env");
        assert_eq!(config.base_url, DEFAULT_AGENT_BASE_URL);
    }

    #[test]
    fn test_from_lookup_missing_key() {
        let result = AgentConfig::from_lookup(|_| None);
        assert!(matches!(result, Err(ConfigError::Missing("api_key"))));
    }

    #[test]
    fn test_from_store() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            AgentConfig::from_store(&db, Some("agent-x")),
            Err(ConfigError::Missing("api_key"))
        ));

        db.set_api_key("sk-store").unwrap();
        let config = AgentConfig::from_store(&db, Some("agent-x")).unwrap();
        assert_eq!(config.agent_id, "agent-x");

        db.set_agent_id("agent-saved").unwrap();
        let config = AgentConfig::from_store(&db, Some("agent-x")).unwrap();
        assert_eq!(config.agent_id, "agent-saved");
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scan.text_cap, 15_000);
        assert!(config.scan.excluded_prefixes.contains(&"chrome://".to_string()));
        assert!(config.agent.is_none());
    }

    #[test]
    fn test_app_config_partial_scan_section() {
        let config = AppConfig::from_json(r#"{"scan":{"text_cap":100}}"#).unwrap();
        assert_eq!(config.scan.text_cap, 100);
        assert_eq!(config.scan.excluded_prefixes.len(), 5);
    }
}
