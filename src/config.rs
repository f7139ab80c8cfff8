//! Configuration system for the Text-to-SQL A2A agent
//!
//! Loads a TOML file describing the advertised agent identity, the HTTP
//! listener, and the pipeline backend. Secrets are referenced by environment
//! variable name and resolved at runtime, never stored in the file.

use crate::protocol::agent_card::AgentSkill;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main agent configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub agent: AgentSection,
    #[serde(default)]
    pub server: ServerSection,
    pub pipeline: PipelineSection,
}

/// Identity advertised on the Agent Card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSection {
    /// Human-readable agent name
    pub name: String,
    /// Description of what this agent does
    pub description: String,
    /// Public URL A2A clients use to reach this agent
    pub url: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub documentation_url: Option<String>,
    /// Provider organization shown on the card
    pub organization: Option<String>,
    /// Skills override; the built-in skills are advertised when empty
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

fn default_version() -> String {
    "3.0.0".to_string()
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8002
}

/// Pipeline backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Base URL of the REST pipeline service exposing `POST /api/ask`
    pub base_url: String,
    /// Environment variable containing the backend API key
    pub api_key_env: Option<String>,
    /// HTTP request timeout in seconds (default: 120)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound on a single pipeline invocation; unbounded when unset
    pub timeout_secs: Option<u64>,
}

fn default_request_timeout() -> u64 {
    120
}

impl PipelineSection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AgentConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field-level constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "agent.name must not be empty".to_string(),
            ));
        }

        validate_http_url(&self.agent.url)?;
        validate_http_url(&self.pipeline.base_url)?;

        if self.pipeline.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "pipeline.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.pipeline.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "pipeline.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Resolve the pipeline backend API key, if one is configured
    pub fn get_pipeline_api_key(&self) -> Result<Option<String>, ConfigError> {
        self.pipeline
            .api_key_env
            .as_deref()
            .map(Self::get_env_var_required)
            .transpose()
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[agent]
name = "Test SQL Agent"
description = "Answers questions about a test database"
url = "http://localhost:8002"
organization = "Test Workshop"

[server]
host = "127.0.0.1"
port = 8002

[pipeline]
base_url = "http://localhost:8000"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Require an absolute http(s) URL
fn validate_http_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[agent]
name = "Text-to-SQL Agent"
description = "Sales database agent"
url = "https://agent.example.com"
version = "3.1.0"
documentation_url = "https://agent.example.com/docs"
organization = "Workshop"

[[agent.skills]]
id = "text-to-sql"
name = "Text-to-SQL"
description = "Ask questions"
tags = ["sql"]
output_modes = ["text", "data"]

[server]
host = "127.0.0.1"
port = 9000

[pipeline]
base_url = "http://pipeline:8000"
api_key_env = "PIPELINE_API_KEY"
request_timeout_secs = 30
timeout_secs = 60
"#;

        let config = AgentConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.agent.version, "3.1.0");
        assert_eq!(config.agent.skills.len(), 1);
        assert_eq!(config.agent.skills[0].input_modes, vec!["text"]);
        assert_eq!(config.agent.skills[0].output_modes, vec!["text", "data"]);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.pipeline.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.pipeline.timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_minimal_config_defaults() {
        let toml_content = r#"
[agent]
name = "Minimal"
description = "Minimal agent"
url = "http://localhost:8002"

[pipeline]
base_url = "http://localhost:8000"
"#;

        let config = AgentConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.agent.version, "3.0.0");
        assert!(config.agent.skills.is_empty());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8002);
        assert_eq!(config.pipeline.request_timeout_secs, 120);
        assert_eq!(config.pipeline.timeout(), None);
        assert_eq!(config.pipeline.api_key_env, None);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = AgentConfig::test_config();
        config.pipeline.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));

        config.pipeline.base_url = "ftp://example.com".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AgentConfig::test_config();
        config.pipeline.timeout_secs = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut config = AgentConfig::test_config();
        config.agent.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_not_configured() {
        let config = AgentConfig::test_config();
        assert_eq!(config.get_pipeline_api_key().unwrap(), None);
    }

    #[test]
    fn test_api_key_missing_env_var() {
        let mut config = AgentConfig::test_config();
        config.pipeline.api_key_env = Some("TEXT2SQL_TEST_KEY_THAT_DOES_NOT_EXIST".to_string());
        assert!(matches!(
            config.get_pipeline_api_key(),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }
}
