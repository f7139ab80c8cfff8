//! HTTP pipeline client
//!
//! Calls the Text-to-SQL REST backend (`POST /api/ask`) and maps its
//! response onto [`PipelineResult`].

use crate::config::{AgentConfig, ConfigError};
use crate::error::AgentResult;
use crate::pipeline::{PipelineError, PipelineResult, QueryPipeline};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "X-API-Key";

/// HTTP pipeline configuration
#[derive(Debug, Clone)]
pub struct HttpPipelineConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpPipelineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl HttpPipelineConfig {
    /// Client settings from the `[pipeline]` section, resolving the API key
    pub fn from_config(config: &AgentConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.pipeline.base_url.clone(),
            api_key: config.get_pipeline_api_key()?,
            timeout: config.pipeline.request_timeout(),
        })
    }
}

/// Pipeline backed by the REST service
pub struct HttpPipeline {
    config: HttpPipelineConfig,
    client: Client,
}

impl HttpPipeline {
    pub fn new(config: HttpPipelineConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::Request(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Client for the `[pipeline]` section of an agent config
    pub fn from_agent_config(config: &AgentConfig) -> AgentResult<Self> {
        Ok(Self::new(HttpPipelineConfig::from_config(config)?)?)
    }

    fn ask_url(&self) -> String {
        format!("{}/api/ask", self.config.base_url.trim_end_matches('/'))
    }

    /// Convert the REST response body into a pipeline result (pure function)
    fn convert_response(response: AskResponse) -> PipelineResult {
        PipelineResult {
            question: Some(response.question),
            sql: response.sql,
            columns: response.columns,
            rows: response.rows,
            answer: response.answer,
            error: response.error,
            row_count: response.row_count,
        }
    }
}

#[async_trait]
impl QueryPipeline for HttpPipeline {
    fn name(&self) -> &str {
        "http"
    }

    async fn process(&self, question: &str) -> Result<PipelineResult, PipelineError> {
        let url = self.ask_url();
        debug!(url = %url, "Sending question to pipeline backend");

        let mut request = self.client.post(&url).json(&AskRequest { question });
        if let Some(api_key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Pipeline backend returned error status");
            return Err(PipelineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: AskResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Decode(e.to_string()))?;

        debug!(
            rows = body.rows.len(),
            row_count = ?body.row_count,
            has_error = body.error.is_some(),
            elapsed_seconds = ?body.elapsed_seconds,
            "Pipeline backend responded"
        );

        Ok(Self::convert_response(body))
    }
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    question: String,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    sql: Option<String>,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
    #[serde(default)]
    row_count: Option<usize>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    elapsed_seconds: Option<f64>,
}
