//! Query pipeline abstraction
//!
//! The pipeline turns a natural-language question into SQL, runs it, and
//! synthesizes an answer. The task handler only sees the [`QueryPipeline`]
//! trait, so the backend can be swapped for a mock in tests.

pub mod http;

pub use http::{HttpPipeline, HttpPipelineConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Outcome reported by the pipeline for one question
///
/// A populated `error` is a domain-level failure (bad SQL, model refusal);
/// infrastructure faults are reported as [`PipelineError`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Ordered rows, each the same arity as `columns`
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Full row count when the backend already truncated `rows`
    #[serde(default)]
    pub row_count: Option<usize>,
}

impl PipelineResult {
    /// Successful result with an answer
    pub fn answered<S: Into<String>>(
        question: S,
        sql: S,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        answer: S,
    ) -> Self {
        Self {
            question: Some(question.into()),
            sql: Some(sql.into()),
            columns,
            rows,
            answer: Some(answer.into()),
            error: None,
            row_count: None,
        }
    }

    /// Domain-level failure
    pub fn failed<S: Into<String>>(error: S) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Domain error text, if the pipeline reported one
    pub fn domain_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Total number of result rows before any truncation
    pub fn total_rows(&self) -> usize {
        self.rows.len().max(self.row_count.unwrap_or(0))
    }
}

/// Infrastructure faults raised while invoking the pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid backend response: {0}")]
    Decode(String),
    #[error("pipeline invocation aborted: {0}")]
    Join(String),
}

/// Question-answering pipeline consumed by the task handler
#[async_trait]
pub trait QueryPipeline: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run the full pipeline for one question; exactly one attempt, no retry
    async fn process(&self, question: &str) -> Result<PipelineResult, PipelineError>;
}
