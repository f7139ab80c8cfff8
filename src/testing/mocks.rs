//! Mock implementations for testing
//!
//! Provides a scripted [`QueryPipeline`] so the task handler and server can
//! be exercised without a database or language model.

use crate::pipeline::{PipelineError, PipelineResult, QueryPipeline};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// What the mock does when invoked
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return this result (which may carry a domain error)
    Respond(PipelineResult),
    /// Fail with an infrastructure fault
    Fault(PipelineError),
    /// Panic inside the pipeline call
    Panic(String),
}

/// Scripted pipeline that records every question it receives
#[derive(Debug, Clone)]
pub struct MockPipeline {
    behavior: MockBehavior,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
    pub questions: Arc<Mutex<Vec<String>>>,
}

impl MockPipeline {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            gate: None,
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `result`
    pub fn answering(result: PipelineResult) -> Self {
        Self::new(MockBehavior::Respond(result))
    }

    /// Single-row answer to a counting question
    pub fn single_row(answer: &str) -> Self {
        Self::answering(PipelineResult::answered(
            "How many products?",
            "SELECT COUNT(*) AS cnt FROM Products",
            vec!["cnt".to_string()],
            vec![vec![json!(10)]],
            answer,
        ))
    }

    /// Answer with `count` generated rows
    pub fn with_rows(count: usize) -> Self {
        let rows: Vec<Vec<Value>> = (0..count)
            .map(|i| vec![json!(i), json!(format!("Product {i}"))])
            .collect();
        Self::answering(PipelineResult::answered(
            "List all products",
            "SELECT ProductID, Name FROM Products",
            vec!["ProductID".to_string(), "Name".to_string()],
            rows,
            "Here are the products.",
        ))
    }

    /// Report a domain-level error in the result
    pub fn with_domain_error(error: &str) -> Self {
        Self::answering(PipelineResult::failed(error))
    }

    /// Fail every call with an infrastructure fault
    pub fn with_fault(error: PipelineError) -> Self {
        Self::new(MockBehavior::Fault(error))
    }

    /// Panic on every call
    pub fn panicking(message: &str) -> Self {
        Self::new(MockBehavior::Panic(message.to_string()))
    }

    /// Sleep before responding
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold each call until `gate` is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub async fn call_count(&self) -> usize {
        self.questions.lock().await.len()
    }

    pub async fn received_questions(&self) -> Vec<String> {
        self.questions.lock().await.clone()
    }
}

#[async_trait]
impl QueryPipeline for MockPipeline {
    fn name(&self) -> &str {
        "mock"
    }

    async fn process(&self, question: &str) -> Result<PipelineResult, PipelineError> {
        self.questions.lock().await.push(question.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Respond(result) => Ok(result.clone()),
            MockBehavior::Fault(error) => Err(error.clone()),
            MockBehavior::Panic(message) => panic!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_questions() {
        let pipeline = MockPipeline::single_row("There are 10 products.");

        let result = pipeline.process("How many products?").await.unwrap();

        assert_eq!(result.answer.as_deref(), Some("There are 10 products."));
        assert_eq!(pipeline.call_count().await, 1);
        assert_eq!(pipeline.received_questions().await, vec!["How many products?"]);
    }

    #[tokio::test]
    async fn test_mock_fault() {
        let pipeline = MockPipeline::with_fault(PipelineError::Request("refused".to_string()));
        assert!(pipeline.process("q").await.is_err());
    }

    #[tokio::test]
    async fn test_gated_mock_waits_for_release() {
        let gate = Arc::new(Notify::new());
        let pipeline = MockPipeline::single_row("ok").gated(Arc::clone(&gate));

        let held = tokio::time::timeout(Duration::from_millis(20), pipeline.process("q")).await;
        assert!(held.is_err());

        gate.notify_one();
        assert!(pipeline.process("q").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_rows() {
        let result = MockPipeline::with_rows(3).process("q").await.unwrap();
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.columns.len(), 2);
    }
}
