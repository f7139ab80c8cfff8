//! Integration tests for the HTTP pipeline client
//!
//! Drives `HttpPipeline` against a mock REST backend:
//! - request shape and API key header
//! - success and domain-error bodies
//! - HTTP status, decode, and timeout faults
//! - end-to-end through the task handler

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use text2sql_a2a::pipeline::{HttpPipeline, HttpPipelineConfig, PipelineError, QueryPipeline};
use text2sql_a2a::protocol::{Message, TaskSendParams, TaskState};
use text2sql_a2a::task::{InMemoryTaskStore, TaskHandler};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pipeline_for(server: &MockServer, api_key: Option<&str>) -> HttpPipeline {
    HttpPipeline::new(HttpPipelineConfig {
        base_url: server.uri(),
        api_key: api_key.map(str::to_string),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn ask_body() -> serde_json::Value {
    json!({
        "question": "How many products?",
        "answer": "There are 504 products.",
        "sql": "SELECT COUNT(*) AS cnt FROM SalesLT.Product",
        "columns": ["cnt"],
        "rows": [[504]],
        "row_count": 1,
        "error": null,
        "elapsed_seconds": 2.4
    })
}

#[tokio::test]
async fn test_successful_ask_maps_to_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .and(header("X-API-Key", "backend-key"))
        .and(body_json(json!({"question": "How many products?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ask_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = pipeline_for(&server, Some("backend-key"))
        .process("How many products?")
        .await
        .unwrap();

    assert_eq!(result.answer.as_deref(), Some("There are 504 products."));
    assert_eq!(result.columns, vec!["cnt"]);
    assert_eq!(result.rows, vec![vec![json!(504)]]);
    assert_eq!(result.total_rows(), 1);
    assert_eq!(result.domain_error(), None);
}

#[tokio::test]
async fn test_domain_error_in_body_is_not_a_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "question": "Show the foo column",
            "columns": [],
            "rows": [],
            "row_count": 0,
            "error": "invalid column name 'foo'",
            "elapsed_seconds": 0.8
        })))
        .mount(&server)
        .await;

    let result = pipeline_for(&server, None)
        .process("Show the foo column")
        .await
        .unwrap();

    assert_eq!(result.domain_error(), Some("invalid column name 'foo'"));
}

#[tokio::test]
async fn test_error_status_is_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid or missing API key"))
        .mount(&server)
        .await;

    let error = pipeline_for(&server, None).process("q").await.unwrap_err();

    assert_eq!(
        error,
        PipelineError::Status {
            status: 401,
            body: "Invalid or missing API key".to_string()
        }
    );
}

#[tokio::test]
async fn test_undecodable_body_is_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let error = pipeline_for(&server, None).process("q").await.unwrap_err();

    assert!(matches!(error, PipelineError::Decode(_)));
}

#[tokio::test]
async fn test_request_timeout_is_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ask_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let pipeline = HttpPipeline::new(HttpPipelineConfig {
        base_url: server.uri(),
        api_key: None,
        timeout: Duration::from_millis(100),
    })
    .unwrap();

    let error = pipeline.process("q").await.unwrap_err();

    assert!(matches!(error, PipelineError::Request(_)));
}

#[tokio::test]
async fn test_unreachable_backend_fails_task_with_internal_error() {
    let pipeline = HttpPipeline::new(HttpPipelineConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_key: None,
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    let handler = TaskHandler::new(Arc::new(InMemoryTaskStore::new()), Arc::new(pipeline));

    let task = handler
        .submit(TaskSendParams::new(
            Some("offline".to_string()),
            Message::user_text("How many products?"),
        ))
        .await;

    assert_eq!(task.status.state, TaskState::Failed);
    let text = task.status.message.unwrap().joined_text();
    assert!(text.starts_with("Internal error: "), "got {text}");
}

#[tokio::test]
async fn test_handler_completes_through_http_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ask_body()))
        .mount(&server)
        .await;
    let handler = TaskHandler::new(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(pipeline_for(&server, None)),
    );

    let task = handler
        .submit(TaskSendParams::new(
            Some("t1".to_string()),
            Message::user_text("How many products?"),
        ))
        .await;

    assert_eq!(task.status.state, TaskState::Completed);
    let data = task.artifacts[1].parts[0].as_data().unwrap();
    assert_eq!(data["sql"], "SELECT COUNT(*) AS cnt FROM SalesLT.Product");
    assert_eq!(data["row_count"], 1);
}
