//! Error types for the A2A agent
//!
//! Maps internal errors onto JSON-RPC error objects and scrubs anything that
//! looks like a credential before text leaves the process.

use crate::pipeline::PipelineError;
use crate::protocol::jsonrpc::{codes, JsonRpcError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use thiserror::Error;

/// Main error type for agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl AgentError {
    /// Convert to a JSON-RPC error object for the response envelope
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            AgentError::InvalidParams { message } => JsonRpcError::new(
                codes::INVALID_PARAMS,
                format!("Invalid params: {}", sanitize_error_message(message)),
            ),
            AgentError::TaskNotFound { task_id } => {
                JsonRpcError::new(codes::TASK_NOT_FOUND, "Task not found")
                    .with_data(json!({ "taskId": task_id }))
            }
            AgentError::InternalError { message } => JsonRpcError::new(
                codes::INTERNAL_ERROR,
                format!("Internal error: {}", sanitize_error_message(message)),
            ),
            other => JsonRpcError::new(
                codes::INTERNAL_ERROR,
                format!("Internal error: {}", sanitize_error_message(&other.to_string())),
            ),
        }
    }

    /// Create invalid params error
    pub fn invalid_params<S: Into<String>>(message: S) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create task not found error
    pub fn task_not_found<S: Into<String>>(task_id: S) -> Self {
        Self::TaskNotFound {
            task_id: task_id.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|pwd|token|key|secret)[=:]\s*[^\s;]+").expect("valid regex")
});

static SECRET_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("valid regex")
});

const MAX_ERROR_MESSAGE_LEN: usize = 500;
const TRUNCATE_SUFFIX: &str = "...[truncated]";

/// Redact credential-like substrings and cap the length of client-visible error text
pub fn sanitize_error_message(message: &str) -> String {
    let sanitized = SECRET_PATTERN.replace_all(message, "${1}=***");
    let mut sanitized = SECRET_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN - TRUNCATE_SUFFIX.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(TRUNCATE_SUFFIX);
    }

    sanitized
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_not_found_mapping() {
        let error = AgentError::task_not_found("missing-id");
        let rpc = error.to_jsonrpc_error();

        assert_eq!(rpc.code, codes::TASK_NOT_FOUND);
        assert_eq!(rpc.message, "Task not found");
        assert_eq!(rpc.data, Some(json!({"taskId": "missing-id"})));
    }

    #[test]
    fn test_invalid_params_mapping() {
        let rpc = AgentError::invalid_params("missing field `message`").to_jsonrpc_error();
        assert_eq!(rpc.code, codes::INVALID_PARAMS);
        assert!(rpc.message.contains("missing field `message`"));
    }

    #[test]
    fn test_internal_error_mapping_is_sanitized() {
        let rpc = AgentError::internal_error("connect failed: Password=hunter2;").to_jsonrpc_error();
        assert_eq!(rpc.code, codes::INTERNAL_ERROR);
        assert!(!rpc.message.contains("hunter2"));
        assert!(rpc.message.starts_with("Internal error:"));
    }

    #[test]
    fn test_pipeline_error_maps_to_internal() {
        let error: AgentError = PipelineError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(error.to_jsonrpc_error().code, codes::INTERNAL_ERROR);
    }

    #[test]
    fn test_error_message_sanitization() {
        let sanitized =
            sanitize_error_message("Failed to authenticate: password=secret123 token=abc456");

        assert!(!sanitized.contains("secret123"));
        assert!(!sanitized.contains("abc456"));
        assert!(sanitized.contains("password=***"));
        assert!(sanitized.contains("token=***"));
    }

    #[test]
    fn test_connection_string_sanitization() {
        let sanitized = sanitize_error_message(
            "Login failed: Server=tcp:db;Uid=admin;Pwd=S3cret!;Encrypt=yes",
        );
        assert!(!sanitized.contains("S3cret!"));
        assert!(sanitized.contains("Encrypt=yes"));
    }

    #[test]
    fn test_sanitize_case_insensitive() {
        let sanitized = sanitize_error_message("PASSWORD=secret123 Token=abc Key=xyz");

        assert!(!sanitized.contains("secret123"));
        assert!(!sanitized.contains("abc"));
        assert!(!sanitized.contains("xyz"));
    }

    #[test]
    fn test_file_path_redaction() {
        let sanitized =
            sanitize_error_message("Failed to read /home/user/.ssh/id_rsa and /etc/secrets/api.key");

        assert!(sanitized.contains("/***REDACTED***/"));
        assert!(!sanitized.contains("/home/user/.ssh/id_rsa"));
    }

    #[test]
    fn test_long_message_truncation() {
        let sanitized = sanitize_error_message(&"x".repeat(600));

        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let sanitized = sanitize_error_message(&"é".repeat(400));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_sanitize_exactly_500_chars() {
        let sanitized = sanitize_error_message(&"x".repeat(500));
        assert_eq!(sanitized.len(), 500);
        assert!(!sanitized.contains("truncated"));
    }

    #[test]
    fn test_sanitize_empty_message() {
        assert_eq!(sanitize_error_message(""), "");
    }
}
