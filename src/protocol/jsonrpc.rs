//! JSON-RPC 2.0 envelope and A2A task method parameters

use crate::protocol::messages::{Message, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_TASKS_SEND: &str = "tasks/send";
pub const METHOD_TASKS_GET: &str = "tasks/get";
pub const METHOD_TASKS_CANCEL: &str = "tasks/cancel";

/// Methods served by the JSON-RPC endpoint
pub const SUPPORTED_METHODS: [&str; 3] = [METHOD_TASKS_SEND, METHOD_TASKS_GET, METHOD_TASKS_CANCEL];

/// JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// A2A application code for an unknown task id
    pub const TASK_NOT_FOUND: i64 = -32001;
}

/// Incoming JSON-RPC request
///
/// Fields are lenient so that structural problems can be reported as
/// `-32600` instead of failing deserialization outright.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new<S: Into<String>>(code: i64, message: S) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Outgoing JSON-RPC response; exactly one of `result` / `error` is set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Parameters for `tasks/send`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
    /// Task id; a fresh one is generated when absent or empty
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: Message,
    #[serde(default = "default_output_modes")]
    pub accepted_output_modes: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

fn default_output_modes() -> Vec<String> {
    vec!["text".to_string()]
}

impl TaskSendParams {
    /// Minimal parameters for a message, letting the handler pick the id
    pub fn new(id: Option<String>, message: Message) -> Self {
        Self {
            id,
            session_id: None,
            message,
            accepted_output_modes: default_output_modes(),
            metadata: None,
        }
    }
}

/// Parameters for `tasks/get`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    pub id: String,
    #[serde(default)]
    pub history_length: Option<usize>,
}

/// Parameters for `tasks/cancel`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskIdParams {
    pub id: String,
}
