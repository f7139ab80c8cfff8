//! JSON-RPC 2.0 dispatch onto the task handler
//!
//! Every request produces a response envelope; protocol and domain failures
//! are reported in `error`, never as transport-level failures.

use crate::error::{AgentError, AgentResult};
use crate::observability::metrics;
use crate::protocol::jsonrpc::{
    codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse, TaskIdParams, TaskQueryParams,
    TaskSendParams, JSONRPC_VERSION, METHOD_TASKS_CANCEL, METHOD_TASKS_GET, METHOD_TASKS_SEND,
    SUPPORTED_METHODS,
};
use crate::task::TaskHandler;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn, Instrument};

/// Decode a raw request body and dispatch it
pub async fn handle_body(handler: &TaskHandler, body: &[u8]) -> JsonRpcResponse {
    metrics().rpc_request();

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Rejected unparseable JSON-RPC body");
            return error_response(
                None,
                JsonRpcError::new(codes::PARSE_ERROR, format!("Parse error: {e}")),
            );
        }
    };

    let id = value.get("id").cloned();
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return error_response(
                id,
                JsonRpcError::new(codes::INVALID_REQUEST, format!("Invalid Request: {e}")),
            );
        }
    };

    dispatch(handler, request).await
}

/// Route a decoded request to `tasks/send`, `tasks/get`, or `tasks/cancel`
pub async fn dispatch(handler: &TaskHandler, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest {
        jsonrpc,
        id,
        method,
        params,
    } = request;

    if jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        return error_response(
            id,
            JsonRpcError::new(
                codes::INVALID_REQUEST,
                "Invalid Request: jsonrpc must be \"2.0\"",
            ),
        );
    }

    let method = match method {
        Some(method) if !method.is_empty() => method,
        _ => {
            return error_response(
                id,
                JsonRpcError::new(codes::INVALID_REQUEST, "Invalid Request: missing method"),
            );
        }
    };

    let span = crate::rpc_span!(method = %method);
    let outcome = route(handler, &method, params).instrument(span).await;

    match outcome {
        Ok(Some(result)) => JsonRpcResponse::success(id, result),
        Ok(None) => error_response(
            id,
            JsonRpcError::new(
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            )
            .with_data(json!({ "supportedMethods": SUPPORTED_METHODS })),
        ),
        Err(e) => {
            debug!(method = %method, error = %e, "JSON-RPC request failed");
            error_response(id, e.to_jsonrpc_error())
        }
    }
}

async fn route(
    handler: &TaskHandler,
    method: &str,
    params: Option<Value>,
) -> AgentResult<Option<Value>> {
    debug!("Dispatching JSON-RPC request");
    match method {
        METHOD_TASKS_SEND => {
            let params: TaskSendParams = parse_params(params)?;
            Ok(Some(serde_json::to_value(handler.submit(params).await)?))
        }
        METHOD_TASKS_GET => {
            let params: TaskQueryParams = parse_params(params)?;
            let task = handler
                .get(&params.id, params.history_length)
                .ok_or_else(|| AgentError::task_not_found(params.id.as_str()))?;
            Ok(Some(serde_json::to_value(task)?))
        }
        METHOD_TASKS_CANCEL => {
            let params: TaskIdParams = parse_params(params)?;
            let task = handler
                .cancel(&params.id)
                .ok_or_else(|| AgentError::task_not_found(params.id.as_str()))?;
            Ok(Some(serde_json::to_value(task)?))
        }
        _ => Ok(None),
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> AgentResult<T> {
    let params = params.ok_or_else(|| AgentError::invalid_params("params are required"))?;
    serde_json::from_value(params).map_err(|e| AgentError::invalid_params(e.to_string()))
}

fn error_response(id: Option<Value>, error: JsonRpcError) -> JsonRpcResponse {
    metrics().rpc_error();
    JsonRpcResponse::failure(id, error)
}
