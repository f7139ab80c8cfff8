//! Text-to-SQL A2A Agent
//!
//! An Agent-to-Agent (A2A) task server that answers natural-language
//! questions about a relational database by delegating to a Text-to-SQL
//! pipeline.
//!
//! # Overview
//!
//! - Task lifecycle state machine with an append-only status history
//! - In-memory task store injected into the handler
//! - JSON-RPC 2.0 server (`tasks/send`, `tasks/get`, `tasks/cancel`) and Agent Card
//! - HTTP client for the REST pipeline backend
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use text2sql_a2a::pipeline::PipelineResult;
//! use text2sql_a2a::protocol::{Message, TaskSendParams, TaskState};
//! use text2sql_a2a::task::{InMemoryTaskStore, TaskHandler};
//! use text2sql_a2a::testing::MockPipeline;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pipeline = MockPipeline::answering(PipelineResult::answered(
//!     "How many products?",
//!     "SELECT COUNT(*) AS cnt FROM Products",
//!     vec!["cnt".to_string()],
//!     vec![vec![json!(10)]],
//!     "There are 10 products.",
//! ));
//! let handler = TaskHandler::new(Arc::new(InMemoryTaskStore::new()), Arc::new(pipeline));
//!
//! let params = TaskSendParams::new(Some("t1".to_string()), Message::user_text("How many products?"));
//! let task = handler.submit(params).await;
//!
//! assert_eq!(task.status.state, TaskState::Completed);
//! assert_eq!(task.artifacts.len(), 2);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod task;
pub mod testing;

pub use config::*;
pub use error::{AgentError, AgentResult};
pub use pipeline::{HttpPipeline, PipelineError, PipelineResult, QueryPipeline};
pub use protocol::*;
pub use server::A2aServer;
pub use task::{InMemoryTaskStore, TaskHandler, TaskStore};
