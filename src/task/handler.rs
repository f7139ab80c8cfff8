//! Task lifecycle handler
//!
//! Drives a task from `submitted` through `working` to a terminal state:
//!
//! ```text
//! submitted --submit--> working --success--> completed
//!                       working --domain error--> failed
//!                       working --fault--> failed
//! submitted/working --cancel--> canceled
//! ```
//!
//! Every failure inside `submit` becomes a `failed` task; nothing escapes
//! to the caller. Reads and cancellation report unknown ids as `None`.
//!
//! Once a task is `working` its remaining lifecycle runs on a spawned task,
//! so dropping the `submit` future does not leave it stuck.
//!
//! Each store call is atomic but a submit performs several of them, so two
//! concurrent submits (or a submit racing a cancel) on the same id may
//! overwrite one another. Last write wins.

use crate::error::sanitize_error_message;
use crate::observability::metrics;
use crate::pipeline::{PipelineError, PipelineResult, QueryPipeline};
use crate::protocol::jsonrpc::TaskSendParams;
use crate::protocol::{Artifact, Message, Metadata, Part, Task, TaskState, TaskStatus};
use crate::task::store::TaskStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Status message when the submitted message carries no text
pub const NO_QUESTION_MESSAGE: &str =
    "No question found in the message. Please send a text question.";

/// Answer text used when the pipeline succeeds without one
pub const NO_ANSWER_MESSAGE: &str = "No answer generated.";

/// Status message installed by `cancel`
pub const CANCELED_MESSAGE: &str = "Task was canceled by the user.";

/// Rows carried in the `query_result` artifact; `row_count` keeps the full count
pub const MAX_ARTIFACT_ROWS: usize = 50;

/// How one pipeline invocation ended
#[derive(Debug)]
enum Outcome {
    Answered(PipelineResult),
    DomainError(String),
    Fault(String),
}

/// Task lifecycle handler over an injected store and pipeline
#[derive(Clone)]
pub struct TaskHandler {
    store: Arc<dyn TaskStore>,
    pipeline: Arc<dyn QueryPipeline>,
    pipeline_timeout: Option<Duration>,
}

impl TaskHandler {
    pub fn new(store: Arc<dyn TaskStore>, pipeline: Arc<dyn QueryPipeline>) -> Self {
        Self {
            store,
            pipeline,
            pipeline_timeout: None,
        }
    }

    /// Bound each pipeline call; `None` leaves it unbounded
    pub fn with_pipeline_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pipeline_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Accept a user message for a (possibly new) task and run it to a terminal state
    #[tracing::instrument(name = "submit_task", skip(self, params), fields(task_id))]
    pub async fn submit(&self, params: TaskSendParams) -> Task {
        let TaskSendParams {
            id,
            session_id,
            message,
            metadata,
            ..
        } = params;

        let task_id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("task_id", task_id.as_str());

        let mut task = self.load_or_create(&task_id, session_id, metadata);
        if task.status.state.is_terminal() {
            debug!(
                task_id = %task_id,
                previous_state = %task.status.state,
                "Re-opening terminal task for a new message"
            );
        }

        let question = message.joined_text();
        task.messages.push(message);
        task.transition(TaskStatus::now(TaskState::Working, None));
        self.store.set(task.clone());
        metrics().task_received();

        info!(
            task_id = %task_id,
            question_length = question.len(),
            "Task working"
        );

        if question.is_empty() {
            warn!(task_id = %task_id, "No question text in message");
            task.transition(TaskStatus::now(
                TaskState::Failed,
                Some(Message::agent_text(NO_QUESTION_MESSAGE)),
            ));
            self.store.set(task.clone());
            metrics().task_failed();
            return task;
        }

        // Completes even if this future is dropped
        let working = task.clone();
        let lifecycle = self.clone();
        let finishing = tokio::spawn(
            async move { lifecycle.finish(task, question).await }.instrument(tracing::Span::current()),
        );

        match finishing.await {
            Ok(task) => task,
            Err(join_error) => {
                error!(task_id = %task_id, error = %join_error, "Task lifecycle aborted");
                self.fail(
                    working,
                    format!("Internal error: {}", sanitize_error_message(&join_error.to_string())),
                )
            }
        }
    }

    async fn finish(&self, task: Task, question: String) -> Task {
        let task_id = task.id.clone();
        match self.run_pipeline(&question).await {
            Outcome::Answered(result) => self.complete(task, &question, &result),
            Outcome::DomainError(error) => {
                warn!(task_id = %task_id, error = %error, "Pipeline reported an error");
                self.fail(task, format!("Error processing query: {error}"))
            }
            Outcome::Fault(detail) => {
                error!(task_id = %task_id, error = %detail, "Pipeline invocation failed");
                self.fail(
                    task,
                    format!("Internal error: {}", sanitize_error_message(&detail)),
                )
            }
        }
    }

    /// Snapshot of a task, optionally keeping only the last `history_length` statuses
    pub fn get(&self, task_id: &str, history_length: Option<usize>) -> Option<Task> {
        let task = self.store.get(task_id)?;
        Some(match history_length {
            Some(length) => task.with_history_window(length),
            None => task,
        })
    }

    /// Cancel a submitted or working task; terminal tasks are returned unchanged
    pub fn cancel(&self, task_id: &str) -> Option<Task> {
        let _span = crate::task_span!(task_id = %task_id, operation = "cancel").entered();
        let mut task = self.store.get(task_id)?;

        if !task.status.state.is_cancelable() {
            debug!(
                task_id = %task_id,
                state = %task.status.state,
                "Cancel ignored for task in non-cancelable state"
            );
            return Some(task);
        }

        task.transition(TaskStatus::now(
            TaskState::Canceled,
            Some(Message::agent_text(CANCELED_MESSAGE)),
        ));
        self.store.set(task.clone());
        metrics().task_canceled();

        info!(task_id = %task_id, "Task canceled");
        Some(task)
    }

    fn load_or_create(
        &self,
        task_id: &str,
        session_id: Option<String>,
        metadata: Option<Metadata>,
    ) -> Task {
        self.store.get(task_id).unwrap_or_else(|| {
            let session_id = session_id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            Task::new(task_id.to_string(), Some(session_id), metadata)
        })
    }

    /// Invoke the pipeline on its own task so a panic surfaces as a join error
    async fn run_pipeline(&self, question: &str) -> Outcome {
        let pipeline = Arc::clone(&self.pipeline);
        let owned_question = question.to_string();
        let started = Instant::now();

        debug!(pipeline = pipeline.name(), "Invoking pipeline");
        let mut handle = tokio::spawn(async move { pipeline.process(&owned_question).await });

        let joined = match self.pipeline_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    metrics().pipeline_invoked(started.elapsed());
                    return Outcome::DomainError(format!("pipeline timed out after {limit:?}"));
                }
            },
            None => handle.await,
        };
        metrics().pipeline_invoked(started.elapsed());

        match joined {
            Ok(Ok(result)) => match result.domain_error() {
                Some(error) => Outcome::DomainError(error.to_string()),
                None => Outcome::Answered(result),
            },
            Ok(Err(error)) => Outcome::Fault(error.to_string()),
            Err(join_error) => Outcome::Fault(PipelineError::Join(join_error.to_string()).to_string()),
        }
    }

    fn complete(&self, mut task: Task, question: &str, result: &PipelineResult) -> Task {
        let answer = result
            .answer
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(NO_ANSWER_MESSAGE);
        let agent_message = Message::agent_text(answer);

        task.transition(TaskStatus::now(
            TaskState::Completed,
            Some(agent_message.clone()),
        ));
        task.messages.push(agent_message);
        task.artifacts = build_artifacts(answer, question, result);
        self.store.set(task.clone());
        metrics().task_completed();

        info!(
            task_id = %task.id,
            row_count = result.total_rows(),
            "Task completed"
        );
        task
    }

    fn fail(&self, mut task: Task, text: String) -> Task {
        let agent_message = Message::agent_text(text);
        task.transition(TaskStatus::now(
            TaskState::Failed,
            Some(agent_message.clone()),
        ));
        task.messages.push(agent_message);
        self.store.set(task.clone());
        metrics().task_failed();
        task
    }
}

impl std::fmt::Debug for TaskHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandler")
            .field("pipeline", &self.pipeline.name())
            .field("tasks", &self.store.len())
            .field("pipeline_timeout", &self.pipeline_timeout)
            .finish()
    }
}

/// `answer` text artifact followed by the `query_result` data artifact
fn build_artifacts(answer: &str, question: &str, result: &PipelineResult) -> Vec<Artifact> {
    let question = result
        .question
        .as_deref()
        .filter(|q| !q.is_empty())
        .unwrap_or(question);
    let rows: Vec<Value> = result
        .rows
        .iter()
        .take(MAX_ARTIFACT_ROWS)
        .map(|row| Value::Array(row.clone()))
        .collect();

    let mut data = Metadata::new();
    data.insert("question".to_string(), json!(question));
    data.insert("sql".to_string(), json!(result.sql));
    data.insert("columns".to_string(), json!(result.columns));
    data.insert("rows".to_string(), Value::Array(rows));
    data.insert("row_count".to_string(), json!(result.total_rows()));

    vec![
        Artifact {
            name: Some("answer".to_string()),
            description: Some("Natural language answer to the user's question".to_string()),
            parts: vec![Part::text(answer)],
            index: 0,
            metadata: None,
        },
        Artifact {
            name: Some("query_result".to_string()),
            description: Some("Structured SQL query and result data".to_string()),
            parts: vec![Part::data(data)],
            index: 1,
            metadata: None,
        },
    ]
}
