//! A2A task message types
//!
//! This module defines the task, status, message, and artifact structures
//! exchanged between A2A clients and this agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque key-value bag attached to tasks, messages, and artifacts
pub type Metadata = Map<String, Value>;

/// Task lifecycle state
///
/// Serialized in kebab-case (`input-required`) per the A2A wire format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
}

impl TaskState {
    /// Terminal states never transition again through submission or cancellation
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed
        )
    }

    /// Only freshly submitted or running tasks can be canceled
    pub fn is_cancelable(self) -> bool {
        matches!(self, TaskState::Submitted | TaskState::Working)
    }

    /// Wire name of the state
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Completed => "completed",
            TaskState::Canceled => "canceled",
            TaskState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// Content part of a message or artifact
///
/// # Examples
/// ```
/// use text2sql_a2a::protocol::Part;
///
/// let part: Part = serde_json::from_str(r#"{"type":"text","text":"hello"}"#).unwrap();
/// assert_eq!(part.as_text(), Some("hello"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    /// Plain text content
    Text { text: String },
    /// Structured JSON object payload
    Data { data: Metadata },
    /// Opaque file reference
    File { file: Metadata },
}

impl Part {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn data(data: Metadata) -> Self {
        Part::Data { data }
    }

    /// Text content if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Data { .. } | Part::File { .. } => None,
        }
    }

    /// Data payload if this is a data part
    pub fn as_data(&self) -> Option<&Metadata> {
        match self {
            Part::Data { data } => Some(data),
            Part::Text { .. } | Part::File { .. } => None,
        }
    }
}

/// A message exchanged between the user and the agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Message {
    /// Single-text-part message authored by the user
    pub fn user_text<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Single-text-part message authored by the agent
    pub fn agent_text<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::Agent,
            parts: vec![Part::text(text)],
            metadata: None,
        }
    }

    /// Concatenate every text part in order, separated by a single space, trimmed
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

/// Point-in-time status of a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// RFC 3339 format with Z suffix
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    /// Status stamped with the current time
    pub fn now(state: TaskState, message: Option<Message>) -> Self {
        Self {
            state,
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Named output attached to a completed task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parts: Vec<Part>,
    /// Presentation order among the artifacts of one task
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// A unit of work and its audit trail
///
/// # Examples
/// ```
/// use text2sql_a2a::protocol::{Task, TaskState};
///
/// let task = Task::new("task-1".to_string(), Some("session-1".to_string()), None);
/// assert_eq!(task.status.state, TaskState::Submitted);
/// assert!(task.history.is_empty());
///
/// let json = serde_json::to_value(&task).unwrap();
/// assert_eq!(json["sessionId"], "session-1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// Every prior status, oldest first; never contains the current status
    #[serde(default)]
    pub history: Vec<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Task {
    /// Fresh task in the `submitted` state
    pub fn new(id: String, session_id: Option<String>, metadata: Option<Metadata>) -> Self {
        Self {
            id,
            session_id,
            status: TaskStatus::now(TaskState::Submitted, None),
            messages: Vec::new(),
            artifacts: Vec::new(),
            history: Vec::new(),
            metadata,
        }
    }

    /// Archive the current status into history and install `next`
    pub fn transition(&mut self, next: TaskStatus) {
        let previous = std::mem::replace(&mut self.status, next);
        self.history.push(previous);
    }

    /// Copy of this task keeping only the last `length` history entries
    pub fn with_history_window(&self, length: usize) -> Task {
        let mut copy = self.clone();
        let skip = copy.history.len().saturating_sub(length);
        copy.history.drain(..skip);
        copy
    }
}
