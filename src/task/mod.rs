//! Task lifecycle: persistence and state-machine handling

pub mod handler;
pub mod store;

pub use handler::{
    TaskHandler, CANCELED_MESSAGE, MAX_ARTIFACT_ROWS, NO_ANSWER_MESSAGE, NO_QUESTION_MESSAGE,
};
pub use store::{InMemoryTaskStore, TaskStore};
