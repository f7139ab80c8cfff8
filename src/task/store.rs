//! Task persistence
//!
//! The store is a pure state container: it knows nothing about lifecycle
//! rules. Every operation runs under one lock, so a reader never observes a
//! half-written task, but read-modify-write sequences spanning several calls
//! are not atomic.

use crate::protocol::Task;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Keyed storage of task records
pub trait TaskStore: Send + Sync {
    /// Current snapshot of the task, or `None` when unknown
    fn get(&self, task_id: &str) -> Option<Task>;

    /// Insert or replace the record under `task.id` (last write wins)
    fn set(&self, task: Task);

    /// Remove the record; returns whether it existed
    fn delete(&self, task_id: &str) -> bool;

    /// Number of stored tasks
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime, in-memory task store
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Map mutations are single calls, so a poisoned map is never half-written.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskStore for InMemoryTaskStore {
    fn get(&self, task_id: &str) -> Option<Task> {
        self.lock().get(task_id).cloned()
    }

    fn set(&self, task: Task) {
        self.lock().insert(task.id.clone(), task);
    }

    fn delete(&self, task_id: &str) -> bool {
        self.lock().remove(task_id).is_some()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{TaskState, TaskStatus};
    use std::sync::Arc;
    use std::thread;

    fn task(id: &str) -> Task {
        Task::new(id.to_string(), None, None)
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = InMemoryTaskStore::new();
        assert!(store.get("nope").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let store = InMemoryTaskStore::new();
        store.set(task("t1"));

        let loaded = store.get("t1").unwrap();
        assert_eq!(loaded.id, "t1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_overwrites_by_id() {
        let store = InMemoryTaskStore::new();
        store.set(task("t1"));

        let mut updated = task("t1");
        updated.transition(TaskStatus::now(TaskState::Working, None));
        store.set(updated);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("t1").unwrap().status.state, TaskState::Working);
    }

    #[test]
    fn test_get_returns_snapshot() {
        let store = InMemoryTaskStore::new();
        store.set(task("t1"));

        let mut snapshot = store.get("t1").unwrap();
        snapshot.transition(TaskStatus::now(TaskState::Failed, None));

        assert_eq!(store.get("t1").unwrap().status.state, TaskState::Submitted);
    }

    #[test]
    fn test_delete() {
        let store = InMemoryTaskStore::new();
        store.set(task("t1"));

        assert!(store.delete("t1"));
        assert!(!store.delete("t1"));
        assert!(store.get("t1").is_none());
    }

    #[test]
    fn test_concurrent_writers_distinct_ids() {
        let store = Arc::new(InMemoryTaskStore::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store.set(task(&format!("w{worker}-{i}")));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 400);
    }

    #[test]
    fn test_store_survives_poisoned_lock() {
        let store = Arc::new(InMemoryTaskStore::new());
        store.set(task("t1"));

        let poisoner = Arc::clone(&store);
        let _ = thread::spawn(move || {
            let _guard = poisoner.tasks.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(store.get("t1").is_some());
        store.set(task("t2"));
        assert_eq!(store.len(), 2);
    }
}
