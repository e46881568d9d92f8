//! Task and subtask types.
//!
//! Tasks form a two-level hierarchy: a task owns an ordered list of
//! subtasks, and both carry their own accumulated study time in seconds.
//! The hierarchy itself is owned by [`TaskStore`].

mod store;

pub(crate) use store::apply_delta;
pub use store::{TaskStore, DEFAULT_TASK_NAME};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque task identifier.
pub type TaskId = String;

/// Opaque subtask identifier (unique within its parent task).
pub type SubtaskId = String;

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A unit of study split out of a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub name: String,
    /// Accumulated study time in seconds.
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            time: 0,
            completed: false,
        }
    }
}

/// A top-level task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Study time credited to the task itself (excluding subtasks).
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            time: 0,
            completed: false,
            subtasks: Vec::new(),
        }
    }

    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    pub(crate) fn subtask_mut(&mut self, subtask_id: &str) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == subtask_id)
    }

    /// Own time plus the time of every subtask.
    pub fn total_time(&self) -> u64 {
        self.subtasks
            .iter()
            .fold(self.time, |acc, s| acc.saturating_add(s.time))
    }
}

/// What a timing session is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerTarget {
    Task { task_id: TaskId },
    Subtask { task_id: TaskId, subtask_id: SubtaskId },
}

impl TimerTarget {
    pub fn task(task_id: impl Into<String>) -> Self {
        TimerTarget::Task {
            task_id: task_id.into(),
        }
    }

    pub fn subtask(task_id: impl Into<String>, subtask_id: impl Into<String>) -> Self {
        TimerTarget::Subtask {
            task_id: task_id.into(),
            subtask_id: subtask_id.into(),
        }
    }

    /// The owning task, for both variants.
    pub fn task_id(&self) -> &str {
        match self {
            TimerTarget::Task { task_id } | TimerTarget::Subtask { task_id, .. } => task_id,
        }
    }

    pub fn subtask_id(&self) -> Option<&str> {
        match self {
            TimerTarget::Task { .. } => None,
            TimerTarget::Subtask { subtask_id, .. } => Some(subtask_id),
        }
    }
}

impl fmt::Display for TimerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerTarget::Task { task_id } => write!(f, "task:{task_id}"),
            TimerTarget::Subtask {
                task_id,
                subtask_id,
            } => write!(f, "subtask:{task_id}/{subtask_id}"),
        }
    }
}
