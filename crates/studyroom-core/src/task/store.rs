//! Owner of the task/subtask hierarchy.
//!
//! Every operation is total over the current list: an id that does not exist
//! is a no-op and is reported through the return value, never as an error.

use serde::{Deserialize, Serialize};

use super::{Subtask, SubtaskId, Task, TaskId, TimerTarget};

/// Name of the seed task used for a fresh or unreadable store.
pub const DEFAULT_TASK_NAME: &str = "Get Started!";

/// Ordered task list. Order is insertion order and is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self {
            tasks: vec![Task::new(DEFAULT_TASK_NAME)],
        }
    }
}

impl TaskStore {
    /// An empty store (no seed task).
    pub fn empty() -> Self {
        Self { tasks: Vec::new() }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn get_subtask(&self, task_id: &str, subtask_id: &str) -> Option<&Subtask> {
        self.get(task_id)?.subtask(subtask_id)
    }

    pub fn contains(&self, target: &TimerTarget) -> bool {
        self.target_name(target).is_some()
    }

    /// Display name of the task or subtask a target points at.
    pub fn target_name(&self, target: &TimerTarget) -> Option<&str> {
        match target {
            TimerTarget::Task { task_id } => self.get(task_id).map(|t| t.name.as_str()),
            TimerTarget::Subtask {
                task_id,
                subtask_id,
            } => self
                .get_subtask(task_id, subtask_id)
                .map(|s| s.name.as_str()),
        }
    }

    /// Sum of every task's own time plus all subtask times.
    pub fn total_time_studied(&self) -> u64 {
        self.tasks
            .iter()
            .map(Task::total_time)
            .fold(0, u64::saturating_add)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a new task and return its id.
    pub fn create_task(&mut self, name: impl Into<String>) -> TaskId {
        let task = Task::new(name);
        let id = task.id.clone();
        self.tasks.push(task);
        id
    }

    pub fn delete_task(&mut self, task_id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != task_id);
        self.tasks.len() != before
    }

    /// Append a subtask to `task_id`. Returns `None` if the task is unknown.
    pub fn create_subtask(&mut self, task_id: &str, name: impl Into<String>) -> Option<SubtaskId> {
        let task = self.get_mut(task_id)?;
        let subtask = Subtask::new(name);
        let id = subtask.id.clone();
        task.subtasks.push(subtask);
        Some(id)
    }

    pub fn delete_subtask(&mut self, task_id: &str, subtask_id: &str) -> bool {
        let Some(task) = self.get_mut(task_id) else {
            return false;
        };
        let before = task.subtasks.len();
        task.subtasks.retain(|s| s.id != subtask_id);
        task.subtasks.len() != before
    }

    pub fn rename_task(&mut self, task_id: &str, name: impl Into<String>) -> bool {
        match self.get_mut(task_id) {
            Some(task) => {
                task.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn rename_subtask(&mut self, task_id: &str, subtask_id: &str, name: impl Into<String>) -> bool {
        match self.subtask_mut(task_id, subtask_id) {
            Some(subtask) => {
                subtask.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Set the completion flag of a task, or of one of its subtasks.
    pub fn set_completed(&mut self, task_id: &str, subtask_id: Option<&str>, completed: bool) -> bool {
        match subtask_id {
            None => match self.get_mut(task_id) {
                Some(task) => {
                    task.completed = completed;
                    true
                }
                None => false,
            },
            Some(subtask_id) => match self.subtask_mut(task_id, subtask_id) {
                Some(subtask) => {
                    subtask.completed = completed;
                    true
                }
                None => false,
            },
        }
    }

    /// Flip the completion flag. Returns the new value.
    pub fn toggle_completed(&mut self, task_id: &str, subtask_id: Option<&str>) -> Option<bool> {
        let current = match subtask_id {
            None => self.get(task_id)?.completed,
            Some(subtask_id) => self.get_subtask(task_id, subtask_id)?.completed,
        };
        self.set_completed(task_id, subtask_id, !current);
        Some(!current)
    }

    /// Credit elapsed seconds to a task or subtask.
    pub fn add_elapsed(&mut self, target: &TimerTarget, seconds: u64) -> bool {
        match self.time_mut(target) {
            Some(time) => {
                *time = time.saturating_add(seconds);
                true
            }
            None => false,
        }
    }

    /// Apply a manual ± adjustment, clamped at 0. Returns the new time.
    pub fn adjust_time(&mut self, target: &TimerTarget, delta_secs: i64) -> Option<u64> {
        let time = self.time_mut(target)?;
        *time = apply_delta(*time, delta_secs);
        Some(*time)
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deserialize, falling back to the single seed task on any failure.
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("task list unreadable, using seed task: {e}");
                Self::default()
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    fn subtask_mut(&mut self, task_id: &str, subtask_id: &str) -> Option<&mut Subtask> {
        self.get_mut(task_id)?.subtask_mut(subtask_id)
    }

    fn time_mut(&mut self, target: &TimerTarget) -> Option<&mut u64> {
        match target {
            TimerTarget::Task { task_id } => self.get_mut(task_id).map(|t| &mut t.time),
            TimerTarget::Subtask {
                task_id,
                subtask_id,
            } => self.subtask_mut(task_id, subtask_id).map(|s| &mut s.time),
        }
    }
}

/// `value + delta`, clamped at 0.
pub(crate) fn apply_delta(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}
