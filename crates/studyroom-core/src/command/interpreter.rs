//! Resolve parsed commands against the task list and apply them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parser::{self, Command, TimerControl};
use super::similarity;
use crate::channel::{CommandChannel, SlotTransport};
use crate::error::Result;
use crate::events::Event;
use crate::session::{CompletionReport, StudySession};
use crate::storage::VoiceConfig;
use crate::task::{Subtask, SubtaskId, Task, TaskId, TaskStore, TimerTarget};
use crate::timer::{messages, SessionOutcome};
use crate::view::View;

/// What a command did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Applied {
    TaskAdded { task_id: TaskId },
    SubtaskAdded { task_id: TaskId, subtask_id: SubtaskId },
    TaskDeleted { task_id: TaskId },
    SubtaskDeleted { task_id: TaskId, subtask_id: SubtaskId },
    /// Start, pause or resume.
    Timer { event: Event },
    Completed { report: Box<CompletionReport> },
    Navigated { view: View, cancelled: Option<Event> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied { command: Command, applied: Applied },
    /// Understood but not applicable: unresolved name or invalid timer state.
    Dropped { command: Command, reason: String },
    /// No rule matched.
    Ignored { text: String },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied { .. })
    }

    /// Phrase to relay back to the voice assistant, if any.
    pub fn feedback(&self) -> Option<&'static str> {
        match self {
            CommandOutcome::Applied { applied, .. } => match applied {
                Applied::Timer { event } => messages::feedback_for(event),
                Applied::Completed { report } => messages::feedback_for(&report.event()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Turns command text into task and timer operations.
#[derive(Debug, Clone)]
pub struct VoiceCommandInterpreter {
    /// Subtask-qualified commands, delete, and add-under parent.
    match_threshold: f64,
    /// Plain start commands.
    start_threshold: f64,
}

impl Default for VoiceCommandInterpreter {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}

impl VoiceCommandInterpreter {
    pub fn new(match_threshold: f64, start_threshold: f64) -> Self {
        Self {
            match_threshold,
            start_threshold,
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(config.match_threshold, config.start_threshold)
    }

    /// Read the inbound slot and handle whatever is there. The slot is
    /// cleared even when handling fails. Feedback for timer events goes out
    /// on the outbound slot.
    pub fn pump<T: SlotTransport>(
        &self,
        channel: &mut CommandChannel<T>,
        session: &mut StudySession,
        now: DateTime<Utc>,
    ) -> Result<Option<CommandOutcome>> {
        let Some(text) = channel.take_command()? else {
            return Ok(None);
        };
        let handled = self.handle(&text, session, now);
        channel.clear_command()?;
        let outcome = handled?;

        if let Some(phrase) = outcome.feedback() {
            if let Err(e) = channel.send_feedback(phrase, now) {
                tracing::warn!(error = %e, "could not send feedback");
            }
        }
        Ok(Some(outcome))
    }

    /// Classify `text` and apply it to `session`.
    pub fn handle(&self, text: &str, session: &mut StudySession, now: DateTime<Utc>) -> Result<CommandOutcome> {
        let normalized = parser::normalize(text);
        tracing::debug!(command = %normalized, "voice command received");
        let Some(command) = parser::parse(&normalized) else {
            return Ok(CommandOutcome::Ignored { text: normalized });
        };

        // "go back", "go to statistics": a start verb that names no task.
        if let Command::StartTask { task } = &command {
            if self.resolve_task(session.tasks(), task, self.start_threshold).is_err() {
                if let Some(fallback) = parser::parse_control(&normalized) {
                    return self.apply(fallback, session, now);
                }
            }
        }
        self.apply(command, session, now)
    }

    fn apply(&self, command: Command, session: &mut StudySession, now: DateTime<Utc>) -> Result<CommandOutcome> {
        let outcome = match &command {
            Command::StartTask { task } => {
                let resolved = self
                    .resolve_task(session.tasks(), task, self.start_threshold)
                    .map(|found| TimerTarget::task(found.id.clone()));
                match resolved {
                    Ok(target) => self.start(command.clone(), target, session, now)?,
                    Err(reason) => dropped(command.clone(), reason),
                }
            }
            Command::StartSubtask { subtask, task } => {
                let resolved = self
                    .resolve_subtask(session.tasks(), task, subtask)
                    .map(|(parent, sub)| TimerTarget::subtask(parent.id.clone(), sub.id.clone()));
                match resolved {
                    Ok(target) => self.start(command.clone(), target, session, now)?,
                    Err(reason) => dropped(command.clone(), reason),
                }
            }
            Command::AddTask { name } => {
                let task_id = session.create_task(name)?;
                applied(command.clone(), Applied::TaskAdded { task_id })
            }
            Command::AddSubtask { subtask, task } => {
                let resolved = self
                    .resolve_task(session.tasks(), task, self.match_threshold)
                    .map(|parent| parent.id.clone());
                match resolved {
                    Ok(task_id) => match session.create_subtask(&task_id, subtask)? {
                        Some(subtask_id) => {
                            applied(command.clone(), Applied::SubtaskAdded { task_id, subtask_id })
                        }
                        None => dropped(command.clone(), format!("task {task_id} no longer exists")),
                    },
                    Err(reason) => dropped(command.clone(), reason),
                }
            }
            Command::DeleteTask { task } => {
                let resolved = self
                    .resolve_task(session.tasks(), task, self.match_threshold)
                    .map(|found| found.id.clone());
                match resolved {
                    Ok(task_id) => {
                        session.delete_task(&task_id, now)?;
                        applied(command.clone(), Applied::TaskDeleted { task_id })
                    }
                    Err(reason) => dropped(command.clone(), reason),
                }
            }
            Command::DeleteSubtask { subtask, task } => {
                let resolved = self
                    .resolve_subtask(session.tasks(), task, subtask)
                    .map(|(parent, sub)| (parent.id.clone(), sub.id.clone()));
                match resolved {
                    Ok((task_id, subtask_id)) => {
                        session.delete_subtask(&task_id, &subtask_id, now)?;
                        applied(command.clone(), Applied::SubtaskDeleted { task_id, subtask_id })
                    }
                    Err(reason) => dropped(command.clone(), reason),
                }
            }
            Command::Timer { control } => self.control(command.clone(), *control, session, now)?,
            Command::Navigate { view } => {
                let view = *view;
                let cancelled = session.navigate(view, now)?;
                applied(command.clone(), Applied::Navigated { view, cancelled })
            }
        };
        Ok(log_outcome(outcome))
    }

    fn start(
        &self,
        command: Command,
        target: TimerTarget,
        session: &mut StudySession,
        now: DateTime<Utc>,
    ) -> Result<CommandOutcome> {
        Ok(match session.start_timer(target, now)? {
            Some(event) => applied(command, Applied::Timer { event }),
            None => dropped(command, "a session is already in progress".into()),
        })
    }

    fn control(
        &self,
        command: Command,
        control: TimerControl,
        session: &mut StudySession,
        now: DateTime<Utc>,
    ) -> Result<CommandOutcome> {
        let outcome = match control {
            TimerControl::Pause => session
                .pause(now)?
                .map(|event| Applied::Timer { event })
                .ok_or("the timer is not running"),
            TimerControl::Resume => session
                .resume(now)?
                .map(|event| Applied::Timer { event })
                .ok_or("the timer is not paused"),
            TimerControl::Finish => session
                .finish(SessionOutcome::Success, now)?
                .map(|report| Applied::Completed { report: Box::new(report) })
                .ok_or("no session to finish"),
            TimerControl::Defer => session
                .finish(SessionOutcome::Deferred, now)?
                .map(|report| Applied::Completed { report: Box::new(report) })
                .ok_or("no session to defer"),
        };
        Ok(match outcome {
            Ok(done) => applied(command, done),
            Err(reason) => dropped(command, reason.to_string()),
        })
    }

    // ── Resolution ───────────────────────────────────────────────────

    /// Find the task `spoken` refers to.
    ///
    /// A task whose full name appears verbatim in `spoken` wins outright
    /// (first in list order). Otherwise the most similar name is taken if
    /// it scores at least `threshold`; ties go to the earlier task.
    pub fn resolve_task<'a>(&self, tasks: &'a TaskStore, spoken: &str, threshold: f64) -> Result<&'a Task, String> {
        let spoken = spoken.to_lowercase();
        let direct = tasks.tasks().iter().find(|task| {
            let name = task.name.trim().to_lowercase();
            !name.is_empty() && spoken.contains(&name)
        });
        if let Some(task) = direct {
            return Ok(task);
        }

        let names: Vec<String> = tasks.tasks().iter().map(|t| t.name.to_lowercase()).collect();
        match similarity::best_match(&spoken, names.iter().map(String::as_str)) {
            Some((index, score)) if score >= threshold => Ok(&tasks.tasks()[index]),
            Some((index, score)) => Err(format!(
                "no task matches \"{spoken}\" (closest: \"{}\" at {score:.2})",
                tasks.tasks()[index].name
            )),
            None => Err(format!("no task matches \"{spoken}\": the task list is empty")),
        }
    }

    /// Find `subtask_spoken` under the task `task_spoken` refers to. Both
    /// must reach the match threshold; subtasks are matched by similarity
    /// only.
    pub fn resolve_subtask<'a>(
        &self,
        tasks: &'a TaskStore,
        task_spoken: &str,
        subtask_spoken: &str,
    ) -> Result<(&'a Task, &'a Subtask), String> {
        let parent = self.resolve_task(tasks, task_spoken, self.match_threshold)?;
        if parent.subtasks.is_empty() {
            return Err(format!("\"{}\" has no subtasks", parent.name));
        }

        let spoken = subtask_spoken.to_lowercase();
        let names: Vec<String> = parent.subtasks.iter().map(|s| s.name.to_lowercase()).collect();
        match similarity::best_match(&spoken, names.iter().map(String::as_str)) {
            Some((index, score)) if score >= self.match_threshold => Ok((parent, &parent.subtasks[index])),
            _ => Err(format!("no subtask of \"{}\" matches \"{spoken}\"", parent.name)),
        }
    }
}

fn applied(command: Command, applied: Applied) -> CommandOutcome {
    CommandOutcome::Applied { command, applied }
}

fn dropped(command: Command, reason: String) -> CommandOutcome {
    CommandOutcome::Dropped { command, reason }
}

fn log_outcome(outcome: CommandOutcome) -> CommandOutcome {
    match &outcome {
        CommandOutcome::Applied { command, .. } => tracing::info!(?command, "voice command applied"),
        CommandOutcome::Dropped { command, reason } => {
            tracing::warn!(?command, %reason, "voice command dropped")
        }
        CommandOutcome::Ignored { text } => tracing::debug!(%text, "voice command not understood"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(names: &[&str]) -> TaskStore {
        let mut store = TaskStore::empty();
        for name in names {
            store.create_task(*name);
        }
        store
    }

    #[test]
    fn substring_match_wins_over_similarity() {
        let tasks = store(&["Physics", "Maths HW", "Maths"]);
        let interp = VoiceCommandInterpreter::default();
        let found = interp.resolve_task(&tasks, "maths hw now", 0.3).unwrap();
        assert_eq!(found.name, "Maths HW");
        // "maths" is contained, "maths hw" is not: first contained name wins.
        let found = interp.resolve_task(&tasks, "maths", 0.3).unwrap();
        assert_eq!(found.name, "Maths");
    }

    #[test]
    fn fuzzy_match_respects_threshold() {
        let tasks = store(&["Maths Homework", "English"]);
        let interp = VoiceCommandInterpreter::default();
        let found = interp.resolve_task(&tasks, "mathz hw", 0.3).unwrap();
        assert_eq!(found.name, "Maths Homework");
        assert!(interp.resolve_task(&tasks, "mathz hw", 0.5).is_err());
    }

    #[test]
    fn empty_list_never_resolves() {
        let tasks = TaskStore::empty();
        let interp = VoiceCommandInterpreter::default();
        let err = interp.resolve_task(&tasks, "maths", 0.0).unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn subtask_needs_parent_with_subtasks() {
        let mut tasks = store(&["Physics"]);
        let interp = VoiceCommandInterpreter::default();
        assert!(interp
            .resolve_subtask(&tasks, "physics", "chapter one")
            .unwrap_err()
            .contains("no subtasks"));

        let id = tasks.tasks()[0].id.clone();
        tasks.create_subtask(&id, "Chapter One");
        tasks.create_subtask(&id, "Chapter Two");
        let (parent, sub) = interp.resolve_subtask(&tasks, "physics", "chapter two").unwrap();
        assert_eq!(parent.name, "Physics");
        assert_eq!(sub.name, "Chapter Two");
        assert!(interp.resolve_subtask(&tasks, "physics", "zzz").is_err());
    }
}
