//! Application state owner.
//!
//! [`StudySession`] holds the task list, the timer, the study history, the
//! breaks counter and the current view, and writes each of them back to the
//! [`Database`] as soon as it changes. Every mutation, whether it came from
//! the CLI or a spoken command, goes through here.
//!
//! Completing a session credits the task list first, then today's history
//! bucket, then the breaks counter, then persists and exports.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{self, StatsRecord};
use crate::error::Result;
use crate::events::{Event, SessionCompletion};
use crate::stats::{day_label, StudyHistory, StudyStats};
use crate::storage::{Config, Database, ViewState};
use crate::task::{SubtaskId, TaskId, TaskStore, TimerTarget};
use crate::timer::{SessionOutcome, TimerEngine, TimerMode};
use crate::view::View;

/// Outcome of a completed timing session after it has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub completion: SessionCompletion,
    /// Name the time was credited under; `None` if the target vanished.
    pub target_name: Option<String>,
    /// History bucket the time went into.
    pub day: String,
    pub total_time_studied: u64,
    /// The record exported for the configured user.
    pub record: StatsRecord,
    /// Set when the local export failed; local state is kept regardless.
    pub export_error: Option<String>,
}

impl CompletionReport {
    /// The completion as an event, for printing and feedback.
    pub fn event(&self) -> Event {
        Event::SessionCompleted(self.completion.clone())
    }
}

/// History bucket for `now` in the local time zone.
pub fn day_for(now: DateTime<Utc>) -> String {
    day_label(&now.with_timezone(&Local))
}

pub struct StudySession {
    db: Database,
    config: Config,
    tasks: TaskStore,
    engine: TimerEngine,
    history: StudyHistory,
    breaks_taken: u64,
    view: ViewState,
}

impl StudySession {
    /// Load state from `db`. A missing or unreadable timer starts idle with
    /// the configured mode and countdown length.
    pub fn open(db: Database, config: Config) -> Result<Self> {
        let state = db.load_state()?;
        let engine = state
            .engine
            .unwrap_or_else(|| TimerEngine::new(config.timer.default_mode, config.countdown_secs()));
        Ok(Self {
            db,
            config,
            tasks: state.tasks,
            engine,
            history: state.history,
            breaks_taken: state.breaks_taken,
            view: state.view,
        })
    }

    /// Open the database and configuration in the data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Database::open()?, Config::load()?)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn history(&self) -> &StudyHistory {
        &self.history
    }

    pub fn breaks_taken(&self) -> u64 {
        self.breaks_taken
    }

    pub fn view(&self) -> View {
        self.view.view
    }

    pub fn pending_follow_up(&self) -> bool {
        self.view.pending_follow_up
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        self.engine.snapshot(now)
    }

    pub fn stats(&self) -> StudyStats {
        StudyStats::compute(self.tasks.tasks(), self.breaks_taken, &self.history)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(&mut self, name: &str) -> Result<TaskId> {
        let id = self.tasks.create_task(name.trim());
        tracing::info!(task_id = %id, name, "task created");
        self.save_tasks()?;
        Ok(id)
    }

    /// Delete a task and its subtasks. A running session on it is discarded.
    pub fn delete_task(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<bool> {
        if !self.tasks.delete_task(task_id) {
            return Ok(false);
        }
        if self.engine.target().is_some_and(|t| t.task_id() == task_id) {
            self.cancel(now)?;
        }
        tracing::info!(task_id, "task deleted");
        self.save_tasks()?;
        Ok(true)
    }

    pub fn create_subtask(&mut self, task_id: &str, name: &str) -> Result<Option<SubtaskId>> {
        let id = self.tasks.create_subtask(task_id, name.trim());
        if id.is_some() {
            tracing::info!(task_id, name, "subtask created");
            self.save_tasks()?;
        }
        Ok(id)
    }

    pub fn delete_subtask(&mut self, task_id: &str, subtask_id: &str, now: DateTime<Utc>) -> Result<bool> {
        if !self.tasks.delete_subtask(task_id, subtask_id) {
            return Ok(false);
        }
        if self.engine.target() == Some(&TimerTarget::subtask(task_id, subtask_id)) {
            self.cancel(now)?;
        }
        tracing::info!(task_id, subtask_id, "subtask deleted");
        self.save_tasks()?;
        Ok(true)
    }

    pub fn rename_task(&mut self, task_id: &str, name: &str) -> Result<bool> {
        let changed = self.tasks.rename_task(task_id, name.trim());
        if changed {
            self.save_tasks()?;
        }
        Ok(changed)
    }

    pub fn rename_subtask(&mut self, task_id: &str, subtask_id: &str, name: &str) -> Result<bool> {
        let changed = self.tasks.rename_subtask(task_id, subtask_id, name.trim());
        if changed {
            self.save_tasks()?;
        }
        Ok(changed)
    }

    pub fn set_completed(&mut self, task_id: &str, subtask_id: Option<&str>, completed: bool) -> Result<bool> {
        let changed = self.tasks.set_completed(task_id, subtask_id, completed);
        if changed {
            self.save_tasks()?;
        }
        Ok(changed)
    }

    /// Flip the completed flag. Returns the new value.
    pub fn toggle_completed(&mut self, task_id: &str, subtask_id: Option<&str>) -> Result<Option<bool>> {
        let toggled = self.tasks.toggle_completed(task_id, subtask_id);
        if toggled.is_some() {
            self.save_tasks()?;
        }
        Ok(toggled)
    }

    /// Manually correct the time recorded for a task or subtask. Today's
    /// history bucket moves by the same amount. Returns the new time.
    pub fn adjust_task_time(&mut self, target: &TimerTarget, delta_secs: i64, now: DateTime<Utc>) -> Result<Option<u64>> {
        let Some(time) = self.tasks.adjust_time(target, delta_secs) else {
            return Ok(None);
        };
        if let Some(name) = self.tasks.target_name(target).map(str::to_string) {
            self.history.record(&day_for(now), &name, delta_secs);
            self.db.save_history(&self.history)?;
        }
        self.save_tasks()?;
        Ok(Some(time))
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Start timing `target` with the engine's current mode and countdown.
    pub fn start_timer(&mut self, target: TimerTarget, now: DateTime<Utc>) -> Result<Option<Event>> {
        self.start_timer_with(target, self.engine.mode(), None, now)
    }

    /// Start timing `target`. Unknown targets are ignored.
    pub fn start_timer_with(
        &mut self,
        target: TimerTarget,
        mode: TimerMode,
        countdown_secs: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        if !self.tasks.contains(&target) {
            tracing::warn!(timer_target = %target, "cannot start timer: no such task");
            return Ok(None);
        }
        let event = self.engine.start(target, mode, countdown_secs, now);
        if event.is_some() {
            self.view.view = View::Timer;
            self.save_engine()?;
            self.save_view()?;
        }
        Ok(event)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<Option<Event>> {
        let event = self.engine.pause(now);
        self.save_engine_if(event.is_some())?;
        Ok(event)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Option<Event>> {
        let event = self.engine.resume(now);
        self.save_engine_if(event.is_some())?;
        Ok(event)
    }

    pub fn adjust_timer(&mut self, delta_secs: i64, now: DateTime<Utc>) -> Result<Option<Event>> {
        let event = self.engine.adjust(delta_secs, now);
        self.save_engine_if(event.is_some())?;
        Ok(event)
    }

    pub fn set_mode(&mut self, mode: TimerMode) -> Result<bool> {
        let changed = self.engine.set_mode(mode);
        self.save_engine_if(changed)?;
        Ok(changed)
    }

    pub fn set_countdown_minutes(&mut self, minutes: u64) -> Result<bool> {
        let changed = self.engine.set_countdown_minutes(minutes);
        self.save_engine_if(changed)?;
        Ok(changed)
    }

    /// Advance the clock. Returns a report when a countdown runs out.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<CompletionReport>> {
        match self.engine.tick(now) {
            Some(Event::SessionCompleted(completion)) => self.complete(completion).map(Some),
            _ => Ok(None),
        }
    }

    pub fn finish(&mut self, outcome: SessionOutcome, now: DateTime<Utc>) -> Result<Option<CompletionReport>> {
        match self.engine.finish(outcome, now) {
            Some(Event::SessionCompleted(completion)) => self.complete(completion).map(Some),
            _ => Ok(None),
        }
    }

    /// Discard the current session without crediting it.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<Option<Event>> {
        let event = self.engine.cancel(now);
        if event.is_some() {
            tracing::info!("session cancelled");
            if self.view.view == View::Timer {
                self.view.view = View::Home;
                self.save_view()?;
            }
            self.save_engine()?;
        }
        Ok(event)
    }

    fn complete(&mut self, completion: SessionCompletion) -> Result<CompletionReport> {
        let target_name = self.tasks.target_name(&completion.target).map(str::to_string);
        let day = day_for(completion.at);

        self.tasks.add_elapsed(&completion.target, completion.elapsed_secs);
        if let Some(name) = &target_name {
            let delta = i64::try_from(completion.elapsed_secs).unwrap_or(i64::MAX);
            self.history.record(&day, name, delta);
        }
        self.breaks_taken = self.breaks_taken.saturating_add(completion.breaks_taken);
        if self.view.view == View::Timer {
            self.view.view = View::Home;
        }

        self.save_tasks()?;
        self.db.save_history(&self.history)?;
        self.db.save_breaks(self.breaks_taken)?;
        self.save_engine()?;
        self.save_view()?;
        self.db
            .record_session(target_name.as_deref().unwrap_or("(deleted)"), &completion)?;

        let total_time_studied = self.tasks.total_time_studied();
        let record = StatsRecord::from_secs(total_time_studied);
        let export_error = match analytics::export_completion(
            &self.db,
            &self.config.analytics.user_id,
            &record,
            completion.elapsed_secs,
        ) {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "statistics export failed");
                Some(e.to_string())
            }
        };

        tracing::info!(
            timer_target = %completion.target,
            elapsed_secs = completion.elapsed_secs,
            outcome = ?completion.outcome,
            "session completed"
        );

        Ok(CompletionReport {
            completion,
            target_name,
            day,
            total_time_studied,
            record,
            export_error,
        })
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Switch views. Leaving the timer while a session is active discards
    /// it; the cancellation event is returned.
    pub fn navigate(&mut self, view: View, now: DateTime<Utc>) -> Result<Option<Event>> {
        let cancelled = if view != View::Timer && self.engine.is_active() {
            self.engine.cancel(now)
        } else {
            None
        };
        if cancelled.is_some() {
            self.save_engine()?;
        }
        self.view.view = view;
        self.save_view()?;
        tracing::info!(%view, "navigated");
        Ok(cancelled)
    }

    /// Queue the motivation page for when the open dialog closes.
    pub fn request_follow_up(&mut self) -> Result<()> {
        self.view.pending_follow_up = true;
        self.save_view()
    }

    /// The open dialog closed. Fires the queued follow-up, at most once.
    pub fn modal_closed(&mut self) -> Result<Option<View>> {
        if !self.view.pending_follow_up {
            return Ok(None);
        }
        self.view.pending_follow_up = false;
        self.view.view = View::Motivation;
        self.save_view()?;
        Ok(Some(View::Motivation))
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn save_tasks(&self) -> Result<()> {
        Ok(self.db.save_tasks(&self.tasks)?)
    }

    fn save_engine(&self) -> Result<()> {
        Ok(self.db.save_engine(&self.engine)?)
    }

    fn save_engine_if(&self, changed: bool) -> Result<()> {
        if changed {
            self.save_engine()?;
        }
        Ok(())
    }

    fn save_view(&self) -> Result<()> {
        Ok(self.db.save_view(&self.view)?)
    }
}
