//! SQLite-based state storage.
//!
//! Provides persistent storage for:
//! - Application state (task list, breaks counter, study history, timer)
//!   in a key-value table
//! - The `voiceCommand` / `webCommand` channel slots (same table)
//! - Per-user statistics documents for the analytics export
//! - A log of completed timing sessions

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::channel::{Slot, SlotTransport};
use crate::error::{ChannelError, DatabaseError, Result};
use crate::events::SessionCompletion;
use crate::stats::StudyHistory;
use crate::task::TaskStore;
use crate::timer::{SessionOutcome, TimerEngine};
use crate::view::View;

/// Key-value slot names.
pub mod keys {
    pub const TASK_ITEMS: &str = "taskItems";
    pub const BREAKS_TAKEN: &str = "breaksTaken";
    pub const STUDY_HISTORY: &str = "studyHistory";
    pub const TIMER_ENGINE: &str = "timerEngine";
    pub const VIEW_STATE: &str = "viewState";
}

/// A completed session as stored in the `sessions` log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub target_name: String,
    pub elapsed_secs: u64,
    pub breaks_taken: u64,
    pub outcome: String,
    pub completed_at: DateTime<Utc>,
}

/// Current screen and whether a follow-up is queued for when the open
/// dialog closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub pending_follow_up: bool,
}

/// Everything read back at startup.
#[derive(Debug, Clone, Default)]
pub struct PersistedState {
    pub tasks: TaskStore,
    pub breaks_taken: u64,
    pub history: StudyHistory,
    /// `None` when no engine was saved or it could not be read.
    pub engine: Option<TimerEngine>,
    pub view: ViewState,
}

/// SQLite database for application state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/studyroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("studyroom.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS statistics (
                user_id TEXT PRIMARY KEY,
                doc     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                target_name  TEXT NOT NULL,
                elapsed_secs INTEGER NOT NULL,
                breaks_taken INTEGER NOT NULL DEFAULT 0,
                outcome      TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Application state ────────────────────────────────────────────

    /// Read the persisted state. Missing keys yield defaults; unreadable
    /// values are logged and replaced by defaults.
    pub fn load_state(&self) -> Result<PersistedState, DatabaseError> {
        let tasks = match self.kv_get(keys::TASK_ITEMS)? {
            Some(json) => TaskStore::from_json_or_default(&json),
            None => TaskStore::default(),
        };

        let breaks_taken = match self.kv_get(keys::BREAKS_TAKEN)? {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
                tracing::warn!("breaks counter unreadable ({raw:?}: {e}), resetting to 0");
                0
            }),
            None => 0,
        };

        let history = match self.kv_get(keys::STUDY_HISTORY)? {
            Some(json) => StudyHistory::from_json_or_default(&json),
            None => StudyHistory::default(),
        };

        let engine = match self.kv_get(keys::TIMER_ENGINE)? {
            Some(json) => match serde_json::from_str::<TimerEngine>(&json) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!("saved timer unreadable, discarding it: {e}");
                    None
                }
            },
            None => None,
        };

        let view = match self.kv_get(keys::VIEW_STATE)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("view state unreadable, showing home: {e}");
                ViewState::default()
            }),
            None => ViewState::default(),
        };

        Ok(PersistedState {
            tasks,
            breaks_taken,
            history,
            engine,
            view,
        })
    }

    pub fn save_tasks(&self, tasks: &TaskStore) -> Result<(), DatabaseError> {
        let json = tasks
            .to_json()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(self.kv_set(keys::TASK_ITEMS, &json)?)
    }

    pub fn save_breaks(&self, breaks_taken: u64) -> Result<(), DatabaseError> {
        Ok(self.kv_set(keys::BREAKS_TAKEN, &breaks_taken.to_string())?)
    }

    pub fn save_history(&self, history: &StudyHistory) -> Result<(), DatabaseError> {
        let json = history
            .to_json()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(self.kv_set(keys::STUDY_HISTORY, &json)?)
    }

    pub fn save_engine(&self, engine: &TimerEngine) -> Result<(), DatabaseError> {
        let json =
            serde_json::to_string(engine).map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(self.kv_set(keys::TIMER_ENGINE, &json)?)
    }

    pub fn save_view(&self, view: &ViewState) -> Result<(), DatabaseError> {
        let json =
            serde_json::to_string(view).map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(self.kv_set(keys::VIEW_STATE, &json)?)
    }

    // ── Statistics documents ─────────────────────────────────────────

    /// Raw statistics document for `user_id`.
    pub fn statistics_get(&self, user_id: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT doc FROM statistics WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
    }

    pub fn statistics_put(&self, user_id: &str, doc: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO statistics (user_id, doc) VALUES (?1, ?2)",
            params![user_id, doc],
        )?;
        Ok(())
    }

    // ── Session log ──────────────────────────────────────────────────

    /// Record a completed session to the database.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        target_name: &str,
        completion: &SessionCompletion,
    ) -> Result<i64, rusqlite::Error> {
        let outcome = match completion.outcome {
            SessionOutcome::Success => "success",
            SessionOutcome::Deferred => "deferred",
        };
        self.conn.execute(
            "INSERT INTO sessions (target_name, elapsed_secs, breaks_taken, outcome, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                target_name,
                completion.elapsed_secs,
                completion.breaks_taken,
                outcome,
                completion.at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target_name, elapsed_secs, breaks_taken, outcome, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            let completed_at: String = row.get(5)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
                })?;
            Ok(SessionRecord {
                id: row.get(0)?,
                target_name: row.get(1)?,
                elapsed_secs: row.get(2)?,
                breaks_taken: row.get(3)?,
                outcome: row.get(4)?,
                completed_at,
            })
        })?;
        let sessions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }
}

impl SlotTransport for Database {
    fn read(&self, slot: Slot) -> Result<Option<String>, ChannelError> {
        self.kv_get(slot.key()).map_err(|e| ChannelError::ReadFailed {
            slot: slot.to_string(),
            message: e.to_string(),
        })
    }

    fn write(&self, slot: Slot, value: Option<&str>) -> Result<(), ChannelError> {
        let result = match value {
            Some(v) => self.kv_set(slot.key(), v),
            // An empty slot is stored as the empty string, the way the
            // voice assistant expects to find it.
            None => self.kv_set(slot.key(), ""),
        };
        result.map_err(|e| ChannelError::WriteFailed {
            slot: slot.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TimerTarget;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn empty_database_loads_seed_state() {
        let db = Database::open_memory().unwrap();
        let state = db.load_state().unwrap();
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks.tasks()[0].name, "Get Started!");
        assert_eq!(state.breaks_taken, 0);
        assert!(state.history.is_empty());
        assert!(state.engine.is_none());
        assert_eq!(state.view.view, View::Home);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let db = Database::open_memory().unwrap();
        db.kv_set(keys::TASK_ITEMS, "{not json").unwrap();
        db.kv_set(keys::BREAKS_TAKEN, "many").unwrap();
        db.kv_set(keys::STUDY_HISTORY, "[]").unwrap();
        db.kv_set(keys::TIMER_ENGINE, "null?").unwrap();
        let state = db.load_state().unwrap();
        assert_eq!(state.tasks.tasks()[0].name, "Get Started!");
        assert_eq!(state.breaks_taken, 0);
        assert!(state.history.is_empty());
        assert!(state.engine.is_none());
    }

    #[test]
    fn state_round_trips() {
        let db = Database::open_memory().unwrap();
        let mut tasks = TaskStore::empty();
        let id = tasks.create_task("Maths");
        tasks.add_elapsed(&TimerTarget::task(id.clone()), 90);
        let mut history = StudyHistory::new();
        history.record("Monday 19 Oct", "Maths", 90);

        db.save_tasks(&tasks).unwrap();
        db.save_breaks(3).unwrap();
        db.save_history(&history).unwrap();
        db.save_engine(&TimerEngine::default()).unwrap();
        let view = ViewState {
            view: View::Statistics,
            pending_follow_up: true,
        };
        db.save_view(&view).unwrap();

        let state = db.load_state().unwrap();
        assert_eq!(state.view, view);
        assert_eq!(state.tasks, tasks);
        assert_eq!(state.breaks_taken, 3);
        assert_eq!(state.history, history);
        assert!(state.engine.is_some());
    }

    #[test]
    fn slots_are_stored_in_kv() {
        let db = Database::open_memory().unwrap();
        db.write(Slot::VoiceCommand, Some("start maths")).unwrap();
        assert_eq!(db.kv_get("voiceCommand").unwrap().as_deref(), Some("start maths"));
        db.write(Slot::VoiceCommand, None).unwrap();
        assert_eq!(db.read(Slot::VoiceCommand).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn statistics_documents() {
        let db = Database::open_memory().unwrap();
        assert!(db.statistics_get("u1").unwrap().is_none());
        db.statistics_put("u1", r#"{"totalTimeStudied":"00:01:00"}"#).unwrap();
        assert_eq!(
            db.statistics_get("u1").unwrap().as_deref(),
            Some(r#"{"totalTimeStudied":"00:01:00"}"#)
        );
    }

    #[test]
    fn session_log_is_newest_first() {
        let db = Database::open_memory().unwrap();
        let base = Utc::now();
        for (i, name) in ["Maths", "Physics"].iter().enumerate() {
            let completion = SessionCompletion {
                target: TimerTarget::task("t"),
                elapsed_secs: 60 * (i as u64 + 1),
                breaks_taken: i as u64,
                outcome: SessionOutcome::Success,
                at: base + chrono::Duration::seconds(i as i64),
            };
            db.record_session(name, &completion).unwrap();
        }
        let sessions = db.list_sessions(10).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].target_name, "Physics");
        assert_eq!(sessions[0].elapsed_secs, 120);
        assert_eq!(sessions[1].outcome, "success");
        assert_eq!(db.list_sessions(1).unwrap().len(), 1);
    }
}
