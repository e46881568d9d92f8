//! # Studyroom Core Library
//!
//! This library provides the core logic for Studyroom, a personal study
//! tracker. It follows a CLI-first philosophy: every operation is available
//! through the standalone `studyroom` binary, which is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Tasks**: a two-level task/subtask hierarchy with accumulated study time
//! - **Timer Engine**: a wall-clock-based state machine (count-up or
//!   count-down) that requires the caller to periodically invoke `tick()`
//! - **Voice Commands**: regex intent extraction plus fuzzy name matching,
//!   fed from an external command channel
//! - **Statistics**: a date-bucketed study ledger, focus score and trends
//! - **Storage**: SQLite state and TOML configuration
//!
//! ## Key Components
//!
//! - [`StudySession`]: owns all application state and persists it
//! - [`TimerEngine`]: core timer state machine
//! - [`VoiceCommandInterpreter`]: turns command text into operations
//! - [`CommandChannel`]: rate-limited relay to the voice assistant
//! - [`Database`]: state, command slots and statistics documents
//! - [`Config`]: application configuration management

pub mod analytics;
pub mod channel;
pub mod command;
pub mod error;
pub mod events;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;
pub mod view;

pub use analytics::{HttpStatsStore, StatsRecord, StatsStore};
pub use channel::{CommandChannel, MemoryTransport, RateLimiter, Slot, SlotTransport};
pub use command::{Applied, Command, CommandOutcome, TimerControl, VoiceCommandInterpreter};
pub use error::{ChannelError, ConfigError, CoreError, DatabaseError, ExportError, Result};
pub use events::{Event, SessionCompletion};
pub use session::{CompletionReport, StudySession};
pub use stats::{StudyHistory, StudyStats};
pub use storage::{data_dir, Config, Database};
pub use task::{Subtask, SubtaskId, Task, TaskId, TaskStore, TimerTarget};
pub use timer::{SessionOutcome, TimerEngine, TimerMode, TimerState};
pub use view::View;
