use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::TimerTarget;
use crate::timer::{SessionOutcome, TimerMode, TimerState};

/// Every timer state change produces an Event.
/// The CLI prints them; the session folds completions into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        target: TimerTarget,
        mode: TimerMode,
        /// Countdown length, only for countdown sessions.
        countdown_secs: Option<u64>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        breaks_taken: u64,
        break_message: String,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerAdjusted {
        delta_secs: i64,
        /// Elapsed (count-up) or remaining (countdown) after the adjustment.
        display_secs: u64,
        at: DateTime<Utc>,
    },
    /// Session discarded without crediting any time.
    TimerCancelled {
        target: TimerTarget,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted(SessionCompletion),
    StateSnapshot {
        state: TimerState,
        mode: TimerMode,
        target: Option<TimerTarget>,
        elapsed_secs: u64,
        remaining_secs: Option<u64>,
        countdown_secs: u64,
        breaks_taken: u64,
        break_message: Option<String>,
        at: DateTime<Utc>,
    },
}

/// Terminal report of a timing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCompletion {
    pub target: TimerTarget,
    pub elapsed_secs: u64,
    pub breaks_taken: u64,
    pub outcome: SessionOutcome,
    pub at: DateTime<Utc>,
}

impl Event {
    pub fn completion(&self) -> Option<&SessionCompletion> {
        match self {
            Event::SessionCompleted(completion) => Some(completion),
            _ => None,
        }
    }
}
