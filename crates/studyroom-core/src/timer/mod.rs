mod engine;
pub mod messages;

pub use engine::{SessionOutcome, TimerEngine, TimerMode, TimerState, DEFAULT_COUNTDOWN_SECS};
