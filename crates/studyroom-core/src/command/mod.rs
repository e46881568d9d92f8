//! Spoken command handling.
//!
//! Text arrives on the channel's inbound slot and goes through three steps:
//!
//! 1. [`parser`]: lowercase, trim, and classify with ordered regex rules
//!    into a [`Command`] carrying the names as spoken.
//! 2. Resolution: match those names against the task list, by verbatim
//!    substring first and then by [`similarity`], subject to thresholds.
//! 3. Dispatch to [`StudySession`](crate::session::StudySession).
//!
//! Anything that cannot be resolved is dropped with a warning; it never
//! mutates state.

mod interpreter;
pub mod parser;
pub mod similarity;

pub use interpreter::{Applied, CommandOutcome, VoiceCommandInterpreter};
pub use parser::{Command, TimerControl};
