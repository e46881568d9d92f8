//! Break messages and outbound feedback phrases.

use rand::seq::SliceRandom;

use crate::events::Event;
use crate::timer::SessionOutcome;

/// Shown while a session is paused.
pub const BREAK_MESSAGES: &[&str] = &[
    "Reconnect your inner voice, do you REALLY need a break?😳",
    "Stretch, breathe, and come straight back.",
    "Short breaks keep the focus sharp. Keep this one short.",
];

pub const FEEDBACK_START: &str = "WELL DONE, I'm so proud of you!!";
pub const FEEDBACK_PAUSE: &str = "WHY YOU TAKING A BREAK?!";
pub const FEEDBACK_SUCCESS: &str = "Well done, you will achieve great things!";
pub const FEEDBACK_DEFER: &str = "UNBELIEVABLE. DO BETTER NEXT TIME.";
/// Sent when a task or subtask is ticked off.
pub const FEEDBACK_TASK_CHECKED: &str = "TASK CHECKED OFF, well done mate!";

pub fn random_break_message() -> &'static str {
    BREAK_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(BREAK_MESSAGES[0])
}

/// Phrase relayed to the external channel for a timer event, if any.
pub fn feedback_for(event: &Event) -> Option<&'static str> {
    match event {
        Event::TimerStarted { .. } | Event::TimerResumed { .. } => Some(FEEDBACK_START),
        Event::TimerPaused { .. } => Some(FEEDBACK_PAUSE),
        Event::SessionCompleted(completion) => Some(match completion.outcome {
            SessionOutcome::Success => FEEDBACK_SUCCESS,
            SessionOutcome::Deferred => FEEDBACK_DEFER,
        }),
        _ => None,
    }
}
