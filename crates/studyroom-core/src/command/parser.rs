//! Intent extraction for spoken commands.
//!
//! Rules are tried in order and the first match wins. The `... under ...`
//! forms come before their plain forms, otherwise `add x under y` would be
//! read as adding a task literally named "x under y".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::view::View;

/// A parsed command. Names are still as spoken; resolving them against the
/// task list happens in the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Command {
    StartSubtask { subtask: String, task: String },
    StartTask { task: String },
    AddSubtask { subtask: String, task: String },
    AddTask { name: String },
    DeleteSubtask { subtask: String, task: String },
    DeleteTask { task: String },
    Timer { control: TimerControl },
    Navigate { view: View },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerControl {
    Pause,
    Resume,
    Finish,
    Defer,
}

// Compiled regex patterns
static START_UNDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:start|begin|resume|go|play)\s+(.+)\s+under\s+(.+)$")
        .unwrap_or_else(|e| panic!("Invalid start-under regex: {e}"))
});

static START_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:start|begin|resume|go|play)\s+(.+)$")
        .unwrap_or_else(|e| panic!("Invalid start regex: {e}"))
});

static ADD_UNDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^add\s+(.+)\s+under\s+(.+)$")
        .unwrap_or_else(|e| panic!("Invalid add-under regex: {e}"))
});

static ADD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^add\s+(.+)$").unwrap_or_else(|e| panic!("Invalid add regex: {e}")));

static DELETE_UNDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^delete\s+(.+)\s+under\s+(.+)$")
        .unwrap_or_else(|e| panic!("Invalid delete-under regex: {e}"))
});

static DELETE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^delete\s+(.+)$").unwrap_or_else(|e| panic!("Invalid delete regex: {e}"))
});

static PAUSE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // also covers "take a break"
    Regex::new(r"\b(?:pause|stop|hold|break)\b")
        .unwrap_or_else(|e| panic!("Invalid pause regex: {e}"))
});

static DEFER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:later|give up|come back)\b")
        .unwrap_or_else(|e| panic!("Invalid defer regex: {e}"))
});

static FINISH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:finish(?:ed)?|done|end task)\b")
        .unwrap_or_else(|e| panic!("Invalid finish regex: {e}"))
});

static RESUME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:start|begin|resume|go|play|continue)$")
        .unwrap_or_else(|e| panic!("Invalid resume regex: {e}"))
});

const NAV_VERBS: &[&str] = &["go", "open", "show", "navigate", "access"];
const STATS_KEYWORDS: &[&str] = &["statistics", "stats"];
const SHOP_KEYWORDS: &[&str] = &["shop", "coins", "spend"];
const METHOD_KEYWORDS: &[&str] = &["study methods", "methods", "learning advice"];
const MOTIVATION_KEYWORDS: &[&str] = &[
    "motivation",
    "motivational",
    "motivational boost",
    "inner voice",
    "motivate",
];
const BACK_KEYWORDS: &[&str] = &["go back", "home", "exit", "close", "back"];

/// Lowercase and trim, the form every rule expects.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classify `text` (normalized here) with the full rule list.
pub fn parse(text: &str) -> Option<Command> {
    let text = normalize(text);
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = START_UNDER_PATTERN.captures(&text) {
        return Some(Command::StartSubtask {
            subtask: caps[1].trim().to_string(),
            task: caps[2].trim().to_string(),
        });
    }
    if let Some(caps) = START_PATTERN.captures(&text) {
        return Some(Command::StartTask {
            task: caps[1].trim().to_string(),
        });
    }
    if let Some(caps) = ADD_UNDER_PATTERN.captures(&text) {
        return Some(Command::AddSubtask {
            subtask: caps[1].trim().to_string(),
            task: caps[2].trim().to_string(),
        });
    }
    if let Some(caps) = ADD_PATTERN.captures(&text) {
        return Some(Command::AddTask {
            name: caps[1].trim().to_string(),
        });
    }
    if let Some(caps) = DELETE_UNDER_PATTERN.captures(&text) {
        return Some(Command::DeleteSubtask {
            subtask: caps[1].trim().to_string(),
            task: caps[2].trim().to_string(),
        });
    }
    if let Some(caps) = DELETE_PATTERN.captures(&text) {
        return Some(Command::DeleteTask {
            task: caps[1].trim().to_string(),
        });
    }

    parse_control(&text)
}

/// Timer controls and navigation only. Used directly when a start command
/// names nothing on the task list ("go to statistics", "go back").
pub fn parse_control(text: &str) -> Option<Command> {
    let text = normalize(text);

    if PAUSE_PATTERN.is_match(&text) {
        return Some(Command::Timer {
            control: TimerControl::Pause,
        });
    }
    if DEFER_PATTERN.is_match(&text) {
        return Some(Command::Timer {
            control: TimerControl::Defer,
        });
    }
    if FINISH_PATTERN.is_match(&text) {
        return Some(Command::Timer {
            control: TimerControl::Finish,
        });
    }
    if RESUME_PATTERN.is_match(&text) {
        return Some(Command::Timer {
            control: TimerControl::Resume,
        });
    }

    parse_navigation(&text).map(|view| Command::Navigate { view })
}

fn parse_navigation(text: &str) -> Option<View> {
    let contains_any = |keywords: &[&str]| keywords.iter().any(|kw| text.contains(kw));
    let has_verb = contains_any(NAV_VERBS);

    if has_verb && contains_any(STATS_KEYWORDS) {
        Some(View::Statistics)
    } else if has_verb && contains_any(SHOP_KEYWORDS) {
        Some(View::Shop)
    } else if has_verb && contains_any(METHOD_KEYWORDS) {
        Some(View::StudyMethods)
    } else if has_verb && contains_any(MOTIVATION_KEYWORDS) {
        Some(View::Motivation)
    } else if contains_any(BACK_KEYWORDS) {
        Some(View::Home)
    } else {
        None
    }
}
