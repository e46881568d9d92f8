pub mod completions;
pub mod config;
pub mod stats;
pub mod task;
pub mod timer;
pub mod view;
pub mod voice;

use chrono::{DateTime, Utc};
use serde::Serialize;
use studyroom_core::{
    Applied, CommandChannel, CommandOutcome, CompletionReport, Config, Database, HttpStatsStore, RateLimiter,
    TaskStore,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Command channel over its own connection to the state database.
pub fn open_channel(config: &Config) -> Result<CommandChannel<Database>, Box<dyn std::error::Error>> {
    Ok(CommandChannel::with_limiter(
        Database::open()?,
        RateLimiter::new(config.channel.debounce_ms),
    ))
}

/// Relay a phrase to the voice assistant. Failures only warn.
pub fn send_feedback(config: &Config, phrase: &str, now: DateTime<Utc>) {
    let sent = open_channel(config).and_then(|mut channel| Ok(channel.send_feedback(phrase, now)?));
    if let Err(e) = sent {
        tracing::warn!(error = %e, "could not send feedback");
    }
}

/// Find a task by id, or by name ignoring case.
pub fn find_task(tasks: &TaskStore, key: &str) -> Result<String, String> {
    let key = key.trim();
    tasks
        .tasks()
        .iter()
        .find(|t| t.id == key)
        .or_else(|| tasks.tasks().iter().find(|t| t.name.eq_ignore_ascii_case(key)))
        .map(|t| t.id.clone())
        .ok_or_else(|| format!("no task matching '{key}'"))
}

/// Find a subtask of `task_id` by id, or by name ignoring case.
pub fn find_subtask(tasks: &TaskStore, task_id: &str, key: &str) -> Result<String, String> {
    let key = key.trim();
    let task = tasks
        .get(task_id)
        .ok_or_else(|| format!("no task with id '{task_id}'"))?;
    task.subtasks
        .iter()
        .find(|s| s.id == key)
        .or_else(|| task.subtasks.iter().find(|s| s.name.eq_ignore_ascii_case(key)))
        .map(|s| s.id.clone())
        .ok_or_else(|| format!("no subtask of '{}' matching '{key}'", task.name))
}

/// Parse a signed duration: `90`, `+5m`, `-30s`, `+1h`. Unsuffixed values
/// are seconds.
pub fn parse_delta(text: &str) -> Result<i64, String> {
    let text = text.trim();
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let (digits, unit) = match rest.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&rest[..i], c.to_ascii_lowercase()),
        _ => (rest, 's'),
    };
    let scale = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        _ => return Err(format!("unknown unit in '{text}' (use s, m or h)")),
    };
    let amount: i64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{text}'"))?;
    amount
        .checked_mul(scale)
        .map(|secs| sign * secs)
        .ok_or_else(|| format!("duration '{text}' is too large"))
}

/// The report carried by a voice command that ended a session.
pub fn completed_report(outcome: &CommandOutcome) -> Option<&CompletionReport> {
    match outcome {
        CommandOutcome::Applied {
            applied: Applied::Completed { report },
            ..
        } => Some(report.as_ref()),
        _ => None,
    }
}

/// Push a completed session to the remote stats store when one is
/// configured. Failures are reported on stderr; local state is kept.
pub async fn export_remote_async(config: &Config, report: &CompletionReport) {
    let Some(endpoint) = config.analytics.endpoint.as_deref() else {
        return;
    };
    let store = HttpStatsStore::new(endpoint);
    let exported = store
        .export_completion(
            &config.analytics.user_id,
            &report.record,
            report.completion.elapsed_secs,
        )
        .await;
    if let Err(e) = exported {
        eprintln!("warning: remote export failed: {e}");
    }
}

/// Blocking [`export_remote_async`] for one-shot commands. Must not be
/// called from inside a runtime.
pub fn export_remote(config: &Config, report: &CompletionReport) {
    if config.analytics.endpoint.is_none() {
        return;
    }
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(export_remote_async(config, report)),
        Err(e) => eprintln!("warning: remote export skipped: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delta_units_and_signs() {
        assert_eq!(parse_delta("90"), Ok(90));
        assert_eq!(parse_delta("+5m"), Ok(300));
        assert_eq!(parse_delta("-30s"), Ok(-30));
        assert_eq!(parse_delta("+1h"), Ok(3600));
        assert!(parse_delta("5d").is_err());
        assert!(parse_delta("abc").is_err());
        assert!(parse_delta("").is_err());
        assert_eq!(parse_delta("9999999999999999h"), Err("duration '9999999999999999h' is too large".to_string()));
        assert!(parse_delta("-9999999999999999m").is_err());
    }

    #[test]
    fn find_task_by_id_or_name() {
        let mut tasks = TaskStore::empty();
        let id = tasks.create_task("Maths Homework");
        assert_eq!(find_task(&tasks, &id), Ok(id.clone()));
        assert_eq!(find_task(&tasks, "maths homework"), Ok(id.clone()));
        assert!(find_task(&tasks, "physics").is_err());

        let sub = tasks.create_subtask(&id, "Algebra").unwrap();
        assert_eq!(find_subtask(&tasks, &id, "ALGEBRA"), Ok(sub));
        assert!(find_subtask(&tasks, &id, "geometry").is_err());
    }
}
