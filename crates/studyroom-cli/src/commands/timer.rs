use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use studyroom_core::stats::format::format_clock;
use studyroom_core::timer::messages::feedback_for;
use studyroom_core::{CompletionReport, Event, SessionOutcome, StudySession, TimerMode, TimerTarget};

use super::{export_remote, find_subtask, find_task, parse_delta, print_json, send_feedback, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Open-ended stopwatch
    Countup,
    /// Fixed duration that completes on its own
    Countdown,
}

impl From<ModeArg> for TimerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Countup => TimerMode::CountUp,
            ModeArg::Countdown => TimerMode::CountDown,
        }
    }
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start timing a task or subtask
    Start {
        /// Task id or name
        task: String,
        /// Time this subtask of the task instead
        #[arg(long)]
        sub: Option<String>,
        /// Timer mode for this session
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Countdown length in minutes
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Shift the running session's time
    Adjust {
        /// Signed amount (+5m, -30s); a bare + or - uses the configured step
        #[arg(allow_hyphen_values = true)]
        delta: String,
    },
    /// Finish the session and credit its time
    Finish {
        /// Open the motivation page once the summary is dismissed
        #[arg(long)]
        reflect: bool,
    },
    /// Stop for now; the time is still credited
    Defer,
    /// Discard the session without crediting it
    Cancel,
    /// Set the mode and countdown length used by `start`
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
        /// Countdown length in minutes
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Print current timer state as JSON
    Status {
        /// Print only the clock face (MM:SS)
        #[arg(long)]
        clock: bool,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    let mut session = StudySession::open_default()?;
    let now = Utc::now();

    // A countdown may have run out since the last command.
    if let Some(report) = session.tick(now)? {
        report_completion(&session, &report)?;
        if matches!(action, TimerAction::Status { .. }) {
            return Ok(());
        }
    }

    match action {
        TimerAction::Start {
            task,
            sub,
            mode,
            minutes,
        } => {
            let id = find_task(session.tasks(), &task)?;
            let target = match sub {
                Some(sub) => TimerTarget::subtask(id.clone(), find_subtask(session.tasks(), &id, &sub)?),
                None => TimerTarget::task(id),
            };
            let mode = mode.map(TimerMode::from).unwrap_or(session.engine().mode());
            let event = session.start_timer_with(target, mode, minutes.map(|m| m.saturating_mul(60)), now)?;
            emit(&session, event, "start: a session is already in progress", now)?;
        }
        TimerAction::Pause => {
            let event = session.pause(now)?;
            emit(&session, event, "pause: timer is not running", now)?;
        }
        TimerAction::Resume => {
            let event = session.resume(now)?;
            emit(&session, event, "resume: timer is not paused", now)?;
        }
        TimerAction::Adjust { delta } => {
            let step = i64::try_from(session.config().timer.adjust_step_secs).unwrap_or(i64::MAX);
            let delta = match delta.trim() {
                "+" => step,
                "-" => -step,
                other => parse_delta(other)?,
            };
            let event = session.adjust_timer(delta, now)?;
            emit(&session, event, "adjust: timer is not running", now)?;
        }
        TimerAction::Finish { reflect } => {
            let report = session.finish(SessionOutcome::Success, now)?;
            let Some(report) = report else {
                return Err("finish: no session in progress".into());
            };
            report_completion(&session, &report)?;
            if reflect {
                session.request_follow_up()?;
            }
        }
        TimerAction::Defer => {
            let report = session.finish(SessionOutcome::Deferred, now)?;
            let Some(report) = report else {
                return Err("defer: no session in progress".into());
            };
            report_completion(&session, &report)?;
        }
        TimerAction::Cancel => {
            let event = session.cancel(now)?;
            emit(&session, event, "cancel: no session in progress", now)?;
        }
        TimerAction::Mode { mode, minutes } => {
            let mut changed = session.set_mode(mode.into())?;
            if let Some(minutes) = minutes {
                changed |= session.set_countdown_minutes(minutes)?;
            }
            if !changed && session.engine().is_active() {
                return Err("mode: cannot change while a session is in progress".into());
            }
            print_json(&session.snapshot(now))?;
        }
        TimerAction::Status { clock } => {
            if clock {
                println!("{}", format_clock(session.engine().display_secs(now)));
            } else {
                print_json(&session.snapshot(now))?;
            }
        }
    }
    Ok(())
}

fn emit(session: &StudySession, event: Option<Event>, refused: &str, now: DateTime<Utc>) -> CliResult {
    let Some(event) = event else {
        return Err(refused.into());
    };
    if let Some(phrase) = feedback_for(&event) {
        send_feedback(session.config(), phrase, now);
    }
    print_json(&event)
}

fn report_completion(session: &StudySession, report: &CompletionReport) -> CliResult {
    if let Some(phrase) = feedback_for(&report.event()) {
        send_feedback(session.config(), phrase, report.completion.at);
    }
    export_remote(session.config(), report);
    print_json(report)
}
