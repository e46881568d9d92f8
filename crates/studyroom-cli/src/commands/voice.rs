use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use studyroom_core::timer::messages::feedback_for;
use studyroom_core::{CommandChannel, SlotTransport, StudySession, VoiceCommandInterpreter};

use super::{completed_report, export_remote, export_remote_async, open_channel, print_json, CliResult};

#[derive(Subcommand)]
pub enum VoiceAction {
    /// Place text in the inbound slot and handle it now
    Send {
        /// Transcribed command, e.g. "start maths homework"
        text: String,
    },
    /// Place text in the inbound slot for a running `listen` to pick up
    Push {
        /// Transcribed command
        text: String,
    },
    /// Classify text without applying it
    Parse {
        /// Command text
        text: String,
    },
    /// Poll the inbound slot and keep the timer ticking
    Listen {
        /// Stop after this many polls
        #[arg(long)]
        polls: Option<u64>,
    },
    /// Print the last feedback phrase sent to the assistant
    Feedback,
}

pub fn run(action: VoiceAction) -> CliResult {
    match action {
        VoiceAction::Send { text } => {
            let mut session = StudySession::open_default()?;
            let mut channel = open_channel(session.config())?;
            let interpreter = VoiceCommandInterpreter::from_config(&session.config().voice);
            channel.push_command(&text)?;
            match interpreter.pump(&mut channel, &mut session, Utc::now())? {
                Some(outcome) => {
                    if let Some(report) = completed_report(&outcome) {
                        export_remote(session.config(), report);
                    }
                    print_json(&outcome)?;
                }
                None => println!("nothing to handle"),
            }
        }
        VoiceAction::Push { text } => {
            let session = StudySession::open_default()?;
            open_channel(session.config())?.push_command(&text)?;
            println!("ok");
        }
        VoiceAction::Parse { text } => match studyroom_core::command::parser::parse(&text) {
            Some(command) => print_json(&command)?,
            None => println!("no match"),
        },
        VoiceAction::Listen { polls } => listen(polls)?,
        VoiceAction::Feedback => {
            let session = StudySession::open_default()?;
            match open_channel(session.config())?.last_feedback()? {
                Some(phrase) if !phrase.is_empty() => println!("{phrase}"),
                _ => println!("(none)"),
            }
        }
    }
    Ok(())
}

/// Long-running loop: tick the timer, then handle whatever arrived on the
/// inbound slot. State stays in memory and is saved after each change.
fn listen(polls: Option<u64>) -> CliResult {
    let mut session = StudySession::open_default()?;
    let mut channel = open_channel(session.config())?;
    let interpreter = VoiceCommandInterpreter::from_config(&session.config().voice);
    let period = Duration::from_millis(session.config().channel.poll_interval_ms.max(1));

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async {
        let mut interval = tokio::time::interval(period);
        let mut remaining = polls;
        tracing::info!(poll_ms = period.as_millis() as u64, "listening for commands");

        loop {
            if remaining == Some(0) {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::signal::ctrl_c() => break,
            }
            remaining = remaining.map(|n| n - 1);

            poll_once(&interpreter, &mut channel, &mut session, Utc::now()).await?;
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// One turn of the listen loop: finish an expired countdown, then handle
/// the inbound slot. Completed sessions are exported before printing.
async fn poll_once<T: SlotTransport>(
    interpreter: &VoiceCommandInterpreter,
    channel: &mut CommandChannel<T>,
    session: &mut StudySession,
    now: DateTime<Utc>,
) -> CliResult {
    if let Some(report) = session.tick(now)? {
        if let Some(phrase) = feedback_for(&report.event()) {
            if let Err(e) = channel.send_feedback(phrase, now) {
                tracing::warn!(error = %e, "could not send feedback");
            }
        }
        export_remote_async(session.config(), &report).await;
        print_json(&report)?;
    }
    match interpreter.pump(channel, session, now) {
        Ok(Some(outcome)) => {
            if let Some(report) = completed_report(&outcome) {
                export_remote_async(session.config(), report).await;
            }
            print_json(&outcome)?;
        }
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, "command handling failed"),
    }
    Ok(())
}
