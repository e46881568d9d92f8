use chrono::Utc;
use clap::Subcommand;
use studyroom_core::{StudySession, View};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ViewAction {
    /// Show the current view and any queued follow-up
    Show,
    /// Switch to a view (home, timer, statistics, shop, study_methods, motivation)
    Open {
        view: View,
    },
    /// Report that the open dialog was dismissed
    Closed,
}

pub fn run(action: ViewAction) -> CliResult {
    let mut session = StudySession::open_default()?;

    match action {
        ViewAction::Show => {
            print_json(&serde_json::json!({
                "view": session.view(),
                "pending_follow_up": session.pending_follow_up(),
            }))?;
        }
        ViewAction::Open { view } => {
            if let Some(cancelled) = session.navigate(view, Utc::now())? {
                eprintln!("active session discarded");
                print_json(&cancelled)?;
            }
            println!("{view}");
        }
        ViewAction::Closed => match session.modal_closed()? {
            Some(view) => println!("{view}"),
            None => println!("{}", session.view()),
        },
    }
    Ok(())
}
