use clap::Subcommand;
use studyroom_core::stats::format::{format_duration, format_hms};
use studyroom_core::stats::today_label;
use studyroom_core::{Database, StudySession};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, focus score, per-task minutes and daily trends
    Summary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Study time per task for one day
    History {
        /// Day label (e.g. "Monday 19 Oct"); defaults to today
        #[arg(long)]
        day: Option<String>,
    },
    /// Recently completed sessions
    Sessions {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    match action {
        StatsAction::Summary { json } => {
            let session = StudySession::open_default()?;
            let stats = session.stats();
            if json {
                return print_json(&stats);
            }
            println!("Total time studied:  {}", format_duration(stats.total_time_studied));
            println!("Average per task:    {}", format_duration(stats.average_time_per_task));
            println!("Breaks taken:        {}", stats.breaks_taken);
            println!("Focus score:         {:.1} / 10", stats.focus_score);
            if !stats.time_per_task.is_empty() {
                println!();
                for entry in &stats.time_per_task {
                    println!("  {:<24} {:>5} min", entry.name, entry.minutes);
                }
            }
            if !stats.trends.is_empty() {
                println!();
                for day in &stats.trends {
                    println!("  {:<16} {:>5} min", day.day, day.minutes);
                }
            }
        }
        StatsAction::History { day } => {
            let session = StudySession::open_default()?;
            let day = day.unwrap_or_else(today_label);
            match session.history().day(&day) {
                Some(entries) => {
                    for (name, secs) in entries {
                        println!("{}  {name}", format_hms(*secs));
                    }
                    println!("{}  total", format_hms(session.history().day_total(&day)));
                }
                None => println!("nothing recorded for {day}"),
            }
        }
        StatsAction::Sessions { limit } => {
            let db = Database::open()?;
            print_json(&db.list_sessions(limit)?)?;
        }
    }
    Ok(())
}
