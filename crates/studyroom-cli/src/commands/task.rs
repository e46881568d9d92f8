use chrono::Utc;
use clap::Subcommand;
use studyroom_core::stats::format::format_hms;
use studyroom_core::timer::messages::FEEDBACK_TASK_CHECKED;
use studyroom_core::{StudySession, TimerTarget};

use super::{find_subtask, find_task, parse_delta, print_json, send_feedback, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task name
        name: String,
    },
    /// List tasks with their subtasks
    List {
        /// Print the task list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a task and its subtasks
    Delete {
        /// Task id or name
        task: String,
    },
    /// Rename a task
    Rename {
        /// Task id or name
        task: String,
        /// New name
        name: String,
    },
    /// Mark a task as completed
    Done {
        /// Task id or name
        task: String,
    },
    /// Mark a task as not completed
    Undone {
        /// Task id or name
        task: String,
    },
    /// Flip a task's completion flag
    Toggle {
        /// Task id or name
        task: String,
    },
    /// Add or remove study time by hand
    Adjust {
        /// Task id or name
        task: String,
        /// Signed amount, e.g. +5m, -30s, 90
        #[arg(allow_hyphen_values = true)]
        delta: String,
        /// Adjust this subtask instead of the task
        #[arg(long)]
        sub: Option<String>,
    },
    /// Subtask management
    Sub {
        #[command(subcommand)]
        action: SubAction,
    },
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Add a subtask under a task
    Add {
        /// Parent task id or name
        task: String,
        /// Subtask name
        name: String,
    },
    /// Delete a subtask
    Delete {
        /// Parent task id or name
        task: String,
        /// Subtask id or name
        sub: String,
    },
    /// Rename a subtask
    Rename {
        /// Parent task id or name
        task: String,
        /// Subtask id or name
        sub: String,
        /// New name
        name: String,
    },
    /// Mark a subtask as completed
    Done {
        /// Parent task id or name
        task: String,
        /// Subtask id or name
        sub: String,
    },
    /// Mark a subtask as not completed
    Undone {
        /// Parent task id or name
        task: String,
        /// Subtask id or name
        sub: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut session = StudySession::open_default()?;
    let now = Utc::now();

    match action {
        TaskAction::Add { name } => {
            let id = session.create_task(&name)?;
            println!("{id}");
        }
        TaskAction::List { json } => {
            if json {
                print_json(&session.tasks().tasks())?;
            } else {
                print_tree(&session);
            }
        }
        TaskAction::Delete { task } => {
            let id = find_task(session.tasks(), &task)?;
            session.delete_task(&id, now)?;
            println!("deleted {id}");
        }
        TaskAction::Rename { task, name } => {
            let id = find_task(session.tasks(), &task)?;
            session.rename_task(&id, &name)?;
            println!("ok");
        }
        TaskAction::Done { task } => {
            let id = find_task(session.tasks(), &task)?;
            session.set_completed(&id, None, true)?;
            send_feedback(session.config(), FEEDBACK_TASK_CHECKED, now);
            println!("ok");
        }
        TaskAction::Undone { task } => {
            let id = find_task(session.tasks(), &task)?;
            session.set_completed(&id, None, false)?;
            println!("ok");
        }
        TaskAction::Toggle { task } => {
            let id = find_task(session.tasks(), &task)?;
            if let Some(completed) = session.toggle_completed(&id, None)? {
                if completed {
                    send_feedback(session.config(), FEEDBACK_TASK_CHECKED, now);
                }
                println!("{}", if completed { "done" } else { "undone" });
            }
        }
        TaskAction::Adjust { task, delta, sub } => {
            let id = find_task(session.tasks(), &task)?;
            let target = match sub {
                Some(sub) => TimerTarget::subtask(id.clone(), find_subtask(session.tasks(), &id, &sub)?),
                None => TimerTarget::task(id),
            };
            let delta = parse_delta(&delta)?;
            match session.adjust_task_time(&target, delta, now)? {
                Some(time) => println!("{}", format_hms(time)),
                None => return Err(format!("{target} no longer exists").into()),
            }
        }
        TaskAction::Sub { action } => run_sub(&mut session, action)?,
    }
    Ok(())
}

fn run_sub(session: &mut StudySession, action: SubAction) -> CliResult {
    let now = Utc::now();

    match action {
        SubAction::Add { task, name } => {
            let id = find_task(session.tasks(), &task)?;
            match session.create_subtask(&id, &name)? {
                Some(sub_id) => println!("{sub_id}"),
                None => return Err(format!("no task with id '{id}'").into()),
            }
        }
        SubAction::Delete { task, sub } => {
            let id = find_task(session.tasks(), &task)?;
            let sub_id = find_subtask(session.tasks(), &id, &sub)?;
            session.delete_subtask(&id, &sub_id, now)?;
            println!("deleted {sub_id}");
        }
        SubAction::Rename { task, sub, name } => {
            let id = find_task(session.tasks(), &task)?;
            let sub_id = find_subtask(session.tasks(), &id, &sub)?;
            session.rename_subtask(&id, &sub_id, &name)?;
            println!("ok");
        }
        SubAction::Done { task, sub } => {
            let id = find_task(session.tasks(), &task)?;
            let sub_id = find_subtask(session.tasks(), &id, &sub)?;
            session.set_completed(&id, Some(&sub_id), true)?;
            send_feedback(session.config(), FEEDBACK_TASK_CHECKED, now);
            println!("ok");
        }
        SubAction::Undone { task, sub } => {
            let id = find_task(session.tasks(), &task)?;
            let sub_id = find_subtask(session.tasks(), &id, &sub)?;
            session.set_completed(&id, Some(&sub_id), false)?;
            println!("ok");
        }
    }
    Ok(())
}

fn print_tree(session: &StudySession) {
    let active = session.engine().target();
    for task in session.tasks().tasks() {
        let marker = if active.is_some_and(|t| t.task_id() == task.id && t.subtask_id().is_none()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker}[{}] {}  {}  ({})",
            if task.completed { "x" } else { " " },
            task.name,
            format_hms(task.time),
            task.id
        );
        for sub in &task.subtasks {
            let marker = if active.is_some_and(|t| t.subtask_id() == Some(sub.id.as_str())) {
                "*"
            } else {
                " "
            };
            println!(
                "{marker}    [{}] {}  {}  ({})",
                if sub.completed { "x" } else { " " },
                sub.name,
                format_hms(sub.time),
                sub.id
            );
        }
    }
}
