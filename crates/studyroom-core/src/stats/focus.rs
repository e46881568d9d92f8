//! Derived study statistics: totals, averages and the focus score.

use serde::{Deserialize, Serialize};

use super::history::StudyHistory;
use crate::task::Task;

/// Study hours that earn the full time component (5 points).
const FULL_TIME_HOURS: f64 = 4.0;
/// Break frequency band (breaks per hour) that earns the full break component.
const IDEAL_BREAKS_PER_HOUR: (f64, f64) = (0.5, 1.5);

/// Task's own time plus every subtask's time.
pub fn total_for_task(task: &Task) -> u64 {
    task.total_time()
}

/// Sum of [`total_for_task`] over a task list.
pub fn total_time_studied(tasks: &[Task]) -> u64 {
    tasks
        .iter()
        .map(total_for_task)
        .fold(0, u64::saturating_add)
}

/// `floor(total / count)`, 0 for an empty list.
pub fn average_time_per_task(tasks: &[Task]) -> u64 {
    if tasks.is_empty() {
        return 0;
    }
    total_time_studied(tasks) / tasks.len() as u64
}

/// Score in `[0, 10]` rewarding study time (up to 4 hours) and a break
/// frequency between 0.5 and 1.5 breaks per hour. Rounded to one decimal.
pub fn focus_score(total_time_studied: u64, breaks_taken: u64) -> f64 {
    if total_time_studied == 0 {
        return 0.0;
    }
    let hours_studied = total_time_studied as f64 / 3600.0;
    let breaks_per_hour = if hours_studied > 0.0 {
        breaks_taken as f64 / hours_studied
    } else {
        0.0
    };

    let time_score = (hours_studied / FULL_TIME_HOURS * 5.0).min(5.0);
    let (low, high) = IDEAL_BREAKS_PER_HOUR;
    let break_score = if (low..=high).contains(&breaks_per_hour) {
        5.0
    } else if breaks_per_hour < low {
        breaks_per_hour * 10.0
    } else {
        (5.0 - (breaks_per_hour - high) * 2.0).max(0.0)
    };

    (((time_score + break_score) * 10.0).round() / 10.0).clamp(0.0, 10.0)
}

/// One bar of the per-task chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTime {
    pub name: String,
    pub minutes: u64,
}

/// One point of the daily trend line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTotal {
    pub day: String,
    pub minutes: u64,
}

fn rounded_minutes(secs: u64) -> u64 {
    (secs as f64 / 60.0).round() as u64
}

pub fn time_per_task(tasks: &[Task]) -> Vec<TaskTime> {
    tasks
        .iter()
        .map(|task| TaskTime {
            name: task.name.clone(),
            minutes: rounded_minutes(total_for_task(task)),
        })
        .collect()
}

pub fn study_trends(history: &StudyHistory) -> Vec<DayTotal> {
    history
        .days()
        .map(|(day, _)| DayTotal {
            day: day.to_string(),
            minutes: rounded_minutes(history.day_total(day)),
        })
        .collect()
}

/// Everything the statistics view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyStats {
    pub total_time_studied: u64,
    pub average_time_per_task: u64,
    pub breaks_taken: u64,
    pub focus_score: f64,
    pub time_per_task: Vec<TaskTime>,
    pub trends: Vec<DayTotal>,
}

impl StudyStats {
    pub fn compute(tasks: &[Task], breaks_taken: u64, history: &StudyHistory) -> Self {
        let total = total_time_studied(tasks);
        Self {
            total_time_studied: total,
            average_time_per_task: average_time_per_task(tasks),
            breaks_taken,
            focus_score: focus_score(total, breaks_taken),
            time_per_task: time_per_task(tasks),
            trends: study_trends(history),
        }
    }
}
