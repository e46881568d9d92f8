//! Statistics module for Studyroom
//!
//! This module folds completed sessions into the date-keyed study ledger and
//! derives the numbers the statistics view shows: totals, the average per
//! task, the focus score, per-task chart data and daily trends.

mod focus;
pub mod format;
mod history;

pub use focus::{
    average_time_per_task, focus_score, study_trends, time_per_task, total_for_task,
    total_time_studied, DayTotal, StudyStats, TaskTime,
};
pub use history::{day_label, today_label, StudyHistory};
