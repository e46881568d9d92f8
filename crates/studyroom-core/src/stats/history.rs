//! Date-bucketed study ledger.
//!
//! Keys inside a day are task/subtask *names*, not ids: two tasks sharing a
//! name pool their time for that day. Days keep the order they were first
//! recorded in, which is chronological.

use chrono::{DateTime, Local, TimeZone};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::apply_delta;

/// Day label in the ledger's locale format, e.g. `Monday 19 Oct`.
pub fn day_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%A %-d %b").to_string()
}

/// Today's label in the local time zone.
pub fn today_label() -> String {
    day_label(&Local::now())
}

/// day label -> (name -> seconds).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyHistory {
    days: IndexMap<String, BTreeMap<String, u64>>,
}

impl StudyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta_secs` (possibly negative) to `day`/`name`, clamped at 0.
    /// Returns the new value.
    pub fn record(&mut self, day: &str, name: &str, delta_secs: i64) -> u64 {
        let entry = self
            .days
            .entry(day.to_string())
            .or_default()
            .entry(name.to_string())
            .or_insert(0);
        *entry = apply_delta(*entry, delta_secs);
        *entry
    }

    pub fn get(&self, day: &str, name: &str) -> u64 {
        self.days
            .get(day)
            .and_then(|names| names.get(name))
            .copied()
            .unwrap_or(0)
    }

    pub fn day(&self, day: &str) -> Option<&BTreeMap<String, u64>> {
        self.days.get(day)
    }

    pub fn days(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, u64>)> {
        self.days.iter().map(|(day, names)| (day.as_str(), names))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Seconds summed over every name recorded on `day`.
    pub fn day_total(&self, day: &str) -> u64 {
        self.days
            .get(day)
            .map(|names| names.values().fold(0u64, |acc, &secs| acc.saturating_add(secs)))
            .unwrap_or(0)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize, falling back to an empty ledger on any failure.
    pub fn from_json_or_default(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            tracing::warn!("study history unreadable, starting empty: {e}");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn day_label_uses_weekday_day_month() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(day_label(&at), "Monday 19 Oct");
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(day_label(&at), "Thursday 5 Mar");
    }

    #[test]
    fn record_accumulates_and_defaults_to_zero() {
        let mut history = StudyHistory::new();
        assert_eq!(history.get("Monday 19 Oct", "Maths"), 0);
        history.record("Monday 19 Oct", "Maths", 600);
        history.record("Monday 19 Oct", "Maths", 300);
        history.record("Monday 19 Oct", "English", 60);
        assert_eq!(history.get("Monday 19 Oct", "Maths"), 900);
        assert_eq!(history.day_total("Monday 19 Oct"), 960);
    }

    #[test]
    fn record_clamps_at_zero() {
        let mut history = StudyHistory::new();
        history.record("Monday 19 Oct", "Maths", 30);
        assert_eq!(history.record("Monday 19 Oct", "Maths", -100), 0);
        assert_eq!(history.record("Tuesday 20 Oct", "Maths", -5), 0);
    }

    #[test]
    fn same_name_merges_across_tasks() {
        let mut history = StudyHistory::new();
        history.record("Monday 19 Oct", "Revision", 100);
        history.record("Monday 19 Oct", "Revision", 50);
        assert_eq!(history.day("Monday 19 Oct").unwrap().len(), 1);
    }

    #[test]
    fn days_keep_recording_order() {
        let mut history = StudyHistory::new();
        for day in ["Monday 19 Oct", "Tuesday 20 Oct", "Wednesday 21 Oct", "Friday 23 Oct"] {
            history.record(day, "Maths", 60);
        }
        history.record("Monday 19 Oct", "English", 60);

        let days: Vec<&str> = history.days().map(|(day, _)| day).collect();
        assert_eq!(days, ["Monday 19 Oct", "Tuesday 20 Oct", "Wednesday 21 Oct", "Friday 23 Oct"]);

        let reloaded = StudyHistory::from_json_or_default(&history.to_json().unwrap());
        let days: Vec<&str> = reloaded.days().map(|(day, _)| day).collect();
        assert_eq!(days[3], "Friday 23 Oct");
    }

    #[test]
    fn json_shape_is_nested_object() {
        let mut history = StudyHistory::new();
        history.record("Monday 19 Oct", "Maths", 42);
        let json = history.to_json().unwrap();
        assert_eq!(json, r#"{"Monday 19 Oct":{"Maths":42}}"#);
        assert_eq!(StudyHistory::from_json_or_default(&json), history);
        assert!(StudyHistory::from_json_or_default("[1,2").is_empty());
    }
}
