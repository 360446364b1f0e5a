//! Daily reset policy: completion flags are cleared once per calendar day.
//!
//! The marker is a plain `YYYY-MM-DD` string compared only for equality,
//! never parsed back into a date.

use chrono::NaiveDate;

use crate::tasks::Task;

/// Whether today's reset already happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    /// The stored marker equals today.
    Fresh,
    /// The marker is missing or names another day.
    Stale,
}

/// Day identifier written as the reset marker.
pub fn reset_marker(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

pub fn evaluate(last_marker: Option<&str>, today_marker: &str) -> ResetState {
    match last_marker {
        Some(marker) if marker == today_marker => ResetState::Fresh,
        _ => ResetState::Stale,
    }
}

/// Clears every completion flag; returns how many were set.
pub fn clear_completion(tasks: &mut [Task]) -> usize {
    let mut cleared = 0;
    for task in tasks.iter_mut().filter(|t| t.completed) {
        task.completed = false;
        cleared += 1;
    }
    cleared
}
