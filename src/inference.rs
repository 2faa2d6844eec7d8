// src/inference.rs
use chrono::{Datelike, NaiveDate};

use crate::schedule::WeekSchedule;

/// Position of a date within a schedule week, Monday = 0 through Sunday = 6.
pub fn weekday_index(date: NaiveDate) -> usize {
    // num_days_from_sunday: Sunday = 0 .. Saturday = 6
    (date.weekday().num_days_from_sunday() as usize + 6) % 7
}

/// The workout planned for `date`, read straight from the schedule's slots.
///
/// Returns `None` for a rest day, or when the log belongs to a program other
/// than the schedule's (the caller then asks for the workout explicitly).
pub fn infer_plan(date: NaiveDate, schedule: &WeekSchedule, log_program: &str) -> Option<String> {
    if !schedule.program().eq_ignore_ascii_case(log_program.trim()) {
        tracing::debug!(
            log_program,
            schedule_program = schedule.program(),
            "Program mismatch, no plan inferred"
        );
        return None;
    }
    schedule
        .slots()
        .get(weekday_index(date))
        .and_then(|slot| slot.label())
        .map(str::to_string)
}
