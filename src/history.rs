// src/history.rs
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::logs::LogEntry;
use crate::records;
use crate::schedule::WeekSchedule;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub date: NaiveDate,
    pub plan: Option<String>,
    pub exercises: usize,
    pub sets: usize,
    pub volume_kg: f64,
    /// Exercises whose best set this session equals the all-time record.
    pub prs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub sessions: Vec<SessionSummary>,
    pub total_volume_kg: f64,
    pub planned_days: usize,
    pub completed_days: usize,
}

/// The Monday starting the week that contains `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Summarizes the week containing `date`.
///
/// `all_logs` is the full history (oldest first) so session PR flags are measured
/// against all-time bests; completion counts come from the current schedule.
pub fn summarize_week(date: NaiveDate, all_logs: &[LogEntry], schedule: &WeekSchedule) -> WeekSummary {
    let start = week_start(date);
    let end = start + Duration::days(6);
    let all_time = records::all_records(all_logs);

    let sessions: Vec<SessionSummary> = all_logs
        .iter()
        .filter(|e| e.date >= start && e.date <= end)
        .map(|entry| SessionSummary {
            date: entry.date,
            plan: entry.plan.clone(),
            exercises: entry.exercises.len(),
            sets: entry.set_count(),
            volume_kg: entry.volume(),
            prs: records::session_prs(entry, &all_time),
        })
        .collect();

    WeekSummary {
        week_start: start,
        total_volume_kg: sessions.iter().map(|s| s.volume_kg).sum(),
        sessions,
        planned_days: schedule.training_days(),
        completed_days: schedule.completed_training_days(),
    }
}

/// Total volume per week (keyed by Monday), oldest week first.
pub fn weekly_volume(all_logs: &[LogEntry]) -> Vec<(NaiveDate, f64)> {
    let mut weeks: Vec<(NaiveDate, f64)> = Vec::new();
    for entry in all_logs {
        let start = week_start(entry.date);
        match weeks.iter_mut().find(|(w, _)| *w == start) {
            Some((_, total)) => *total += entry.volume(),
            None => weeks.push((start, entry.volume())),
        }
    }
    weeks.sort_by_key(|(w, _)| *w);
    weeks
}
