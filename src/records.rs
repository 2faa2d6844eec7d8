// src/records.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::logs::{LogEntry, SetEntry};

/// Two estimated 1RMs closer than this are the same record.
/// Absorbs recomputation rounding; distinct maxima are far further apart.
pub const PR_TOLERANCE: f64 = 1e-6;

/// Best set for an exercise across the log history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecord {
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
    pub date: NaiveDate,
    pub estimated_1rm: f64,
}

/// Epley estimate: `weight * (1 + reps / 30)`.
/// Sets without positive weight and reps are not scored.
pub fn estimate_1rm(weight: f64, reps: u32) -> Option<f64> {
    if weight > 0.0 && reps > 0 {
        Some(weight * (1.0 + f64::from(reps) / 30.0))
    } else {
        None
    }
}

fn scored_sets<'a>(
    entry: &'a LogEntry,
    name: &'a str,
) -> impl Iterator<Item = (&'a SetEntry, f64)> + 'a {
    entry
        .exercises
        .iter()
        .filter(move |e| e.name.trim() == name)
        .flat_map(|e| e.sets.iter())
        .filter_map(|set| estimate_1rm(set.weight, set.reps).map(|score| (set, score)))
}

/// The set with the highest estimated 1RM for `name`, scanning logs in the given order.
/// Ties keep the first set seen.
pub fn best_for_exercise(logs: &[LogEntry], name: &str) -> Option<PersonalRecord> {
    let name = name.trim();
    let mut best: Option<PersonalRecord> = None;

    for entry in logs {
        for (set, score) in scored_sets(entry, name) {
            if best.as_ref().map_or(true, |b| score > b.estimated_1rm) {
                best = Some(PersonalRecord {
                    exercise: name.to_string(),
                    weight: set.weight,
                    reps: set.reps,
                    date: entry.date,
                    estimated_1rm: score,
                });
            }
        }
    }
    best
}

/// Best set per distinct exercise name, keyed by name.
pub fn all_records(logs: &[LogEntry]) -> BTreeMap<String, PersonalRecord> {
    let mut names: Vec<&str> = logs
        .iter()
        .flat_map(|entry| entry.exercises.iter().map(|e| e.name.trim()))
        .collect();
    names.sort_unstable();
    names.dedup();

    names
        .into_iter()
        .filter_map(|name| best_for_exercise(logs, name).map(|pr| (name.to_string(), pr)))
        .collect()
}

/// Highest estimated 1RM for an exercise within a single session.
pub fn session_best(entry: &LogEntry, name: &str) -> Option<f64> {
    scored_sets(entry, name.trim())
        .map(|(_, score)| score)
        .fold(None, |acc: Option<f64>, score| Some(acc.map_or(score, |a| a.max(score))))
}

/// True if two scores denote the same record.
pub fn matches_record(score: f64, record: f64) -> bool {
    (score - record).abs() <= PR_TOLERANCE
}

/// Exercises in `entry` whose session best equals the all-time best in `records`.
pub fn session_prs(entry: &LogEntry, records: &BTreeMap<String, PersonalRecord>) -> Vec<String> {
    let mut prs: Vec<String> = Vec::new();
    for exercise in &entry.exercises {
        let name = exercise.name.trim();
        if prs.iter().any(|p| p == name) {
            continue;
        }
        let (Some(best), Some(record)) = (session_best(entry, name), records.get(name)) else {
            continue;
        };
        if matches_record(best, record.estimated_1rm) {
            prs.push(name.to_string());
        }
    }
    prs
}
