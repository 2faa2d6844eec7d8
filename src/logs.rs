// src/logs.rs
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::store::{KeyValueStore, StoreError, KEY_WORKOUT_LOGS};
use crate::units::{self, WeightUnit};

/// One performed set. Weight is stored in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SetEntry {
    #[serde(deserialize_with = "lenient_weight")]
    pub weight: f64,
    #[serde(deserialize_with = "lenient_reps")]
    pub reps: u32,
}

impl SetEntry {
    /// Creates a set, coercing negative or non-finite weights to 0.
    pub fn new(weight_kg: f64, reps: u32) -> Self {
        Self {
            weight: sanitize(weight_kg),
            reps,
        }
    }

    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
}

impl ExerciseLog {
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(SetEntry::volume).sum()
    }
}

/// A day's workout log, keyed by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub program: String,
    /// Planned workout label, `None` for a rest day or an unplanned session.
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LogEntry {
    pub fn new(date: NaiveDate, program: &str, plan: Option<String>) -> Self {
        Self {
            date,
            program: program.to_string(),
            plan,
            exercises: Vec::new(),
            notes: None,
        }
    }

    /// Total session volume in kilograms: the sum of weight x reps over all sets.
    pub fn volume(&self) -> f64 {
        self.exercises.iter().map(ExerciseLog::volume).sum()
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Appends sets to the named exercise, creating it if the session doesn't have it yet.
    pub fn add_sets(&mut self, name: &str, sets: impl IntoIterator<Item = SetEntry>) {
        let name = name.trim();
        if let Some(existing) = self.exercises.iter_mut().find(|e| e.name == name) {
            existing.sets.extend(sets);
        } else {
            self.exercises.push(ExerciseLog {
                name: name.to_string(),
                sets: sets.into_iter().collect(),
            });
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn coerce_value(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    sanitize(number)
}

fn lenient_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Value::deserialize(deserializer).map(|v| coerce_value(&v))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_reps<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Value::deserialize(deserializer).map(|v| coerce_value(&v).min(f64::from(u32::MAX)) as u32)
}

/// Parses a weight typed by the user. Anything unparseable or negative is 0.
pub fn coerce_weight(input: &str) -> f64 {
    sanitize(input.trim().parse().unwrap_or(0.0))
}

/// Parses a rep count typed by the user. Anything unparseable or negative is 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_reps(input: &str) -> u32 {
    let trimmed = input.trim();
    trimmed
        .parse::<u32>()
        .unwrap_or_else(|_| sanitize(trimmed.parse().unwrap_or(0.0)).min(f64::from(u32::MAX)) as u32)
}

/// Parses sets written as `WEIGHTxREPS` separated by commas, e.g. `"100x5, 90x8"`.
///
/// Weights are read in `unit` and stored in kilograms. A missing rep count is 0.
pub fn parse_sets(input: &str, unit: WeightUnit) -> Vec<SetEntry> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut pieces = part.splitn(2, ['x', 'X', '*', '×']);
            let weight = coerce_weight(pieces.next().unwrap_or_default());
            let reps = pieces.next().map_or(0, coerce_reps);
            SetEntry::new(units::from_display(weight, unit), reps)
        })
        .collect()
}

fn read_all<S: KeyValueStore>(store: &S) -> BTreeMap<String, Value> {
    store.get_or(KEY_WORKOUT_LOGS, BTreeMap::new())
}

fn parse_entry(key: &str, value: Value) -> Option<LogEntry> {
    match serde_json::from_value::<LogEntry>(value) {
        Ok(entry) if entry.date.to_string() == key => Some(entry),
        Ok(entry) => {
            tracing::warn!(key, date = %entry.date, "Log entry stored under the wrong date, ignoring");
            None
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Malformed log entry, ignoring");
            None
        }
    }
}

/// Stores an entry, replacing any previous entry for the same date in full.
pub fn save<S: KeyValueStore>(store: &mut S, entry: &LogEntry) -> Result<(), StoreError> {
    let mut all = read_all(store);
    let value = serde_json::to_value(entry).map_err(|source| StoreError::Serialize {
        key: KEY_WORKOUT_LOGS.to_string(),
        source,
    })?;
    all.insert(entry.date.to_string(), value);
    store.set(KEY_WORKOUT_LOGS, &all)?;
    tracing::debug!(date = %entry.date, exercises = entry.exercises.len(), "Saved workout log");
    Ok(())
}

/// Loads the entry for a date. A malformed entry loads as `None`.
pub fn load<S: KeyValueStore>(store: &S, date: NaiveDate) -> Option<LogEntry> {
    let key = date.to_string();
    let value = read_all(store).remove(&key)?;
    parse_entry(&key, value)
}

/// All well-formed entries, oldest first.
pub fn list<S: KeyValueStore>(store: &S) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = read_all(store)
        .into_iter()
        .filter_map(|(key, value)| parse_entry(&key, value))
        .collect();
    entries.sort_by_key(|e| e.date);
    entries
}

/// Entries dated within `from..=to`, oldest first.
pub fn range<S: KeyValueStore>(store: &S, from: NaiveDate, to: NaiveDate) -> Vec<LogEntry> {
    list(store)
        .into_iter()
        .filter(|e| e.date >= from && e.date <= to)
        .collect()
}

/// Deletes the entry for a date. Returns true if one existed.
pub fn delete<S: KeyValueStore>(store: &mut S, date: NaiveDate) -> Result<bool, StoreError> {
    let mut all = read_all(store);
    if all.remove(&date.to_string()).is_none() {
        return Ok(false);
    }
    store.set(KEY_WORKOUT_LOGS, &all)?;
    Ok(true)
}

/// Replaces every stored entry at once.
pub fn replace_all<S: KeyValueStore>(
    store: &mut S,
    entries: &BTreeMap<NaiveDate, LogEntry>,
) -> Result<(), StoreError> {
    let keyed: BTreeMap<String, &LogEntry> =
        entries.iter().map(|(date, entry)| (date.to_string(), entry)).collect();
    store.set(KEY_WORKOUT_LOGS, &keyed)
}
