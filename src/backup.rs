// src/backup.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::logs::{self, LogEntry};
use crate::program;
use crate::schedule::{self, WeekSchedule};
use crate::settings::Settings;
use crate::store::{
    KeyValueStore, StoreError, KEY_PROFILE_DATA, KEY_SELECTED_PROGRAM, KEY_SETTINGS,
    KEY_WEEK_SCHEDULE,
};

pub const BACKUP_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Backup must be a JSON object")]
    NotAnObject,
    #[error("Backup field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Failed to write imported data: {0}")]
    Store(#[from] StoreError),
}

/// Full export of the user's data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub profile_data: Option<Value>,
    pub selected_program: Option<String>,
    pub week_schedule: Option<WeekSchedule>,
    pub workout_logs: BTreeMap<NaiveDate, LogEntry>,
    pub settings: Settings,
}

/// Fields written by an import, in application order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: Vec<&'static str>,
    pub log_count: usize,
}

/// Snapshots everything in the store into a backup document.
pub fn export<S: KeyValueStore>(store: &S, now: DateTime<Utc>) -> Backup {
    let selected_program: Option<String> = store.get_opt(KEY_SELECTED_PROGRAM);
    let week_schedule = store
        .get_opt::<WeekSchedule>(KEY_WEEK_SCHEDULE)
        .filter(|s| s.validate().is_ok())
        .filter(|s| {
            selected_program
                .as_deref()
                .map_or(true, |id| program::resolve(id).id == s.program())
        });

    Backup {
        version: BACKUP_VERSION,
        exported_at: now,
        profile_data: store.get_opt(KEY_PROFILE_DATA),
        selected_program,
        week_schedule,
        workout_logs: logs::list(store).into_iter().map(|e| (e.date, e)).collect(),
        settings: store.get_or(KEY_SETTINGS, Settings::default()),
    }
}

fn field<T: DeserializeOwned>(
    doc: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<T>, BackupError> {
    match doc.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| BackupError::InvalidField {
                field: name,
                reason: e.to_string(),
            }),
    }
}

/// Imports a backup document, writing only the fields it contains.
///
/// Every present field is validated before anything is written, so a rejected
/// document leaves the store untouched.
pub fn import<S: KeyValueStore>(store: &mut S, doc: &Value) -> Result<ImportSummary, BackupError> {
    let doc = doc.as_object().ok_or(BackupError::NotAnObject)?;

    if let Some(version) = field::<u32>(doc, "version")? {
        if version > BACKUP_VERSION {
            tracing::warn!(version, supported = BACKUP_VERSION, "Backup is from a newer version");
        }
    }

    let profile_data: Option<Value> = field(doc, "profileData")?;
    let selected_program: Option<String> = field(doc, "selectedProgram")?;
    if let Some(id) = &selected_program {
        if program::find(id).is_none() {
            tracing::warn!(program = id, "Backup selects an unknown program");
        }
    }
    let week_schedule: Option<WeekSchedule> = field(doc, "weekSchedule")?;
    if let Some(schedule) = &week_schedule {
        schedule.validate().map_err(|e| BackupError::InvalidField {
            field: "weekSchedule",
            reason: e.to_string(),
        })?;
        // A schedule owned by another program would be rebuilt on the next load
        if let Some(id) = &selected_program {
            let selected = program::resolve(id).id;
            if selected != schedule.program() {
                return Err(BackupError::InvalidField {
                    field: "weekSchedule",
                    reason: format!(
                        "schedule belongs to '{}' but the selected program is '{selected}'",
                        schedule.program()
                    ),
                });
            }
        }
    }
    let workout_logs: Option<BTreeMap<NaiveDate, LogEntry>> = field(doc, "workoutLogs")?;
    if let Some(entries) = &workout_logs {
        if let Some((key, entry)) = entries.iter().find(|(key, entry)| **key != entry.date) {
            return Err(BackupError::InvalidField {
                field: "workoutLogs",
                reason: format!("entry under {key} is dated {}", entry.date),
            });
        }
    }
    let settings: Option<Settings> = field(doc, "settings")?;

    let mut summary = ImportSummary::default();
    if let Some(profile) = profile_data {
        store.set(KEY_PROFILE_DATA, &profile)?;
        summary.applied.push("profileData");
    }
    if let Some(id) = selected_program {
        store.set(KEY_SELECTED_PROGRAM, &id)?;
        summary.applied.push("selectedProgram");
    }
    if let Some(schedule) = week_schedule {
        if !summary.applied.contains(&"selectedProgram") {
            store.set(KEY_SELECTED_PROGRAM, schedule.program())?;
            tracing::debug!(program = schedule.program(), "Selected program taken from imported schedule");
        }
        schedule::save(store, &schedule)?;
        summary.applied.push("weekSchedule");
    }
    if let Some(entries) = workout_logs {
        logs::replace_all(store, &entries)?;
        summary.log_count = entries.len();
        summary.applied.push("workoutLogs");
    }
    if let Some(settings) = settings {
        store.set(KEY_SETTINGS, &settings)?;
        summary.applied.push("settings");
    }

    tracing::info!(fields = ?summary.applied, logs = summary.log_count, "Imported backup");
    Ok(summary)
}
