// src/schedule/mod.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::program::{self, Program, DAYS_PER_WEEK, REST_LABEL};
use crate::store::{KeyValueStore, StoreError, KEY_WEEK_SCHEDULE};

pub mod builder;
pub mod session;

pub use session::ScheduleSession;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Day index {0} is out of range (0-6)")]
    IndexOutOfRange(usize),
    #[error("'{label}' is not part of the '{program}' rotation")]
    UnknownLabel { label: String, program: String },
    #[error("Invalid day order {0:?}: expected a permutation of 0-6")]
    InvalidPermutation(Vec<usize>),
    #[error("A schedule edit session is already open")]
    SessionAlreadyOpen,
    #[error("No schedule edit session is open")]
    NoOpenSession,
    #[error("Malformed schedule: {0}")]
    Malformed(String),
}

/// One day of the week: a rotation label or a rest day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Slot {
    Rest,
    Workout(String),
}

impl Slot {
    pub const fn is_rest(&self) -> bool {
        matches!(self, Self::Rest)
    }

    /// The workout label, or `None` for a rest day.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Rest => None,
            Self::Workout(label) => Some(label),
        }
    }

    /// Parses user input: "rest" in any case is a rest day, anything else a label.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case(REST_LABEL) {
            Self::Rest
        } else {
            Self::Workout(trimmed.to_string())
        }
    }
}

impl From<String> for Slot {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case(REST_LABEL) {
            Self::Rest
        } else {
            Self::Workout(value)
        }
    }
}

impl From<Slot> for String {
    fn from(value: Slot) -> Self {
        match value {
            Slot::Rest => REST_LABEL.to_string(),
            Slot::Workout(label) => label,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => f.write_str(REST_LABEL),
            Self::Workout(label) => f.write_str(label),
        }
    }
}

/// The weekly schedule for the active program.
///
/// Slots and completion flags are index-aligned, Monday first. The rest count
/// never exceeds the program's rest limit once a mutation returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    program: String,
    slots: Vec<Slot>,
    completed: Vec<bool>,
    // Informational; a schedule saved without them still loads
    #[serde(default)]
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: DateTime<Utc>,
}

impl WeekSchedule {
    /// Builds the default week for a program: default rest count, nothing completed.
    pub fn new_default(program: &Program, now: DateTime<Utc>) -> Self {
        Self {
            program: program.id.to_string(),
            slots: builder::build(program.rotation, program.default_rest),
            completed: vec![false; DAYS_PER_WEEK],
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the default week for a program id, falling back to push/pull/legs.
    pub fn for_program(program_id: &str, now: DateTime<Utc>) -> Self {
        Self::new_default(program::resolve(program_id), now)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The catalog entry owning this schedule.
    pub fn program_def(&self) -> &'static Program {
        program::resolve(&self.program)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn completed(&self) -> &[bool] {
        &self.completed
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn rest_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_rest()).count()
    }

    /// Number of training (non-rest) days.
    pub fn training_days(&self) -> usize {
        DAYS_PER_WEEK - self.rest_count()
    }

    /// Training days marked complete.
    pub fn completed_training_days(&self) -> usize {
        self.slots
            .iter()
            .zip(&self.completed)
            .filter(|(slot, done)| !slot.is_rest() && **done)
            .count()
    }

    /// Checks slot count, program membership and the rest limit.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.slots.len() != DAYS_PER_WEEK {
            return Err(ScheduleError::Malformed(format!(
                "expected {DAYS_PER_WEEK} slots, found {}",
                self.slots.len()
            )));
        }
        if self.completed.len() != DAYS_PER_WEEK {
            return Err(ScheduleError::Malformed(format!(
                "expected {DAYS_PER_WEEK} completion flags, found {}",
                self.completed.len()
            )));
        }
        let program = program::find(&self.program)
            .ok_or_else(|| ScheduleError::Malformed(format!("unknown program '{}'", self.program)))?;
        if let Some(label) = self
            .slots
            .iter()
            .filter_map(Slot::label)
            .find(|label| !program.has_label(label))
        {
            return Err(ScheduleError::UnknownLabel {
                label: label.to_string(),
                program: program.id.to_string(),
            });
        }
        if self.rest_count() > program.rest_limit {
            return Err(ScheduleError::Malformed(format!(
                "{} rest days exceed the limit of {}",
                self.rest_count(),
                program.rest_limit
            )));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ScheduleError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(ScheduleError::IndexOutOfRange(index))
        }
    }

    /// Flips a day between rest and training.
    ///
    /// A rest day becomes `rotation[index mod len]` (position-based). A training day
    /// becomes rest, evicting the lowest-index rest day first if the limit is reached.
    pub fn toggle_rest(&mut self, index: usize) -> Result<(), ScheduleError> {
        self.check_index(index)?;
        if self.slots[index].is_rest() {
            let label = self.program_def().label_at(index);
            self.slots[index] = Slot::Workout(label.to_string());
        } else {
            let program = self.program_def();
            builder::place_rest(&mut self.slots, program, index);
        }
        Ok(())
    }

    /// Assigns a label (or rest) to a day. The label must belong to the rotation.
    pub fn set_slot(&mut self, index: usize, slot: Slot) -> Result<(), ScheduleError> {
        self.check_index(index)?;
        match slot {
            Slot::Rest => {
                let program = self.program_def();
                builder::place_rest(&mut self.slots, program, index);
            }
            Slot::Workout(label) => {
                let program = self.program_def();
                if !program.has_label(&label) {
                    return Err(ScheduleError::UnknownLabel {
                        label,
                        program: program.id.to_string(),
                    });
                }
                self.slots[index] = Slot::Workout(label);
            }
        }
        Ok(())
    }

    /// Rearranges days: new day `i` takes old day `order[i]`, keeping each
    /// slot paired with its completion flag.
    pub fn reorder(&mut self, order: &[usize]) -> Result<(), ScheduleError> {
        let mut seen = [false; DAYS_PER_WEEK];
        let valid = order.len() == DAYS_PER_WEEK
            && order.iter().all(|&i| {
                i < DAYS_PER_WEEK && !std::mem::replace(&mut seen[i], true)
            });
        if !valid {
            return Err(ScheduleError::InvalidPermutation(order.to_vec()));
        }

        let slots = order.iter().map(|&i| self.slots[i].clone()).collect();
        let completed = order.iter().map(|&i| self.completed[i]).collect();
        self.slots = slots;
        self.completed = completed;
        Ok(())
    }

    /// Moves one day to another position, shifting the days in between.
    pub fn move_slot(&mut self, from: usize, to: usize) -> Result<(), ScheduleError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let mut order: Vec<usize> = (0..DAYS_PER_WEEK).collect();
        let moved = order.remove(from);
        order.insert(to, moved);
        self.reorder(&order)
    }

    /// Flips the completion flag of a day and returns the new value.
    pub fn toggle_complete(&mut self, index: usize) -> Result<bool, ScheduleError> {
        self.check_index(index)?;
        self.completed[index] = !self.completed[index];
        Ok(self.completed[index])
    }

    /// Rebuilds the week with the program's default rest count and clears completion.
    pub fn reset_to_default(&mut self) {
        let program = self.program_def();
        self.program = program.id.to_string();
        self.slots = builder::build(program.rotation, program.default_rest);
        self.reset_progress();
    }

    /// Clears completion flags, keeping the slot assignment.
    pub fn reset_progress(&mut self) {
        self.completed = vec![false; DAYS_PER_WEEK];
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Loads the persisted schedule for `program_id`.
///
/// A missing or malformed schedule, or one owned by a different program, is
/// replaced with a freshly built default which is persisted in its place.
pub fn load<S: KeyValueStore>(
    store: &mut S,
    program_id: &str,
    now: DateTime<Utc>,
) -> Result<WeekSchedule, StoreError> {
    let program = program::resolve(program_id);
    let stored: Option<WeekSchedule> = store.get_opt(KEY_WEEK_SCHEDULE);

    match stored {
        Some(schedule) if schedule.program == program.id => match schedule.validate() {
            Ok(()) => return Ok(schedule),
            Err(e) => tracing::warn!(error = %e, "Persisted schedule is invalid, rebuilding"),
        },
        Some(schedule) => tracing::info!(
            stored = schedule.program,
            selected = program.id,
            "Persisted schedule belongs to another program, rebuilding"
        ),
        None => tracing::debug!("No usable persisted schedule, building default"),
    }

    let schedule = WeekSchedule::new_default(program, now);
    save(store, &schedule)?;
    Ok(schedule)
}

/// Persists the schedule under the week-schedule key.
pub fn save<S: KeyValueStore>(store: &mut S, schedule: &WeekSchedule) -> Result<(), StoreError> {
    store.set(KEY_WEEK_SCHEDULE, schedule)
}
