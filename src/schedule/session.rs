// src/schedule/session.rs
use chrono::{DateTime, Utc};

use super::WeekSchedule;
use crate::store::{KeyValueStore, StoreError};

/// A staged edit of the weekly schedule.
///
/// Edits go to a working copy; `commit` persists the whole copy at once and
/// `discard` hands back the schedule as it was when the session began.
#[derive(Debug, Clone)]
pub struct ScheduleSession {
    baseline: WeekSchedule,
    working: WeekSchedule,
}

impl ScheduleSession {
    pub fn begin(schedule: WeekSchedule) -> Self {
        Self {
            working: schedule.clone(),
            baseline: schedule,
        }
    }

    pub fn schedule_mut(&mut self) -> &mut WeekSchedule {
        &mut self.working
    }

    /// True if the working copy differs from the persisted schedule.
    pub fn is_dirty(&self) -> bool {
        self.working != self.baseline
    }

    /// Persists the working copy and returns it.
    /// On failure nothing is written and the session is returned intact alongside the error.
    pub fn commit<S: KeyValueStore>(
        self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<WeekSchedule, (Self, StoreError)> {
        if !self.is_dirty() {
            return Ok(self.working);
        }
        let mut committed = self.working.clone();
        committed.touch(now);
        match super::save(store, &committed) {
            Ok(()) => {
                tracing::info!(program = committed.program(), "Committed schedule edits");
                Ok(committed)
            }
            Err(e) => Err((self, e)),
        }
    }

    /// Drops the working copy and returns the last persisted schedule.
    pub fn discard(self) -> WeekSchedule {
        if self.is_dirty() {
            tracing::debug!("Discarded schedule edits");
        }
        self.baseline
    }
}
