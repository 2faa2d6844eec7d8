use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

// --- Declare modules ---
pub mod backup;
mod config;
pub mod export;
pub mod history;
pub mod inference;
pub mod logs;
pub mod notify;
pub mod program;
pub mod records;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod units;

// --- Expose public types ---
pub use backup::{Backup, BackupError, ImportSummary};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, Error as ConfigError, StandardColor, Theme,
};
pub use history::{SessionSummary, WeekSummary};
pub use logs::{ExerciseLog, LogEntry, SetEntry};
pub use notify::{Notification, NotificationKind, Notifier};
pub use program::Program;
pub use records::{PersonalRecord, PR_TOLERANCE};
pub use schedule::{ScheduleError, ScheduleSession, Slot, WeekSchedule};
pub use settings::Settings;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
pub use units::WeightUnit;

/// Application facade: owns the store, the configuration, the notifier and
/// the (at most one) open schedule edit session.
pub struct AppService<S: KeyValueStore = SqliteStore> {
    pub config: Config,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub store: S,
    pub notifier: Notifier,
    session: Option<ScheduleSession>,
}

impl AppService<SqliteStore> {
    /// Initializes the application service from the on-disk config and database.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        Self::initialize_with_config(config, config_path)
    }

    /// Opens the database named by `config` (or the default location).
    /// # Errors
    /// Returns `anyhow::Error` if the database cannot be opened.
    pub fn initialize_with_config(config: Config, config_path: PathBuf) -> Result<Self> {
        let db_path = match &config.db_path {
            Some(path) => path.clone(),
            None => store::get_db_path().context("Failed to determine database path")?,
        };
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;
        tracing::debug!(db = %db_path.display(), "Opened data store");
        Ok(Self::with_store(store, config, config_path, db_path))
    }
}

impl<S: KeyValueStore> AppService<S> {
    /// Builds a service over an existing store (used by tests with `MemoryStore`).
    pub fn with_store(store: S, config: Config, config_path: PathBuf, db_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
            db_path,
            store,
            notifier: Notifier::new(),
            session: None,
        }
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    // --- Settings ---

    pub fn settings(&self) -> Settings {
        self.store.get_or(store::KEY_SETTINGS, Settings::default())
    }

    /// Sets the display unit for weights.
    /// # Errors
    /// Returns `anyhow::Error` if the settings cannot be persisted.
    pub fn set_units(&mut self, units: WeightUnit) -> Result<()> {
        let mut settings = self.settings();
        settings.units = units;
        self.store
            .set(store::KEY_SETTINGS, &settings)
            .context("Failed to save settings")
    }

    /// Enables or disables personal-record notifications.
    /// # Errors
    /// Returns `anyhow::Error` if the settings cannot be persisted.
    pub fn set_pr_notifications(&mut self, enabled: bool) -> Result<()> {
        let mut settings = self.settings();
        settings.notify_pr = enabled;
        self.store
            .set(store::KEY_SETTINGS, &settings)
            .context("Failed to save settings")
    }

    // --- Program selection ---

    /// The selected program, falling back to the configured default and then push/pull/legs.
    pub fn selected_program(&self) -> &'static Program {
        let id: String = self
            .store
            .get_or(store::KEY_SELECTED_PROGRAM, self.config.default_program.clone());
        program::resolve(&id)
    }

    /// Switches program. A different program resets the week to its default schedule.
    /// # Errors
    /// Returns `anyhow::Error` if an edit session is open or persisting fails.
    pub fn select_program(&mut self, id: &str) -> Result<&'static Program> {
        if self.session.is_some() {
            bail!(ScheduleError::SessionAlreadyOpen);
        }
        let program = program::resolve(id);
        self.store
            .set(store::KEY_SELECTED_PROGRAM, program.id)
            .context("Failed to save selected program")?;

        let current: Option<WeekSchedule> = self.store.get_opt(store::KEY_WEEK_SCHEDULE);
        let changed = current.map_or(true, |s| s.program() != program.id);
        if changed {
            let fresh = WeekSchedule::new_default(program, Utc::now());
            schedule::save(&mut self.store, &fresh).context("Failed to save new schedule")?;
            tracing::info!(program = program.id, "Switched program, schedule reset");
        }

        if program::find(id).is_none() {
            self.notifier.show(
                NotificationKind::Warning,
                format!("Unknown program '{}', using {}", id.trim(), program.name),
            );
        } else if changed {
            self.notifier
                .show(NotificationKind::Success, format!("Program set to {}", program.name));
        } else {
            self.notifier.show(
                NotificationKind::Info,
                format!("{} is already selected, schedule kept", program.name),
            );
        }
        Ok(program)
    }

    // --- Schedule ---

    /// The persisted schedule for the selected program, rebuilt if missing or malformed.
    /// # Errors
    /// Returns `anyhow::Error` if a rebuilt schedule cannot be persisted.
    pub fn schedule(&mut self) -> Result<WeekSchedule> {
        let program_id = self.selected_program().id;
        schedule::load(&mut self.store, program_id, Utc::now()).context("Failed to load schedule")
    }

    /// Opens an edit session over the current schedule.
    /// # Errors
    /// Returns `ScheduleError::SessionAlreadyOpen` if one is already open.
    pub fn begin_edit(&mut self) -> Result<&mut WeekSchedule> {
        if self.session.is_some() {
            bail!(ScheduleError::SessionAlreadyOpen);
        }
        let current = self.schedule()?;
        let session = self.session.insert(ScheduleSession::begin(current));
        Ok(session.schedule_mut())
    }

    pub const fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    /// The working copy of the open edit session.
    /// # Errors
    /// Returns `ScheduleError::NoOpenSession` if no session is open.
    pub fn editing(&mut self) -> Result<&mut WeekSchedule> {
        match self.session.as_mut() {
            Some(session) => Ok(session.schedule_mut()),
            None => bail!(ScheduleError::NoOpenSession),
        }
    }

    /// Persists the working copy and closes the session.
    /// # Errors
    /// Returns `ScheduleError::NoOpenSession`, or a storage error (the session then stays open).
    pub fn commit_edit(&mut self) -> Result<WeekSchedule> {
        let session = self.session.take().ok_or(ScheduleError::NoOpenSession)?;
        match session.commit(&mut self.store, Utc::now()) {
            Ok(committed) => {
                self.notifier.show(NotificationKind::Success, "Schedule saved");
                Ok(committed)
            }
            Err((session, e)) => {
                self.session = Some(session);
                Err(anyhow::Error::new(e).context("Failed to save schedule"))
            }
        }
    }

    /// Drops the working copy and returns the last persisted schedule.
    /// # Errors
    /// Returns `ScheduleError::NoOpenSession` if no session is open.
    pub fn discard_edit(&mut self) -> Result<WeekSchedule> {
        let session = self.session.take().ok_or(ScheduleError::NoOpenSession)?;
        Ok(session.discard())
    }

    /// Runs one edit as its own session: begin, apply, commit.
    /// A failing edit discards the session and persists nothing.
    fn apply_edit<T>(
        &mut self,
        edit: impl FnOnce(&mut WeekSchedule) -> Result<T, ScheduleError>,
    ) -> Result<(T, WeekSchedule)> {
        let working = self.begin_edit()?;
        match edit(working) {
            Ok(value) => Ok((value, self.commit_edit()?)),
            Err(e) => {
                self.discard_edit()?;
                Err(e.into())
            }
        }
    }

    /// Toggles a day between rest and training and saves.
    /// # Errors
    /// Returns `anyhow::Error` for an invalid day, an open session, or a storage failure.
    pub fn toggle_rest(&mut self, index: usize) -> Result<WeekSchedule> {
        self.apply_edit(|s| s.toggle_rest(index)).map(|(_, s)| s)
    }

    /// Assigns a label (or rest) to a day and saves.
    /// # Errors
    /// Returns `anyhow::Error` for an invalid day or label, an open session, or a storage failure.
    pub fn set_slot(&mut self, index: usize, slot: Slot) -> Result<WeekSchedule> {
        self.apply_edit(|s| s.set_slot(index, slot)).map(|(_, s)| s)
    }

    /// Moves one day to another position and saves.
    /// # Errors
    /// Returns `anyhow::Error` for an invalid day, an open session, or a storage failure.
    pub fn move_slot(&mut self, from: usize, to: usize) -> Result<WeekSchedule> {
        self.apply_edit(|s| s.move_slot(from, to)).map(|(_, s)| s)
    }

    /// Flips a day's completion flag and saves. Returns the new flag.
    /// # Errors
    /// Returns `anyhow::Error` for an invalid day, an open session, or a storage failure.
    pub fn toggle_complete(&mut self, index: usize) -> Result<bool> {
        self.apply_edit(|s| s.toggle_complete(index)).map(|(done, _)| done)
    }

    /// Rebuilds the default week for the selected program and saves.
    /// # Errors
    /// Returns `anyhow::Error` if a session is open or saving fails.
    pub fn reset_schedule(&mut self) -> Result<WeekSchedule> {
        self.apply_edit(|s| {
            s.reset_to_default();
            Ok(())
        })
        .map(|(_, s)| s)
    }

    /// Clears the week's completion flags and saves.
    /// # Errors
    /// Returns `anyhow::Error` if a session is open or saving fails.
    pub fn reset_progress(&mut self) -> Result<WeekSchedule> {
        self.apply_edit(|s| {
            s.reset_progress();
            Ok(())
        })
        .map(|(_, s)| s)
    }

    // --- Logs ---

    /// The workout planned for a date under the selected program.
    /// # Errors
    /// Returns `anyhow::Error` if the schedule cannot be loaded.
    pub fn infer_plan(&mut self, date: NaiveDate) -> Result<Option<String>> {
        let schedule = self.schedule()?;
        let program_id = self.selected_program().id;
        Ok(inference::infer_plan(date, &schedule, program_id))
    }

    /// The stored log for a date, or a fresh one whose plan comes from the schedule.
    /// # Errors
    /// Returns `anyhow::Error` if the schedule cannot be loaded.
    pub fn prefill_log(&mut self, date: NaiveDate) -> Result<LogEntry> {
        if let Some(entry) = logs::load(&self.store, date) {
            return Ok(entry);
        }
        let plan = self.infer_plan(date)?;
        Ok(LogEntry::new(date, self.selected_program().id, plan))
    }

    /// Saves a log (replacing the date's previous entry) and returns the exercises
    /// in it that match their all-time best.
    /// # Errors
    /// Returns `anyhow::Error` if persisting fails.
    pub fn save_log(&mut self, entry: &LogEntry) -> Result<Vec<String>> {
        logs::save(&mut self.store, entry)
            .with_context(|| format!("Failed to save log for {}", entry.date))?;

        let all_time = records::all_records(&logs::list(&self.store));
        let prs = records::session_prs(entry, &all_time);
        if !prs.is_empty() && self.settings().notify_pr {
            self.notifier.show(
                NotificationKind::Success,
                format!("New personal record: {}", prs.join(", ")),
            );
        }
        Ok(prs)
    }

    /// Adds sets for one exercise to a date's log and saves it.
    /// # Errors
    /// Returns `anyhow::Error` if the exercise name is empty or saving fails.
    pub fn log_sets(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        sets: Vec<SetEntry>,
    ) -> Result<(LogEntry, Vec<String>)> {
        if exercise.trim().is_empty() {
            bail!("Exercise name cannot be empty.");
        }
        let mut entry = self.prefill_log(date)?;
        entry.add_sets(exercise, sets);
        let prs = self.save_log(&entry)?;
        Ok((entry, prs))
    }

    pub fn load_log(&self, date: NaiveDate) -> Option<LogEntry> {
        logs::load(&self.store, date)
    }

    pub fn list_logs(&self) -> Vec<LogEntry> {
        logs::list(&self.store)
    }

    pub fn logs_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<LogEntry> {
        logs::range(&self.store, from, to)
    }

    /// Deletes a date's log.
    /// # Errors
    /// Returns `anyhow::Error` if no log exists for the date or persisting fails.
    pub fn delete_log(&mut self, date: NaiveDate) -> Result<()> {
        if !logs::delete(&mut self.store, date).context("Failed to delete log")? {
            bail!("No workout log found for {date}");
        }
        Ok(())
    }

    // --- Records & history ---

    pub fn personal_records(&self) -> BTreeMap<String, PersonalRecord> {
        records::all_records(&self.list_logs())
    }

    pub fn personal_record(&self, exercise: &str) -> Option<PersonalRecord> {
        records::best_for_exercise(&self.list_logs(), exercise)
    }

    /// Summary of the week containing `date`.
    /// # Errors
    /// Returns `anyhow::Error` if the schedule cannot be loaded.
    pub fn week_summary(&mut self, date: NaiveDate) -> Result<WeekSummary> {
        let schedule = self.schedule()?;
        Ok(history::summarize_week(date, &self.list_logs(), &schedule))
    }

    // --- Backup, export, wipe ---

    pub fn export_backup(&self) -> Backup {
        backup::export(&self.store, Utc::now())
    }

    /// Imports a backup document. A rejected document changes nothing.
    /// # Errors
    /// Returns `anyhow::Error` wrapping `BackupError` if the document is rejected,
    /// or if an edit session is open.
    pub fn import_backup(&mut self, doc: &Value) -> Result<ImportSummary> {
        if self.session.is_some() {
            bail!(ScheduleError::SessionAlreadyOpen);
        }
        match backup::import(&mut self.store, doc) {
            Ok(summary) => {
                self.notifier.show(
                    NotificationKind::Success,
                    format!("Imported {} field(s)", summary.applied.len()),
                );
                Ok(summary)
            }
            Err(e) => {
                self.notifier
                    .show(NotificationKind::Error, format!("Import failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Writes all logs as CSV.
    /// # Errors
    /// Returns `anyhow::Error` if writing fails.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        export::write_csv(&self.list_logs(), writer).context("Failed to write CSV export")
    }

    /// Deletes every stored key and drops any open edit session.
    /// # Errors
    /// Returns `anyhow::Error` if a delete fails.
    pub fn wipe_all(&mut self) -> Result<()> {
        self.session = None;
        for key in store::ALL_KEYS {
            self.store
                .delete(key)
                .with_context(|| format!("Failed to delete '{key}'"))?;
        }
        tracing::info!("Wiped all stored data");
        Ok(())
    }
}
