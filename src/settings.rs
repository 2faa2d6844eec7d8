// src/settings.rs
use serde::{Deserialize, Serialize};

use crate::units::WeightUnit;

/// User preferences persisted under the settings key and carried in backups.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")] // Missing fields fall back to defaults
pub struct Settings {
    pub units: WeightUnit,
    /// Raise a notification when a saved log sets a personal record.
    pub notify_pr: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            units: WeightUnit::default(),
            notify_pr: true,
        }
    }
}
