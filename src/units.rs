// src/units.rs
use serde::{Deserialize, Serialize};
use std::fmt;

pub const KG_TO_LB: f64 = 2.20462;

/// Display unit for weights. Storage is always kilograms.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl WeightUnit {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Lb => "lb",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Kilograms to pounds, rounded to one decimal for display.
pub fn kg_to_lb(kg: f64) -> f64 {
    round_to(kg * KG_TO_LB, 1)
}

/// Pounds to kilograms, rounded to two decimals for storage.
pub fn lb_to_kg(lb: f64) -> f64 {
    round_to(lb / KG_TO_LB, 2)
}

/// Converts a stored kilogram value into the display unit.
pub fn to_display(kg: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => round_to(kg, 1),
        WeightUnit::Lb => kg_to_lb(kg),
    }
}

/// Converts a value entered in the display unit into kilograms for storage.
pub fn from_display(value: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => round_to(value, 2),
        WeightUnit::Lb => lb_to_kg(value),
    }
}

/// Formats a stored kilogram value for display, e.g. `"220.5 lb"`.
pub fn format_weight(kg: f64, unit: WeightUnit) -> String {
    format!("{:.1} {}", to_display(kg, unit), unit)
}
