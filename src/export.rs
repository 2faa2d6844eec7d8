// src/export.rs
use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;

use crate::logs::LogEntry;

const CSV_HEADER: [&str; 8] = [
    "date",
    "program",
    "plan",
    "exercise",
    "set_index",
    "weight_kg",
    "reps",
    "session_volume_kg",
];

/// Writes logs as CSV: one row per set, or one row with empty exercise
/// columns for a session with no sets. Every field is quoted.
pub fn write_csv<W: Write>(entries: &[LogEntry], writer: W) -> Result<(), csv::Error> {
    let mut sorted: Vec<&LogEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for entry in sorted {
        let date = entry.date.to_string();
        let plan = entry.plan.as_deref().unwrap_or("");
        let volume = entry.volume().to_string();

        if entry.set_count() == 0 {
            wtr.write_record([
                date.as_str(),
                entry.program.as_str(),
                plan,
                "",
                "",
                "",
                "",
                volume.as_str(),
            ])?;
            continue;
        }
        for exercise in &entry.exercises {
            for (idx, set) in exercise.sets.iter().enumerate() {
                let set_index = (idx + 1).to_string();
                let weight = set.weight.to_string();
                let reps = set.reps.to_string();
                wtr.write_record([
                    date.as_str(),
                    entry.program.as_str(),
                    plan,
                    exercise.name.as_str(),
                    set_index.as_str(),
                    weight.as_str(),
                    reps.as_str(),
                    volume.as_str(),
                ])?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Renders logs as a CSV string.
pub fn to_csv_string(entries: &[LogEntry]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_csv(entries, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
