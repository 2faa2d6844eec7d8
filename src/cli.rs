// src/cli.rs
use chrono::{Duration, NaiveDate, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan a weekly training split and track workouts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Print tabular output as CSV instead of a table
    #[arg(long, global = true)]
    pub export_csv: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Kg,
    Lb,
}

// Custom parser for date strings and shorthands
pub fn parse_date_shorthand(s: &str) -> Result<NaiveDate, String> {
    match s.to_lowercase().as_str() {
        "today" => Ok(Utc::now().date_naive()),
        "yesterday" => Ok((Utc::now() - Duration::days(1)).date_naive()),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d.%m.%Y"))
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
            .map_err(|_| {
                format!(
                    "Invalid date format: '{s}'. Use 'today', 'yesterday', YYYY-MM-DD, DD.MM.YYYY, or YYYY/MM/DD."
                )
            }),
    }
}

const DAY_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

// Accepts 0-6 (Monday = 0) or a weekday name like "tue" / "Tuesday"
pub fn parse_day(s: &str) -> Result<usize, String> {
    let lower = s.trim().to_lowercase();
    if let Ok(idx) = lower.parse::<usize>() {
        return if idx < 7 {
            Ok(idx)
        } else {
            Err(format!("Day index {idx} is out of range (0-6)."))
        };
    }
    DAY_NAMES
        .iter()
        .position(|name| lower.len() >= 3 && lower.starts_with(name))
        .ok_or_else(|| format!("Invalid day: '{s}'. Use 0-6 (Monday = 0) or a weekday name."))
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available training programs
    Programs,
    /// Select the active program (resets the weekly schedule when it changes)
    SelectProgram {
        /// Program identifier, e.g. "ppl" or "upper_lower"
        id: String,
    },
    /// Show the weekly schedule
    Schedule,
    /// Toggle a day between rest and training
    ToggleRest {
        #[arg(value_parser = parse_day)]
        day: usize,
    },
    /// Assign a workout label (or "rest") to a day
    SetSlot {
        #[arg(value_parser = parse_day)]
        day: usize,
        /// A label from the active program's rotation, or "rest"
        label: String,
    },
    /// Move a day to another position in the week
    MoveSlot {
        #[arg(value_parser = parse_day)]
        from: usize,
        #[arg(value_parser = parse_day)]
        to: usize,
    },
    /// Toggle a day's completion mark
    Complete {
        #[arg(value_parser = parse_day)]
        day: usize,
    },
    /// Rebuild the default week for the active program
    ResetSchedule,
    /// Clear all completion marks
    ResetProgress,
    /// Log sets for an exercise
    Log {
        /// Name of the exercise
        #[arg(short, long)]
        exercise: String,
        /// Sets as WEIGHTxREPS separated by commas, e.g. "100x5,90x8" (weights in display units)
        #[arg(short, long)]
        sets: String,
        /// Date of the session (YYYY-MM-DD, today, yesterday)
        #[arg(long, value_parser = parse_date_shorthand, default_value = "today")]
        date: NaiveDate,
        /// Workout label for the session, overriding the one inferred from the schedule
        #[arg(long)]
        plan: Option<String>,
        /// Notes for the session
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show the log for a date (or the planned workout if nothing is logged)
    ShowLog {
        #[arg(long, value_parser = parse_date_shorthand, default_value = "today")]
        date: NaiveDate,
    },
    /// List logged sessions
    ListLogs {
        #[arg(long, value_parser = parse_date_shorthand)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date_shorthand)]
        to: Option<NaiveDate>,
    },
    /// Delete the log for a date
    DeleteLog {
        #[arg(long, value_parser = parse_date_shorthand)]
        date: NaiveDate,
    },
    /// Show personal records (best estimated 1RM per exercise)
    Records {
        /// Only show this exercise
        #[arg(short, long)]
        exercise: Option<String>,
    },
    /// Summarize the week containing a date
    Week {
        #[arg(long, value_parser = parse_date_shorthand, default_value = "today")]
        date: NaiveDate,
    },
    /// Set the display unit for weights
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Enable or disable personal record notifications
    SetPrNotification {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Export all logs as CSV
    ExportCsv {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a JSON backup of all data
    Backup {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore data from a JSON backup
    Restore {
        /// Backup file to import
        input: PathBuf,
    },
    /// Delete all stored data
    Wipe {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion script
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
