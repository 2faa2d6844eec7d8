//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::fs::{self, File};
use std::io::{self, stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use split_tracker_lib::{
    get_config_path_util, load_config_util, program, records, AppService, Config, LogEntry,
    NotificationKind, PersonalRecord, Slot, WeekSchedule, WeekSummary, WeightUnit,
};
use split_tracker_lib::units::format_weight;

const DAY_LABELS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args();
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let config_path =
        get_config_path_util().context("Failed to determine configuration file path")?;
    let config = load_config_util(&config_path)
        .with_context(|| format!("Failed to load config from {config_path:?}"))?;
    init_tracing(&config);

    let mut service = AppService::initialize_with_config(config, config_path)
        .context("Failed to initialize application service")?;
    let header_color = service.config.theme.header();
    let units = service.settings().units;

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Programs => {
            let selected = service.selected_program().id;
            print_program_table(selected, header_color);
        }
        cli::Commands::SelectProgram { id } => {
            service.select_program(&id)?;
            let schedule = service.schedule()?;
            print_schedule_table(&schedule, header_color);
        }
        cli::Commands::Schedule => {
            let schedule = service.schedule()?;
            if export_csv {
                print_schedule_csv(&schedule)?;
            } else {
                print_schedule_table(&schedule, header_color);
            }
        }
        cli::Commands::ToggleRest { day } => {
            let schedule = service.toggle_rest(day)?;
            print_schedule_table(&schedule, header_color);
        }
        cli::Commands::SetSlot { day, label } => {
            let program = service.selected_program();
            let slot = match program.canonical_label(&label) {
                Some(canonical) => Slot::Workout(canonical.to_string()),
                None => Slot::parse(&label),
            };
            let schedule = service.set_slot(day, slot)?;
            print_schedule_table(&schedule, header_color);
        }
        cli::Commands::MoveSlot { from, to } => {
            let schedule = service.move_slot(from, to)?;
            print_schedule_table(&schedule, header_color);
        }
        cli::Commands::Complete { day } => {
            let done = service.toggle_complete(day)?;
            println!(
                "{} marked as {}.",
                DAY_LABELS[day],
                if done { "complete" } else { "not complete" }
            );
        }
        cli::Commands::ResetSchedule => {
            let schedule = service.reset_schedule()?;
            print_schedule_table(&schedule, header_color);
        }
        cli::Commands::ResetProgress => {
            service.reset_progress()?;
            println!("Cleared all completion marks for the week.");
        }
        cli::Commands::Log {
            exercise,
            sets,
            date,
            plan,
            notes,
        } => {
            let parsed = split_tracker_lib::logs::parse_sets(&sets, units);
            if parsed.is_empty() {
                bail!("No sets given. Use WEIGHTxREPS, e.g. \"100x5,90x8\".");
            }
            let mut entry = service.prefill_log(date)?;
            if plan.is_some() {
                entry.plan = plan;
            }
            if notes.is_some() {
                entry.notes = notes;
            }
            entry.add_sets(&exercise, parsed);
            service.save_log(&entry)?;
            print_log_table(&entry, units, header_color);
        }
        cli::Commands::ShowLog { date } => match service.load_log(date) {
            Some(entry) => print_log_table(&entry, units, header_color),
            None => match service.infer_plan(date)? {
                Some(plan) => println!("Nothing logged for {date}. Planned workout: {plan}."),
                None => println!("Nothing logged for {date}. No workout planned (rest day)."),
            },
        },
        cli::Commands::ListLogs { from, to } => {
            let entries = match (from, to) {
                (None, None) => service.list_logs(),
                (from, to) => service.logs_in_range(
                    from.unwrap_or(chrono::NaiveDate::MIN),
                    to.unwrap_or(chrono::NaiveDate::MAX),
                ),
            };
            if entries.is_empty() {
                println!("No workout logs found.");
            } else if export_csv {
                split_tracker_lib::export::write_csv(&entries, io::stdout())?;
            } else {
                print_log_list_table(&entries, units, header_color);
            }
        }
        cli::Commands::DeleteLog { date } => {
            service.delete_log(date)?;
            println!("Deleted workout log for {date}.");
        }
        cli::Commands::Records { exercise } => {
            let records: Vec<PersonalRecord> = match exercise {
                Some(name) => service.personal_record(&name).into_iter().collect(),
                None => service.personal_records().into_values().collect(),
            };
            if records.is_empty() {
                println!("No personal records yet. Log sets with weight and reps first.");
            } else if export_csv {
                print_records_csv(&records)?;
            } else {
                print_records_table(&records, units, header_color);
            }
        }
        cli::Commands::Week { date } => {
            let summary = service.week_summary(date)?;
            print_week_summary(&summary, units, header_color);
        }
        cli::Commands::SetUnits { units } => {
            let unit = match units {
                cli::UnitsCli::Kg => WeightUnit::Kg,
                cli::UnitsCli::Lb => WeightUnit::Lb,
            };
            service.set_units(unit)?;
            println!("Weights will be shown in {unit}.");
        }
        cli::Commands::SetPrNotification { enabled } => {
            service.set_pr_notifications(enabled)?;
            println!(
                "Personal record notifications {}.",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        cli::Commands::ExportCsv { output } => match output {
            Some(path) => {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                service.export_csv(file)?;
                println!("Exported workout logs to {}.", path.display());
            }
            None => service.export_csv(io::stdout())?,
        },
        cli::Commands::Backup { output } => {
            let json = serde_json::to_string_pretty(&service.export_backup())
                .context("Failed to serialize backup")?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Backup written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        cli::Commands::Restore { input } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let doc: serde_json::Value =
                serde_json::from_str(&text).context("Backup file is not valid JSON")?;
            let summary = service.import_backup(&doc)?;
            println!(
                "Restored {} ({} workout log(s)).",
                summary.applied.join(", "),
                summary.log_count
            );
        }
        cli::Commands::Wipe { yes } => {
            if !yes {
                bail!("Refusing to delete all data without --yes.");
            }
            service.wipe_all()?;
            println!("All data deleted.");
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    if let Some(notification) = service.notifier.take() {
        match notification.kind {
            NotificationKind::Error | NotificationKind::Warning => {
                eprintln!("{}", notification.message);
            }
            NotificationKind::Info | NotificationKind::Success => {
                println!("{}", notification.message);
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn print_program_table(selected: &str, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Rotation").fg(header_color),
            Cell::new("Rest Days (default / max)").fg(header_color),
        ]);

    for p in program::all() {
        let mut id_cell = Cell::new(p.id);
        if p.id == selected {
            id_cell = id_cell.add_attribute(Attribute::Bold);
        }
        table.add_row(vec![
            id_cell,
            Cell::new(p.name),
            Cell::new(p.rotation.join(" → ")),
            Cell::new(format!("{} / {}", p.default_rest, p.rest_limit)),
        ]);
    }
    println!("{table}");
}

fn print_schedule_table(schedule: &WeekSchedule, header_color: Color) {
    let program = schedule.program_def();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(header_color),
            Cell::new("Day").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Done").fg(header_color),
        ]);

    for (idx, (slot, done)) in schedule.slots().iter().zip(schedule.completed()).enumerate() {
        let workout = if slot.is_rest() {
            Cell::new(slot.to_string()).fg(Color::DarkGrey)
        } else {
            Cell::new(slot.to_string())
        };
        table.add_row(vec![
            Cell::new(idx.to_string()),
            Cell::new(DAY_LABELS[idx]),
            workout,
            Cell::new(if *done { "✔" } else { "" }),
        ]);
    }
    println!("{} ({})", program.name, program.id);
    println!("{table}");
    println!(
        "Rest days: {} / {} max. Completed: {} / {} training days.",
        schedule.rest_count(),
        program.rest_limit,
        schedule.completed_training_days(),
        schedule.training_days()
    );
    println!(
        "Created {}, last saved {}.",
        schedule.created_at().format("%Y-%m-%d"),
        schedule.updated_at().format("%Y-%m-%d %H:%M")
    );
}

fn print_schedule_csv(schedule: &WeekSchedule) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Day", "Workout", "Done"])?;
    for (idx, (slot, done)) in schedule.slots().iter().zip(schedule.completed()).enumerate() {
        let workout = slot.to_string();
        let done = done.to_string();
        writer.write_record([DAY_LABELS[idx], workout.as_str(), done.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_log_table(entry: &LogEntry, units: WeightUnit, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new("Set").fg(header_color),
            Cell::new(format!("Weight ({units})")).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new(format!("Est. 1RM ({units})")).fg(header_color),
        ]);

    for exercise in &entry.exercises {
        for (idx, set) in exercise.sets.iter().enumerate() {
            let e1rm = records::estimate_1rm(set.weight, set.reps)
                .map_or("-".to_string(), |v| format_weight(v, units));
            table.add_row(vec![
                Cell::new(&exercise.name),
                Cell::new((idx + 1).to_string()),
                Cell::new(format_weight(set.weight, units)),
                Cell::new(set.reps.to_string()),
                Cell::new(e1rm),
            ]);
        }
    }
    println!(
        "{} | {} | plan: {}",
        entry.date,
        entry.program,
        entry.plan.as_deref().unwrap_or("none")
    );
    println!("{table}");
    println!("Session volume: {}", format_weight(entry.volume(), units));
    if let Some(notes) = &entry.notes {
        println!("Notes: {notes}");
    }
}

fn print_log_list_table(entries: &[LogEntry], units: WeightUnit, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").fg(header_color),
            Cell::new("Program").fg(header_color),
            Cell::new("Plan").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new(format!("Volume ({units})")).fg(header_color),
        ]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.date.to_string()),
            Cell::new(&entry.program),
            Cell::new(entry.plan.as_deref().unwrap_or("-")),
            Cell::new(entry.exercises.len().to_string()),
            Cell::new(entry.set_count().to_string()),
            Cell::new(format_weight(entry.volume(), units)),
        ]);
    }
    println!("{table}");
}

fn print_records_table(records: &[PersonalRecord], units: WeightUnit, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new(format!("Weight ({units})")).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new(format!("Est. 1RM ({units})")).fg(header_color),
            Cell::new("Date").fg(header_color),
        ]);

    for pr in records {
        table.add_row(vec![
            Cell::new(&pr.exercise),
            Cell::new(format_weight(pr.weight, units)),
            Cell::new(pr.reps.to_string()),
            Cell::new(format_weight(pr.estimated_1rm, units)).add_attribute(Attribute::Bold),
            Cell::new(pr.date.to_string()),
        ]);
    }
    println!("{table}");
}

fn print_records_csv(records: &[PersonalRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["exercise", "weight_kg", "reps", "estimated_1rm_kg", "date"])?;
    for pr in records {
        writer.write_record([
            pr.exercise.clone(),
            pr.weight.to_string(),
            pr.reps.to_string(),
            format!("{:.2}", pr.estimated_1rm),
            pr.date.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_week_summary(summary: &WeekSummary, units: WeightUnit, header_color: Color) {
    println!("Week of {}", summary.week_start);
    if summary.sessions.is_empty() {
        println!("No sessions logged this week.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Date").fg(header_color),
                Cell::new("Plan").fg(header_color),
                Cell::new("Sets").fg(header_color),
                Cell::new(format!("Volume ({units})")).fg(header_color),
                Cell::new("PRs").fg(header_color),
            ]);
        for session in &summary.sessions {
            table.add_row(vec![
                Cell::new(session.date.to_string()),
                Cell::new(session.plan.as_deref().unwrap_or("-")),
                Cell::new(session.sets.to_string()),
                Cell::new(format_weight(session.volume_kg, units)),
                Cell::new(session.prs.join(", ")).fg(Color::Yellow),
            ]);
        }
        println!("{table}");
    }
    println!(
        "Total volume: {}. Completed {} / {} planned days.",
        format_weight(summary.total_volume_kg, units),
        summary.completed_days,
        summary.planned_days
    );
}
