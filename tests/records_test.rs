use anyhow::Result;
use chrono::NaiveDate;
use split_tracker_lib::export::to_csv_string;
use split_tracker_lib::history::{summarize_week, week_start, weekly_volume};
use split_tracker_lib::logs::{coerce_reps, coerce_weight, parse_sets};
use split_tracker_lib::records::{
    all_records, best_for_exercise, estimate_1rm, matches_record, session_best, session_prs,
};
use split_tracker_lib::units::{from_display, kg_to_lb, lb_to_kg, to_display};
use split_tracker_lib::{
    LogEntry, NotificationKind, Notifier, SetEntry, WeekSchedule, WeightUnit, PR_TOLERANCE,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session(on: NaiveDate, exercise: &str, sets: &[(f64, u32)]) -> LogEntry {
    let mut entry = LogEntry::new(on, "ppl", Some("Push".to_string()));
    entry.add_sets(exercise, sets.iter().map(|&(w, r)| SetEntry::new(w, r)));
    entry
}

#[test]
fn test_epley_estimate() {
    let e1rm = estimate_1rm(100.0, 5).unwrap();
    assert!((e1rm - 116.666_666).abs() < 1e-3);
    assert!((estimate_1rm(90.0, 8).unwrap() - 114.0).abs() < 1e-9);
    assert_eq!(estimate_1rm(0.0, 5), None);
    assert_eq!(estimate_1rm(100.0, 0), None);
}

#[test]
fn test_best_for_exercise_picks_highest_estimate() {
    let logs = vec![session(date(2024, 1, 1), "Bench Press", &[(100.0, 5), (90.0, 8)])];
    let pr = best_for_exercise(&logs, "Bench Press").unwrap();
    assert_eq!(pr.weight, 100.0);
    assert_eq!(pr.reps, 5);
    assert!((pr.estimated_1rm - 116.67).abs() < 0.01);
}

#[test]
fn test_best_for_exercise_keeps_first_on_tie() {
    // 120x0 is skipped entirely; both scored sets estimate 116.67
    let logs = vec![
        session(date(2024, 1, 1), "Bench Press", &[(120.0, 0), (100.0, 5)]),
        session(date(2024, 1, 8), "Bench Press", &[(100.0, 5)]),
    ];
    let pr = best_for_exercise(&logs, "Bench Press").unwrap();
    assert_eq!(pr.date, date(2024, 1, 1));
    assert_eq!(pr.weight, 100.0);
}

#[test]
fn test_unscored_sets_produce_no_record() {
    let logs = vec![session(date(2024, 1, 1), "Plank", &[(0.0, 1), (0.0, 3)])];
    assert!(best_for_exercise(&logs, "Plank").is_none());
    assert!(all_records(&logs).is_empty());
}

#[test]
fn test_all_records_per_exercise() {
    let mut day1 = session(date(2024, 1, 1), "Bench Press", &[(80.0, 10)]);
    day1.add_sets("Overhead Press", [SetEntry::new(50.0, 5)]);
    let day2 = session(date(2024, 1, 3), "Bench Press", &[(85.0, 8)]);
    let records = all_records(&[day1, day2]);

    assert_eq!(records.len(), 2);
    // 85x8 (107.67) beats 80x10 (106.67)
    assert_eq!(records["Bench Press"].date, date(2024, 1, 3));
    assert_eq!(records["Overhead Press"].weight, 50.0);
}

#[test]
fn test_session_prs_use_tolerance() {
    let old = session(date(2024, 1, 1), "Squat", &[(140.0, 5)]);
    let new = session(date(2024, 1, 8), "Squat", &[(140.0, 5), (100.0, 3)]);
    let weaker = session(date(2024, 1, 10), "Squat", &[(130.0, 5)]);
    let logs = vec![old.clone(), new.clone(), weaker.clone()];
    let records = all_records(&logs);

    // equalling the record counts as a PR
    assert_eq!(session_prs(&new, &records), vec!["Squat".to_string()]);
    assert_eq!(session_prs(&old, &records), vec!["Squat".to_string()]);
    assert!(session_prs(&weaker, &records).is_empty());

    let best = session_best(&new, "Squat").unwrap();
    assert!(matches_record(best + PR_TOLERANCE / 2.0, best));
    assert!(!matches_record(best + 0.01, best));
}

#[test]
fn test_unit_round_trip_within_tolerance() {
    let lb = kg_to_lb(100.0);
    assert_eq!(lb, 220.5);
    let kg = lb_to_kg(lb);
    assert!((kg - 100.0).abs() <= 0.1);

    assert_eq!(to_display(100.0, WeightUnit::Kg), 100.0);
    assert!((from_display(to_display(62.5, WeightUnit::Lb), WeightUnit::Lb) - 62.5).abs() <= 0.1);
}

#[test]
fn test_weight_and_reps_input_coercion() {
    assert_eq!(coerce_weight("82.5"), 82.5);
    assert_eq!(coerce_weight("abc"), 0.0);
    assert_eq!(coerce_weight("-20"), 0.0);
    assert_eq!(coerce_reps("8"), 8);
    assert_eq!(coerce_reps("-3"), 0);
    assert_eq!(coerce_reps("ten"), 0);
}

#[test]
fn test_parse_sets_converts_to_kg() {
    let sets = parse_sets("100x5, 90X8 ,bw x 10, 60", WeightUnit::Kg);
    assert_eq!(
        sets,
        vec![
            SetEntry::new(100.0, 5),
            SetEntry::new(90.0, 8),
            SetEntry::new(0.0, 10),
            SetEntry::new(60.0, 0),
        ]
    );

    let sets = parse_sets("225x5", WeightUnit::Lb);
    assert!((sets[0].weight - 102.06).abs() < 0.01);
}

#[test]
fn test_lenient_set_deserialization() -> Result<()> {
    let entry: LogEntry = serde_json::from_value(serde_json::json!({
        "date": "2024-01-01",
        "program": "ppl",
        "plan": "Push",
        "exercises": [
            { "name": "Bench Press", "sets": [
                { "weight": "abc", "reps": -3 },
                { "weight": "60", "reps": "8" },
                { "weight": -5, "reps": 4 }
            ]}
        ]
    }))?;
    let sets = &entry.exercises[0].sets;
    assert_eq!(sets[0], SetEntry::new(0.0, 0));
    assert_eq!(sets[1], SetEntry::new(60.0, 8));
    assert_eq!(sets[2], SetEntry::new(0.0, 4));
    assert_eq!(entry.volume(), 480.0);
    Ok(())
}

#[test]
fn test_csv_export_rows_and_quoting() -> Result<()> {
    let mut lifting = session(date(2024, 1, 2), "Farmer's \"Walk\"", &[(40.0, 10), (45.0, 8)]);
    lifting.plan = Some("Legs".to_string());
    let empty = LogEntry::new(date(2024, 1, 1), "ppl", None);

    let csv = to_csv_string(&[lifting, empty])?;
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines[0],
        "\"date\",\"program\",\"plan\",\"exercise\",\"set_index\",\"weight_kg\",\"reps\",\"session_volume_kg\""
    );
    // sorted by date: the empty session comes first with blank exercise columns
    assert_eq!(lines[1], "\"2024-01-01\",\"ppl\",\"\",\"\",\"\",\"\",\"\",\"0\"");
    assert_eq!(
        lines[2],
        "\"2024-01-02\",\"ppl\",\"Legs\",\"Farmer's \"\"Walk\"\"\",\"1\",\"40\",\"10\",\"760\""
    );
    assert_eq!(lines.len(), 4);
    Ok(())
}

#[test]
fn test_csv_keeps_session_whose_exercises_have_no_sets() -> Result<()> {
    let mut entry = LogEntry::new(date(2024, 1, 3), "ppl", Some("Pull".to_string()));
    entry.add_sets("Bench", Vec::new());
    assert_eq!(entry.exercises.len(), 1);

    let csv = to_csv_string(&[entry])?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "\"2024-01-03\",\"ppl\",\"Pull\",\"\",\"\",\"\",\"\",\"0\"");
    Ok(())
}

#[test]
fn test_week_summary() {
    let schedule = WeekSchedule::for_program("ppl", chrono::Utc::now());
    let logs = vec![
        session(date(2023, 12, 29), "Bench Press", &[(100.0, 5)]),
        session(date(2024, 1, 2), "Bench Press", &[(90.0, 5)]),
        session(date(2024, 1, 4), "Bench Press", &[(105.0, 5)]),
    ];

    assert_eq!(week_start(date(2024, 1, 4)), date(2024, 1, 1));
    let summary = summarize_week(date(2024, 1, 3), &logs, &schedule);
    assert_eq!(summary.week_start, date(2024, 1, 1));
    assert_eq!(summary.sessions.len(), 2);
    assert_eq!(summary.total_volume_kg, 450.0 + 525.0);
    assert!(summary.sessions[0].prs.is_empty());
    assert_eq!(summary.sessions[1].prs, vec!["Bench Press".to_string()]);
    assert_eq!(summary.planned_days, 6);
    assert_eq!(summary.completed_days, 0);

    let weeks = weekly_volume(&logs);
    assert_eq!(weeks, vec![(date(2023, 12, 25), 500.0), (date(2024, 1, 1), 975.0)]);
}

#[test]
fn test_notifier_single_active() {
    let mut notifier = Notifier::new();
    let first = notifier.show(NotificationKind::Info, "Saved");
    let second = notifier.show(NotificationKind::Success, "New personal record");

    let active = notifier.active().unwrap();
    assert_eq!(active.id, second);
    assert_eq!(active.message, "New personal record");

    // a stale id can't dismiss the newer notification
    assert!(!notifier.dismiss(first));
    assert!(notifier.active().is_some());
    assert!(notifier.dismiss(second));
    assert!(notifier.active().is_none());
}
