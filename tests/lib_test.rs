use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use split_tracker_lib::store::{KEY_WEEK_SCHEDULE, KEY_WORKOUT_LOGS};
use split_tracker_lib::{
    AppService, Config, KeyValueStore, LogEntry, MemoryStore, NotificationKind, ScheduleError,
    SetEntry, Slot, SqliteStore, WeightUnit,
};

// Helper function to create a test service over an in-memory store
fn create_test_service() -> Result<AppService<MemoryStore>> {
    Ok(AppService::with_store(
        MemoryStore::new(),
        Config::default(),
        "test_config.toml".into(),
        ":memory:".into(),
    ))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_unknown_program_selection_falls_back() -> Result<()> {
    let mut service = create_test_service()?;
    assert_eq!(service.selected_program().id, "ppl");

    service.select_program("upper_lower")?;
    assert_eq!(service.selected_program().id, "upper_lower");
    let schedule = service.schedule()?;
    assert_eq!(schedule.program(), "upper_lower");
    assert_eq!(schedule.rest_count(), 3);

    let program = service.select_program("nonsense")?;
    assert_eq!(program.id, "ppl");
    assert_eq!(service.schedule()?.program(), "ppl");
    Ok(())
}

#[test]
fn test_malformed_schedule_is_rebuilt_and_persisted() -> Result<()> {
    let mut service = create_test_service()?;
    service.store.set_raw(
        KEY_WEEK_SCHEDULE,
        &json!({
            "program": "ppl",
            "slots": ["Push", "Pull", "Legs", "Rest", "Push"],
            "completed": [false, false, false, false, false],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        })
        .to_string(),
    )?;

    let schedule = service.schedule()?;
    assert_eq!(schedule.slots().len(), 7);
    assert!(schedule.validate().is_ok());

    let raw = service.store.get_raw(KEY_WEEK_SCHEDULE)?.unwrap_or_default();
    let persisted: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(persisted["slots"].as_array().map(Vec::len), Some(7));
    Ok(())
}

#[test]
fn test_garbage_schedule_value_is_rebuilt() -> Result<()> {
    let mut service = create_test_service()?;
    service.store.set_raw(KEY_WEEK_SCHEDULE, "{not json")?;
    let schedule = service.schedule()?;
    assert_eq!(schedule.slots()[0], Slot::Rest);
    Ok(())
}

#[test]
fn test_edit_session_commit_and_discard() -> Result<()> {
    let mut service = create_test_service()?;
    let original = service.schedule()?;

    service.begin_edit()?.toggle_rest(3)?;
    // persisted state is unchanged until commit
    assert_eq!(service.schedule()?, original);
    let discarded = service.discard_edit()?;
    assert_eq!(discarded, original);
    assert!(!service.is_editing());

    service.begin_edit()?.toggle_rest(3)?;
    service.editing()?.toggle_complete(1)?;
    let committed = service.commit_edit()?;
    assert_eq!(committed.slots()[3], Slot::Rest);
    assert!(committed.completed()[1]);
    assert_eq!(service.schedule()?, committed);
    Ok(())
}

#[test]
fn test_second_session_is_rejected() -> Result<()> {
    let mut service = create_test_service()?;
    service.begin_edit()?;

    let err = service.begin_edit().unwrap_err();
    assert_eq!(
        err.downcast_ref::<ScheduleError>(),
        Some(&ScheduleError::SessionAlreadyOpen)
    );
    assert!(service.toggle_rest(2).is_err());

    service.discard_edit()?;
    assert!(service.commit_edit().is_err());
    Ok(())
}

#[test]
fn test_failed_edit_persists_nothing() -> Result<()> {
    let mut service = create_test_service()?;
    let before = service.schedule()?;
    assert!(service
        .set_slot(2, Slot::Workout("Upper".to_string()))
        .is_err());
    assert!(!service.is_editing());
    assert_eq!(service.schedule()?, before);
    Ok(())
}

#[test]
fn test_toggle_complete_persists() -> Result<()> {
    let mut service = create_test_service()?;
    assert!(service.toggle_complete(2)?);
    assert!(service.schedule()?.completed()[2]);
    assert!(!service.toggle_complete(2)?);
    assert!(!service.schedule()?.completed()[2]);

    service.toggle_complete(4)?;
    let reset = service.reset_progress()?;
    assert!(reset.completed().iter().all(|done| !done));
    Ok(())
}

#[test]
fn test_prefill_log_infers_plan_from_schedule() -> Result<()> {
    let mut service = create_test_service()?;

    // default ppl week: Monday rest, Tuesday push
    let monday = service.prefill_log(date(2024, 1, 1))?;
    assert_eq!(monday.plan, None);
    assert!(monday.exercises.is_empty());
    let tuesday = service.prefill_log(date(2024, 1, 2))?;
    assert_eq!(tuesday.plan.as_deref(), Some("Push"));
    assert_eq!(tuesday.program, "ppl");

    let mut logged = LogEntry::new(date(2024, 1, 2), "ppl", Some("Legs".to_string()));
    logged.add_sets("Squat", [SetEntry::new(100.0, 5)]);
    service.save_log(&logged)?;
    assert_eq!(service.prefill_log(date(2024, 1, 2))?, logged);
    Ok(())
}

#[test]
fn test_malformed_log_entry_is_skipped() -> Result<()> {
    let mut service = create_test_service()?;
    service.store.set_raw(
        KEY_WORKOUT_LOGS,
        &json!({
            "2024-01-02": { "date": "not a date", "program": "ppl" },
            "2024-01-03": {
                "date": "2024-01-03",
                "program": "ppl",
                "plan": "Pull",
                "exercises": [{ "name": "Row", "sets": [{ "weight": "70", "reps": 10 }] }]
            }
        })
        .to_string(),
    )?;

    assert!(service.load_log(date(2024, 1, 2)).is_none());
    let entry = service.prefill_log(date(2024, 1, 2))?;
    assert_eq!(entry.plan.as_deref(), Some("Push"));

    let all = service.list_logs();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].exercises[0].sets[0], SetEntry::new(70.0, 10));
    Ok(())
}

#[test]
fn test_save_log_reports_prs() -> Result<()> {
    let mut service = create_test_service()?;

    let (_, prs) = service.log_sets(date(2024, 1, 2), "Bench Press", vec![SetEntry::new(100.0, 5)])?;
    assert_eq!(prs, vec!["Bench Press".to_string()]);
    let active = service.notifier.take().unwrap();
    assert_eq!(active.kind, NotificationKind::Success);
    assert!(active.message.contains("Bench Press"));

    let (_, prs) = service.log_sets(date(2024, 1, 5), "Bench Press", vec![SetEntry::new(90.0, 5)])?;
    assert!(prs.is_empty());
    assert!(service.notifier.active().is_none());

    service.set_pr_notifications(false)?;
    let (_, prs) = service.log_sets(date(2024, 1, 9), "Bench Press", vec![SetEntry::new(110.0, 5)])?;
    assert_eq!(prs.len(), 1);
    assert!(service.notifier.active().is_none());

    let record = service.personal_record("Bench Press").unwrap();
    assert_eq!(record.date, date(2024, 1, 9));
    Ok(())
}

#[test]
fn test_log_sets_appends_to_existing_session() -> Result<()> {
    let mut service = create_test_service()?;
    service.log_sets(date(2024, 1, 2), "Bench Press", vec![SetEntry::new(80.0, 8)])?;
    let (entry, _) =
        service.log_sets(date(2024, 1, 2), "Bench Press", vec![SetEntry::new(85.0, 6)])?;
    assert_eq!(entry.exercises.len(), 1);
    assert_eq!(entry.set_count(), 2);
    assert!(service.log_sets(date(2024, 1, 2), "  ", Vec::new()).is_err());

    service.delete_log(date(2024, 1, 2))?;
    assert!(service.load_log(date(2024, 1, 2)).is_none());
    assert!(service.delete_log(date(2024, 1, 2)).is_err());
    Ok(())
}

#[test]
fn test_backup_round_trip() -> Result<()> {
    let mut source = create_test_service()?;
    source.select_program("arnold")?;
    source.toggle_complete(1)?;
    source.set_units(WeightUnit::Lb)?;
    source.log_sets(date(2024, 1, 2), "Deadlift", vec![SetEntry::new(180.0, 3)])?;
    source.log_sets(date(2024, 1, 4), "Bench Press", vec![SetEntry::new(90.0, 5)])?;

    let mut exported = serde_json::to_value(source.export_backup())?;

    let mut target = create_test_service()?;
    let summary = target.import_backup(&exported)?;
    assert_eq!(summary.log_count, 2);
    assert!(summary.applied.contains(&"weekSchedule"));

    let mut reexported = serde_json::to_value(target.export_backup())?;
    for doc in [&mut exported, &mut reexported] {
        if let Some(obj) = doc.as_object_mut() {
            obj.remove("exportedAt");
        }
    }
    assert_eq!(exported, reexported);
    assert_eq!(target.selected_program().id, "arnold");
    assert_eq!(target.settings().units, WeightUnit::Lb);
    Ok(())
}

#[test]
fn test_import_rejects_non_object_without_changes() -> Result<()> {
    let mut service = create_test_service()?;
    service.log_sets(date(2024, 1, 2), "Squat", vec![SetEntry::new(120.0, 5)])?;
    let logs_before = service.list_logs();

    assert!(service.import_backup(&json!([1, 2, 3])).is_err());
    assert_eq!(
        service.notifier.active().map(|n| n.kind),
        Some(NotificationKind::Error)
    );

    // one bad field rejects the whole document
    let partial = json!({
        "selectedProgram": "upper_lower",
        "weekSchedule": { "program": "ppl", "slots": ["Rest"], "completed": [false] }
    });
    assert!(service.import_backup(&partial).is_err());

    assert_eq!(service.list_logs(), logs_before);
    assert_eq!(service.selected_program().id, "ppl");
    Ok(())
}

#[test]
fn test_import_applies_only_present_fields() -> Result<()> {
    let mut service = create_test_service()?;
    service.log_sets(date(2024, 1, 2), "Squat", vec![SetEntry::new(120.0, 5)])?;

    let summary = service.import_backup(&json!({ "version": 1, "settings": { "units": "lb" } }))?;
    assert_eq!(summary.applied, vec!["settings"]);
    assert_eq!(service.settings().units, WeightUnit::Lb);
    assert_eq!(service.list_logs().len(), 1);
    Ok(())
}

#[test]
fn test_wipe_all_clears_store() -> Result<()> {
    let mut service = create_test_service()?;
    service.select_program("full_body")?;
    service.log_sets(date(2024, 1, 2), "Squat", vec![SetEntry::new(100.0, 5)])?;
    service.begin_edit()?;

    service.wipe_all()?;
    assert!(service.store.is_empty());
    assert!(!service.is_editing());
    assert_eq!(service.selected_program().id, "ppl");
    assert!(service.list_logs().is_empty());
    Ok(())
}

#[test]
fn test_csv_export_through_service() -> Result<()> {
    let mut service = create_test_service()?;
    service.log_sets(date(2024, 1, 2), "Squat", vec![SetEntry::new(100.0, 5)])?;
    let mut buf = Vec::new();
    service.export_csv(&mut buf)?;
    let text = String::from_utf8(buf)?;
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("\"Squat\",\"1\",\"100\",\"5\",\"500\""));
    Ok(())
}

#[test]
fn test_sqlite_store_upsert_and_delete() -> Result<()> {
    let mut store = SqliteStore::open_in_memory()?;
    assert_eq!(store.get_raw("settings")?, None);

    store.set_raw("settings", "{\"units\":\"kg\"}")?;
    store.set_raw("settings", "{\"units\":\"lb\"}")?;
    assert_eq!(store.get_raw("settings")?.as_deref(), Some("{\"units\":\"lb\"}"));

    let units: Option<String> = store.get_opt("missing");
    assert!(units.is_none());
    assert_eq!(store.get_or("settings", 5_u32), 5);

    assert!(store.delete("settings")?);
    assert!(!store.delete("settings")?);
    Ok(())
}

#[test]
fn test_imported_schedule_selects_its_program() -> Result<()> {
    let mut service = create_test_service()?;
    let summary = service.import_backup(&json!({
        "weekSchedule": {
            "program": "upper_lower",
            "slots": ["Upper", "Rest", "Lower", "Upper", "Rest", "Lower", "Upper"],
            "completed": [true, false, false, false, false, false, false],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z"
        }
    }))?;
    assert_eq!(summary.applied, vec!["weekSchedule"]);

    assert_eq!(service.selected_program().id, "upper_lower");
    let schedule = service.schedule()?;
    assert_eq!(schedule.program(), "upper_lower");
    assert_eq!(schedule.slots()[1], Slot::Rest);
    assert!(schedule.completed()[0]);
    Ok(())
}

#[test]
fn test_import_rejects_schedule_for_other_program() -> Result<()> {
    let mut service = create_test_service()?;
    let before = service.schedule()?;

    let doc = json!({
        "selectedProgram": "ppl",
        "weekSchedule": {
            "program": "upper_lower",
            "slots": ["Upper", "Rest", "Lower", "Upper", "Rest", "Lower", "Upper"],
            "completed": [false, false, false, false, false, false, false]
        }
    });
    assert!(service.import_backup(&doc).is_err());
    assert_eq!(service.selected_program().id, "ppl");
    assert_eq!(service.schedule()?, before);
    Ok(())
}

#[test]
fn test_schedule_without_timestamps_is_kept() -> Result<()> {
    let stored = json!({
        "program": "ppl",
        "slots": ["Push", "Rest", "Pull", "Legs", "Push", "Pull", "Legs"],
        "completed": [false, false, true, false, false, false, false]
    });

    let mut service = create_test_service()?;
    service.store.set_raw(KEY_WEEK_SCHEDULE, &stored.to_string())?;
    let loaded = service.schedule()?;
    assert_eq!(loaded.slots()[0], Slot::Workout("Push".to_string()));
    assert!(loaded.completed()[2]);

    let mut imported = create_test_service()?;
    let summary = imported.import_backup(&json!({ "weekSchedule": stored }))?;
    assert_eq!(summary.applied, vec!["weekSchedule"]);
    assert_eq!(imported.schedule()?.slots(), loaded.slots());
    Ok(())
}

#[test]
fn test_select_program_notification_kinds() -> Result<()> {
    let mut service = create_test_service()?;

    service.select_program("upper_lower")?;
    assert_eq!(
        service.notifier.take().map(|n| n.kind),
        Some(NotificationKind::Success)
    );

    service.toggle_complete(0)?;
    service.notifier.take();
    service.select_program("upper_lower")?;
    assert_eq!(
        service.notifier.take().map(|n| n.kind),
        Some(NotificationKind::Info)
    );
    assert!(service.schedule()?.completed()[0]);

    service.select_program("crossfit")?;
    let warning = service.notifier.take().unwrap();
    assert_eq!(warning.kind, NotificationKind::Warning);
    assert!(warning.message.contains("crossfit"));
    assert_eq!(service.selected_program().id, "ppl");
    Ok(())
}
