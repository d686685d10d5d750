/// End-to-end tests over the service: materialization, state transitions,
/// and the backup/restore cycle against a real database in a temp directory.
use habitized::*;
use chrono::{NaiveDate, NaiveTime};
use tempfile::TempDir;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    fn open_service(dir: &TempDir) -> HabitService {
        HabitService::open(dir.path(), dir.path().join("backups")).expect("Failed to open service")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_count_habit(title: &str, target: u32) -> Habit {
        Habit::new(
            title.to_string(),
            None,
            HabitType::Count,
            None,
            date(2024, 1, 1),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "blue".to_string(),
            Some("reps".to_string()),
            Some(target),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_day_view_materializes_idempotently() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);

        let habit = daily_count_habit("Pushups", 20);
        service.add_or_update_habit(&habit).unwrap();

        let day = date(2024, 5, 6);
        let first = service.load_day(day).unwrap();
        assert_eq!(first.habits.len(), 1);
        let first_id = first.habits[0].progress.id;

        // Repeating the view never duplicates or replaces the record
        let second = service.load_day(day).unwrap();
        assert_eq!(second.habits.len(), 1);
        assert_eq!(second.habits[0].progress.id, first_id);
    }

    #[test]
    fn test_counter_drives_status_both_ways() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);

        let habit = daily_count_habit("Pushups", 20);
        service.add_or_update_habit(&habit).unwrap();
        let view = service.load_day(date(2024, 5, 6)).unwrap();
        let progress_id = view.habits[0].progress.id;

        let done = service.update_counter(&progress_id, 20).unwrap();
        assert_eq!(done.status, Status::Done);

        let undone = service.update_counter(&progress_id, 19).unwrap();
        assert_eq!(undone.status, Status::NotStarted);

        // The whole sequence is repeatable
        let done = service.update_counter(&progress_id, 20).unwrap();
        assert_eq!(done.status, Status::Done);
        let undone = service.update_counter(&progress_id, 19).unwrap();
        assert_eq!(undone.status, Status::NotStarted);
    }

    #[test]
    fn test_session_lifecycle_through_service() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);

        let habit = Habit::new(
            "Deep Work".to_string(),
            None,
            HabitType::Session,
            None,
            date(2024, 1, 1),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "green".to_string(),
            None,
            Some(2),
            NaiveTime::from_hms_opt(0, 25, 0),
        )
        .unwrap();
        service.add_or_update_habit(&habit).unwrap();

        let view = service.load_day(date(2024, 5, 6)).unwrap();
        let entry = &view.habits[0];
        // Session habits get their default per-session checklist
        assert_eq!(entry.subtasks.len(), 2);

        let progress_id = entry.progress.id;
        service.mark_started(&progress_id).unwrap();
        let after_first = service.session_completed(&progress_id).unwrap();
        assert_eq!(after_first.status, Status::NotStarted);

        service.mark_started(&progress_id).unwrap();
        let after_second = service.session_completed(&progress_id).unwrap();
        assert_eq!(after_second.status, Status::Done);
    }

    fn populate(service: &HabitService, dir: &TempDir) -> (Habit, Goal) {
        let goal = Goal::new("Get fit".to_string(), None, None, None).unwrap();
        service.add_goal(&goal).unwrap();

        let mut habit = daily_count_habit("Pushups", 20);
        habit.goal_id = Some(goal.id);
        service.add_or_update_habit(&habit).unwrap();

        let view = service.load_day(date(2024, 5, 6)).unwrap();
        service.mark_done(&view.habits[0].progress.id).unwrap();

        service
            .add_task(&OneTimeTask::new("Buy shoes".to_string(), date(2024, 5, 7), None).unwrap())
            .unwrap();

        // One image on disk plus its log row
        let image_path = dir.path().join("habit_images").join("day1.jpg");
        std::fs::write(&image_path, b"fake jpeg bytes").unwrap();
        service
            .add_image(
                &ImageProgress::new(
                    habit.id,
                    "day one".to_string(),
                    date(2024, 5, 6),
                    image_path.to_string_lossy().into_owned(),
                )
                .unwrap(),
            )
            .unwrap();

        (habit, goal)
    }

    #[test]
    fn test_backup_round_trip_preserves_everything() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        let (habit, goal) = populate(&service, &dir);

        let backup_path = service.create_backup(BackupKind::Manual).unwrap();
        let summary = service.backup_summary(&backup_path).unwrap();

        service.restore_backup(&backup_path).unwrap();

        // Counts match the summary the document advertised
        let store = service.store();
        assert_eq!(store.list_habits(false).unwrap().len(), summary.habits);
        assert_eq!(store.all_progress().unwrap().len(), summary.progress);
        assert_eq!(service.list_goals().unwrap().len(), summary.goals);
        assert_eq!(store.all_tasks().unwrap().len(), summary.tasks);
        assert_eq!(store.all_images().unwrap().len(), 1);

        // Identifiers survive bit-for-bit
        let restored_habit = service.get_habit(&habit.id).unwrap();
        assert_eq!(restored_habit.id, habit.id);
        assert_eq!(restored_habit.goal_id, Some(goal.id));
        assert_eq!(restored_habit.current_streak, 1);

        // The image file came back through the base64 payload
        let restored_images = service.images_for_habit(&habit.id).unwrap();
        assert_eq!(restored_images.len(), 1);
        let contents = std::fs::read(&restored_images[0].image_path).unwrap();
        assert_eq!(contents, b"fake jpeg bytes");
    }

    #[test]
    fn test_restore_into_fresh_store() {
        let source_dir = TempDir::new().unwrap();
        let source = open_service(&source_dir);
        let (habit, _) = populate(&source, &source_dir);
        let backup_path = source.create_backup(BackupKind::Manual).unwrap();

        let target_dir = TempDir::new().unwrap();
        let target = open_service(&target_dir);
        assert!(target.store().list_habits(false).unwrap().is_empty());

        target.restore_backup(&backup_path).unwrap();

        let restored = target.get_habit(&habit.id).unwrap();
        assert_eq!(restored.title, habit.title);

        // Image paths were rewritten into the new install's directory
        let images = target.images_for_habit(&habit.id).unwrap();
        assert!(images[0]
            .image_path
            .starts_with(target_dir.path().to_str().unwrap()));
    }

    #[test]
    fn test_newer_schema_backup_is_rejected_untouched() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        populate(&service, &dir);

        let backup_path = service.create_backup(BackupKind::Manual).unwrap();

        // Forge a snapshot from a future schema
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&backup_path).unwrap()).unwrap();
        let version = doc["metadata"]["databaseVersion"].as_i64().unwrap();
        doc["metadata"]["databaseVersion"] = serde_json::json!(version + 1);
        let forged_path = dir.path().join("forged.json");
        std::fs::write(&forged_path, serde_json::to_string(&doc).unwrap()).unwrap();

        let habits_before = service.store().list_habits(false).unwrap().len();
        let progress_before = service.store().all_progress().unwrap().len();

        let result = service.restore_backup(&forged_path);
        assert!(matches!(
            result,
            Err(ServiceError::Backup(BackupError::Compatibility { .. }))
        ));

        // Nothing was deleted or replaced
        assert_eq!(service.store().list_habits(false).unwrap().len(), habits_before);
        assert_eq!(service.store().all_progress().unwrap().len(), progress_before);
    }

    #[test]
    fn test_malformed_backup_is_rejected_untouched() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);
        populate(&service, &dir);

        let bad_path = dir.path().join("bad.json");
        std::fs::write(&bad_path, "{ this is not json").unwrap();

        let result = service.restore_backup(&bad_path);
        assert!(matches!(
            result,
            Err(ServiceError::Backup(BackupError::Format(_)))
        ));

        assert_eq!(service.store().list_habits(false).unwrap().len(), 1);
    }

    #[test]
    fn test_backup_listing_and_deletion() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);

        // An empty dataset is still a valid backup
        service.create_backup(BackupKind::Manual).unwrap();

        let backups = service.list_backups();
        assert_eq!(backups.len(), 1);

        service.delete_backup(&backups[0].file_name).unwrap();
        assert!(service.list_backups().is_empty());
    }

    #[test]
    fn test_streaks_accumulate_across_days() {
        let dir = TempDir::new().unwrap();
        let service = open_service(&dir);

        let habit = daily_count_habit("Meditate", 1);
        service.add_or_update_habit(&habit).unwrap();

        // Complete three consecutive (past) due days
        for day in 4..=6 {
            let view = service.load_day(date(2024, 5, day)).unwrap();
            service.mark_done(&view.habits[0].progress.id).unwrap();
        }

        let habit = service.get_habit(&habit.id).unwrap();
        assert_eq!(habit.current_streak, 3);
        assert_eq!(habit.max_streak, 3);

        // Skipping the next day resets the current streak but not the max
        let view = service.load_day(date(2024, 5, 7)).unwrap();
        service.mark_skipped(&view.habits[0].progress.id).unwrap();

        let habit = service.get_habit(&habit.id).unwrap();
        assert_eq!(habit.current_streak, 0);
        assert_eq!(habit.max_streak, 3);
    }
}
