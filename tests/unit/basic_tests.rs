/// Basic unit tests to verify core functionality
use habitized::*;
use chrono::NaiveDate;
use tempfile::TempDir;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_habit_creation() {
        let habit = Habit::new(
            "Test Habit".to_string(),
            Some("A test habit".to_string()),
            HabitType::OneTime,
            None,
            start_date(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "blue".to_string(),
            None,
            None,
            None,
        );

        assert!(habit.is_ok());
        let habit = habit.unwrap();
        assert_eq!(habit.title, "Test Habit");
        assert!(habit.is_active);
    }

    #[test]
    fn test_invalid_habit_rejected() {
        // A Count habit without its target is inconsistent
        let result = Habit::new(
            "Test Habit".to_string(),
            None,
            HabitType::Count,
            None,
            start_date(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "blue".to_string(),
            None,
            None,
            None,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_progress_materialization() {
        let habit = Habit::new(
            "Drink Water".to_string(),
            None,
            HabitType::Count,
            None,
            start_date(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "blue".to_string(),
            Some("glasses".to_string()),
            Some(8),
            None,
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let progress = HabitProgress::materialized(&habit, date);
        assert_eq!(progress.status, Status::NotStarted);
        assert_eq!(progress.target_count, Some(8));
    }

    #[test]
    fn test_enum_text_is_strict() {
        assert!(Status::parse("Done").is_ok());
        assert!(Status::parse("done").is_err());
        assert!(HabitType::parse("Weekly").is_err());
        assert!(Frequency::parse("Weekly").is_ok());
    }

    #[test]
    fn test_storage_creation() {
        let storage = SqliteStore::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_service_creation() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let service = HabitService::open(dir.path(), dir.path().join("backups"));
        assert!(service.is_ok());
    }

    #[test]
    fn test_service_persistence_across_reopen() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let habit_id;

        {
            let service = HabitService::open(dir.path(), dir.path().join("backups")).unwrap();
            let habit = Habit::new(
                "Persisted".to_string(),
                None,
                HabitType::OneTime,
                None,
                start_date(),
                Frequency::Daily,
                WeekdaySet::empty(),
                vec![],
                None,
                "red".to_string(),
                None,
                None,
                None,
            )
            .unwrap();
            habit_id = habit.id;
            service.add_or_update_habit(&habit).unwrap();
        }

        let service = HabitService::open(dir.path(), dir.path().join("backups")).unwrap();
        let loaded = service.get_habit(&habit_id).unwrap();
        assert_eq!(loaded.title, "Persisted");
    }
}
