/// Progress state machine command handlers
///
/// One handler per user/timer action on a progress record. Each handler is an
/// atomic read-modify-write against the store, and every handler that changes
/// the record's status invokes the streak engine as an explicit synchronous
/// post-transition step, writing the recomputed counters back to the habit.
///
/// All transitions are total over the four statuses; the only failure mode is
/// operating on an unknown progress id, which surfaces as a NotFound result.

use chrono::Local;

use crate::analytics;
use crate::domain::{HabitProgress, ProgressId, Status};
use crate::storage::{HabitStore, StorageError};

/// Mark the record Done, from any prior status
pub fn on_done<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
) -> Result<HabitProgress, StorageError> {
    set_status(store, progress_id, Status::Done)
}

/// Mark the record Skipped; skips break streaks
pub fn on_skip<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
) -> Result<HabitProgress, StorageError> {
    set_status(store, progress_id, Status::Skipped)
}

/// Reset the record to NotStarted, undoing a prior Done or Skipped marking
pub fn on_not_started<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
) -> Result<HabitProgress, StorageError> {
    set_status(store, progress_id, Status::NotStarted)
}

/// Mark the record Ongoing when a duration/session timer begins
///
/// Starting a timer is not a completion event, so no streak recompute here.
pub fn on_started<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
) -> Result<HabitProgress, StorageError> {
    let mut progress = store.get_progress(progress_id)?;
    progress.status = Status::Ongoing;
    store.update_progress(&progress)?;
    Ok(progress)
}

/// Set the counter of a Count record
///
/// Reaching the target completes the record. Editing the counter back below
/// the target un-does a prior completion or skip by returning the record to
/// NotStarted; a record that was already NotStarted just keeps its status.
pub fn on_update_counter<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
    new_count: u32,
) -> Result<HabitProgress, StorageError> {
    let mut progress = store.get_progress(progress_id)?;
    let previous_status = progress.status;

    progress.current_count = Some(new_count);
    // Below target the record is NotStarted either way: a prior Done or
    // Skipped is undone, an untouched record keeps its status.
    progress.status = match progress.target_count {
        Some(target) if new_count >= target => Status::Done,
        _ => Status::NotStarted,
    };

    store.update_progress(&progress)?;

    if progress.status != previous_status {
        recompute_streaks(store, &progress)?;
    }

    tracing::debug!(
        "Counter on {} set to {} ({:?} -> {:?})",
        progress_id,
        new_count,
        previous_status,
        progress.status
    );
    Ok(progress)
}

/// A Duration habit's timer ran to completion
pub fn on_timer_elapsed<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
) -> Result<HabitProgress, StorageError> {
    on_done(store, progress_id)
}

/// A Session habit finished one session
///
/// The session counter advances; hitting the session target completes the
/// record, otherwise it returns to NotStarted ready for the next session.
/// A record is never left Ongoing after a session completes.
pub fn on_session_completed<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
) -> Result<HabitProgress, StorageError> {
    let mut progress = store.get_progress(progress_id)?;

    let completed = progress.current_session.unwrap_or(0) + 1;
    progress.current_session = Some(completed);
    store.update_progress(&progress)?;

    if progress.target_session == Some(completed) {
        on_done(store, progress_id)
    } else {
        on_not_started(store, progress_id)
    }
}

/// Apply a status and run the streak recompute post-step
fn set_status<S: HabitStore>(
    store: &S,
    progress_id: &ProgressId,
    status: Status,
) -> Result<HabitProgress, StorageError> {
    let mut progress = store.get_progress(progress_id)?;
    progress.status = status;
    store.update_progress(&progress)?;

    recompute_streaks(store, &progress)?;

    tracing::debug!("Progress {} -> {:?}", progress_id, status);
    Ok(progress)
}

/// Named post-transition step: rebuild the owning habit's cached streak
/// counters from its full progress history
fn recompute_streaks<S: HabitStore>(
    store: &S,
    progress: &HabitProgress,
) -> Result<(), StorageError> {
    let mut habit = store.get_habit(&progress.habit_id)?;
    let rows = store.all_progress_for_habit(&progress.habit_id)?;

    let summary = analytics::recompute(&habit, &rows, Local::now().date_naive());
    habit.current_streak = summary.current_streak;
    habit.max_streak = summary.max_streak;

    store.upsert_habit(&habit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, Habit, HabitType, WeekdaySet};
    use crate::storage::SqliteStore;
    use chrono::{Local, NaiveDate, NaiveTime};

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn count_habit(store: &SqliteStore, target: u32) -> (Habit, HabitProgress) {
        let habit = Habit::new(
            "Drink Water".to_string(),
            None,
            HabitType::Count,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "blue".to_string(),
            Some("glasses".to_string()),
            Some(target),
            None,
        )
        .unwrap();
        store.upsert_habit(&habit).unwrap();

        let progress = HabitProgress::materialized(&habit, Local::now().date_naive());
        store.insert_progress_if_absent(&progress).unwrap();
        (habit, progress)
    }

    fn session_habit(store: &SqliteStore, sessions: u32) -> (Habit, HabitProgress) {
        let habit = Habit::new(
            "Deep Work".to_string(),
            None,
            HabitType::Session,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "green".to_string(),
            None,
            Some(sessions),
            NaiveTime::from_hms_opt(0, 25, 0),
        )
        .unwrap();
        store.upsert_habit(&habit).unwrap();

        let progress = HabitProgress::materialized(&habit, Local::now().date_naive());
        store.insert_progress_if_absent(&progress).unwrap();
        (habit, progress)
    }

    #[test]
    fn test_done_skip_reset_cycle() {
        let store = store();
        let (_, progress) = count_habit(&store, 8);

        let done = on_done(&store, &progress.id).unwrap();
        assert_eq!(done.status, Status::Done);

        let skipped = on_skip(&store, &progress.id).unwrap();
        assert_eq!(skipped.status, Status::Skipped);

        let reset = on_not_started(&store, &progress.id).unwrap();
        assert_eq!(reset.status, Status::NotStarted);
    }

    #[test]
    fn test_done_updates_habit_streak() {
        let store = store();
        let (habit, progress) = count_habit(&store, 8);

        on_done(&store, &progress.id).unwrap();

        let habit = store.get_habit(&habit.id).unwrap();
        assert_eq!(habit.current_streak, 1);
        assert_eq!(habit.max_streak, 1);
    }

    #[test]
    fn test_started_does_not_touch_streaks() {
        let store = store();
        let (habit, progress) = session_habit(&store, 2);

        let ongoing = on_started(&store, &progress.id).unwrap();
        assert_eq!(ongoing.status, Status::Ongoing);

        let habit = store.get_habit(&habit.id).unwrap();
        assert_eq!(habit.current_streak, 0);
    }

    #[test]
    fn test_counter_reaching_target_completes() {
        let store = store();
        let (_, progress) = count_habit(&store, 8);

        let updated = on_update_counter(&store, &progress.id, 8).unwrap();
        assert_eq!(updated.status, Status::Done);
        assert_eq!(updated.current_count, Some(8));
    }

    #[test]
    fn test_counter_below_target_undoes_completion() {
        let store = store();
        let (_, progress) = count_habit(&store, 8);

        on_update_counter(&store, &progress.id, 8).unwrap();
        let updated = on_update_counter(&store, &progress.id, 7).unwrap();
        assert_eq!(updated.status, Status::NotStarted);
        assert_eq!(updated.current_count, Some(7));
    }

    #[test]
    fn test_counter_round_trip_is_repeatable() {
        let store = store();
        let (_, progress) = count_habit(&store, 8);

        for _ in 0..2 {
            let done = on_update_counter(&store, &progress.id, 8).unwrap();
            assert_eq!(done.status, Status::Done);

            let undone = on_update_counter(&store, &progress.id, 7).unwrap();
            assert_eq!(undone.status, Status::NotStarted);
        }
    }

    #[test]
    fn test_counter_edit_below_target_keeps_not_started() {
        let store = store();
        let (_, progress) = count_habit(&store, 8);

        let updated = on_update_counter(&store, &progress.id, 3).unwrap();
        assert_eq!(updated.status, Status::NotStarted);

        let updated = on_update_counter(&store, &progress.id, 5).unwrap();
        assert_eq!(updated.status, Status::NotStarted);
    }

    #[test]
    fn test_session_completion_advances_and_finishes() {
        let store = store();
        let (_, progress) = session_habit(&store, 2);

        on_started(&store, &progress.id).unwrap();
        let after_first = on_session_completed(&store, &progress.id).unwrap();
        assert_eq!(after_first.status, Status::NotStarted);
        assert_eq!(after_first.current_session, Some(1));

        on_started(&store, &progress.id).unwrap();
        let after_second = on_session_completed(&store, &progress.id).unwrap();
        assert_eq!(after_second.status, Status::Done);
        assert_eq!(after_second.current_session, Some(2));
    }

    #[test]
    fn test_timer_elapsed_completes_duration_record() {
        let store = store();
        let habit = Habit::new(
            "Stretch".to_string(),
            None,
            HabitType::Duration,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "red".to_string(),
            None,
            None,
            NaiveTime::from_hms_opt(0, 10, 0),
        )
        .unwrap();
        store.upsert_habit(&habit).unwrap();
        let progress = HabitProgress::materialized(&habit, Local::now().date_naive());
        store.insert_progress_if_absent(&progress).unwrap();

        on_started(&store, &progress.id).unwrap();
        let done = on_timer_elapsed(&store, &progress.id).unwrap();
        assert_eq!(done.status, Status::Done);
    }

    #[test]
    fn test_unknown_progress_id_is_not_found() {
        let store = store();
        let result = on_done(&store, &ProgressId::new());
        assert!(matches!(
            result,
            Err(StorageError::ProgressNotFound { .. })
        ));
    }
}
