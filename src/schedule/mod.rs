/// Progress materialization for a calendar date
///
/// Before the day view or the state machine can operate on a date, every
/// active habit due that day must have a progress record. `ensure_progress_for`
/// creates the missing records and is safe to run any number of times.

use chrono::{Datelike, NaiveDate};

use crate::domain::{Habit, HabitProgress, HabitType, SubTask};
use crate::storage::{HabitStore, StorageError};

/// Whether a habit's frequency rule makes it due on `date`
///
/// Daily habits are always due. Weekly habits are due when the weekday is
/// selected. Monthly habits are due when the literal day-of-month is
/// selected; a configured day past the end of a shorter month never matches,
/// so there is no rollover into the next month.
pub fn due_on(habit: &Habit, date: NaiveDate) -> bool {
    match habit.frequency {
        crate::domain::Frequency::Daily => true,
        crate::domain::Frequency::Weekly => habit.days_of_week.contains(date.weekday()),
        crate::domain::Frequency::Monthly => habit.days_of_month.contains(&date.day()),
    }
}

/// Guarantee one progress record per active due habit for `date`
///
/// Idempotent: existing records are never altered, duplicate insertion is
/// absorbed by the storage uniqueness constraint on (habit_id, date), and a
/// date with zero due habits is a no-op. Returns how many records were
/// actually created.
pub fn ensure_progress_for<S: HabitStore>(
    store: &S,
    habits: &[Habit],
    date: NaiveDate,
) -> Result<usize, StorageError> {
    let mut created = 0;

    for habit in habits {
        if !habit.is_active || !due_on(habit, date) {
            continue;
        }

        let progress = HabitProgress::materialized(habit, date);
        if store.insert_progress_if_absent(&progress)? {
            created += 1;
        }

        if habit.habit_type == HabitType::Session {
            seed_session_subtasks(store, habit, date)?;
        }
    }

    if created > 0 {
        tracing::debug!("Materialized {} progress record(s) for {}", created, date);
    }

    Ok(created)
}

/// Give a session habit's progress record its default per-session checklist
/// when the user has not defined one
fn seed_session_subtasks<S: HabitStore>(
    store: &S,
    habit: &Habit,
    date: NaiveDate,
) -> Result<(), StorageError> {
    let progress = match store.progress_for(&habit.id, date)? {
        Some(progress) => progress,
        None => return Ok(()), // row vanished underneath us; nothing to seed
    };

    if !store.subtasks_for_progress(&progress.id)?.is_empty() {
        return Ok(());
    }

    let sessions = progress.target_session.unwrap_or(0);
    for number in 1..=sessions {
        store.insert_subtask(&SubTask::new(format!("Session {}", number), progress.id))?;
    }

    Ok(())
}
