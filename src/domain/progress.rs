/// HabitProgress and SubTask entities
///
/// A HabitProgress is one calendar-day instance of a habit's due occurrence.
/// It is created by the materializer with targets copied from the habit, and
/// from then on mutated exclusively by the tracker's state machine. SubTasks
/// are checklist items scoped to one progress record (Session habits).

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};

use crate::domain::{Habit, HabitId, HabitType, ProgressId, Status, SubTaskId};

/// One calendar-day progress record of a habit
///
/// `habit_type` and `count_param` are denormalized copies taken at
/// materialization time so historical records stay stable when the habit
/// definition later changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitProgress {
    /// Unique identifier for this record
    pub id: ProgressId,
    /// The habit this record belongs to
    pub habit_id: HabitId,
    /// The calendar day this record covers; unique per (habit_id, date)
    pub date: NaiveDate,
    /// Habit type at materialization time
    pub habit_type: HabitType,
    /// Count unit at materialization time
    pub count_param: Option<String>,
    /// Counter value for Count habits
    pub current_count: Option<u32>,
    /// Counter target for Count habits
    pub target_count: Option<u32>,
    /// Timer target for Duration habits; per-session duration for Session habits
    pub target_duration: Option<NaiveTime>,
    /// Sessions completed so far (Session habits)
    pub current_session: Option<u32>,
    /// Sessions required (Session habits)
    pub target_session: Option<u32>,
    /// Lifecycle status
    pub status: Status,
    /// Free-text notes
    pub notes: Option<String>,
    /// Free-text excuse recorded when skipping
    pub excuse: Option<String>,
}

impl HabitProgress {
    /// Materialize a fresh NotStarted record for a habit due on `date`,
    /// copying the habit's current target configuration
    pub fn materialized(habit: &Habit, date: NaiveDate) -> Self {
        let (current_count, target_count) = match habit.habit_type {
            HabitType::Count => (Some(0), habit.count_target),
            _ => (None, None),
        };
        let (current_session, target_session) = match habit.habit_type {
            HabitType::Session => (Some(0), habit.count_target),
            _ => (None, None),
        };
        let target_duration = match habit.habit_type {
            HabitType::Duration | HabitType::Session => habit.duration,
            _ => None,
        };

        Self {
            id: ProgressId::new(),
            habit_id: habit.id,
            date,
            habit_type: habit.habit_type,
            count_param: habit.count_param.clone(),
            current_count,
            target_count,
            target_duration,
            current_session,
            target_session,
            status: Status::NotStarted,
            notes: None,
            excuse: None,
        }
    }

    /// Create a progress record from already-validated data (used when
    /// loading from the database or a backup document)
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: ProgressId,
        habit_id: HabitId,
        date: NaiveDate,
        habit_type: HabitType,
        count_param: Option<String>,
        current_count: Option<u32>,
        target_count: Option<u32>,
        target_duration: Option<NaiveTime>,
        current_session: Option<u32>,
        target_session: Option<u32>,
        status: Status,
        notes: Option<String>,
        excuse: Option<String>,
    ) -> Self {
        Self {
            id,
            habit_id,
            date,
            habit_type,
            count_param,
            current_count,
            target_count,
            target_duration,
            current_session,
            target_session,
            status,
            notes,
            excuse,
        }
    }
}

/// A checklist item scoped to one progress record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: SubTaskId,
    pub title: String,
    pub is_completed: bool,
    /// The progress record this item belongs to
    pub progress_id: ProgressId,
}

impl SubTask {
    pub fn new(title: String, progress_id: ProgressId) -> Self {
        Self {
            id: SubTaskId::new(),
            title,
            is_completed: false,
            progress_id,
        }
    }

    pub fn from_existing(
        id: SubTaskId,
        title: String,
        is_completed: bool,
        progress_id: ProgressId,
    ) -> Self {
        Self {
            id,
            title,
            is_completed,
            progress_id,
        }
    }
}

/// A habit joined with its progress record for one day, plus the record's
/// subtasks; the read model the day view hands to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitWithProgress {
    pub habit: Habit,
    pub progress: HabitProgress,
    pub subtasks: Vec<SubTask>,
}
