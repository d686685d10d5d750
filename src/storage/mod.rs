/// Storage layer for persisting habit data
///
/// This module defines the repository contract the core is written against
/// and its SQLite implementation. The store handle is constructed explicitly
/// and passed to every component; there is no ambient global instance.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{
    Goal, GoalId, Habit, HabitId, HabitProgress, HabitWithProgress, ImageProgress,
    ImageProgressId, OneTimeTask, ProgressId, SubTask, SubTaskId, TaskId,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Stored value error: {0}")]
    Corrupt(#[from] crate::domain::DomainError),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Progress record not found: {progress_id}")]
    ProgressNotFound { progress_id: String },

    #[error("Goal not found: {goal_id}")]
    GoalNotFound { goal_id: String },

    #[error("Subtask not found: {subtask_id}")]
    SubTaskNotFound { subtask_id: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Image log not found: {image_id}")]
    ImageNotFound { image_id: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Repository contract consumed by the core
///
/// Implemented by `SqliteStore`; narrow enough that an alternative engine
/// could be swapped in without touching the scheduling or tracking logic.
/// All mutations are atomic read-modify-writes against a single-writer
/// store, which is what serializes concurrent transitions on one record.
pub trait HabitStore {
    // Habits

    /// Insert a habit, or update it in place if the id already exists
    fn upsert_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// Delete a habit; cascades to its progress records, their subtasks,
    /// and the habit's image logs
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>, StorageError>;

    // Goals

    fn insert_goal(&self, goal: &Goal) -> Result<(), StorageError>;

    fn update_goal(&self, goal: &Goal) -> Result<(), StorageError>;

    fn get_goal(&self, goal_id: &GoalId) -> Result<Goal, StorageError>;

    fn list_goals(&self) -> Result<Vec<Goal>, StorageError>;

    /// Delete a goal; its habits stay and become un-grouped
    fn delete_goal(&self, goal_id: &GoalId) -> Result<(), StorageError>;

    // Progress records

    /// Insert a progress record unless one already exists for the same
    /// (habit_id, date); returns whether a row was actually inserted.
    /// A uniqueness-constraint hit is a benign no-op, not an error.
    fn insert_progress_if_absent(&self, progress: &HabitProgress) -> Result<bool, StorageError>;

    fn get_progress(&self, progress_id: &ProgressId) -> Result<HabitProgress, StorageError>;

    fn progress_for(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<Option<HabitProgress>, StorageError>;

    fn all_progress_for_habit(
        &self,
        habit_id: &HabitId,
    ) -> Result<Vec<HabitProgress>, StorageError>;

    fn update_progress(&self, progress: &HabitProgress) -> Result<(), StorageError>;

    /// Habits joined with their progress record for one day, subtasks
    /// included; assumes the materializer already ran for that date
    fn habits_for_day(&self, date: NaiveDate) -> Result<Vec<HabitWithProgress>, StorageError>;

    // Subtasks

    fn insert_subtask(&self, subtask: &SubTask) -> Result<(), StorageError>;

    fn update_subtask(&self, subtask: &SubTask) -> Result<(), StorageError>;

    fn toggle_subtask(&self, subtask_id: &SubTaskId) -> Result<(), StorageError>;

    fn delete_subtask(&self, subtask_id: &SubTaskId) -> Result<(), StorageError>;

    fn subtasks_for_progress(
        &self,
        progress_id: &ProgressId,
    ) -> Result<Vec<SubTask>, StorageError>;

    // One-time tasks

    fn insert_task(&self, task: &OneTimeTask) -> Result<(), StorageError>;

    fn update_task(&self, task: &OneTimeTask) -> Result<(), StorageError>;

    fn delete_task(&self, task_id: &TaskId) -> Result<(), StorageError>;

    fn tasks_for_day(&self, date: NaiveDate) -> Result<Vec<OneTimeTask>, StorageError>;

    // Image logs

    fn insert_image(&self, image: &ImageProgress) -> Result<(), StorageError>;

    fn images_for_habit(&self, habit_id: &HabitId) -> Result<Vec<ImageProgress>, StorageError>;

    fn delete_image(&self, image_id: &ImageProgressId) -> Result<(), StorageError>;

    // Whole-table reads and deletes for the backup coordinator

    fn all_progress(&self) -> Result<Vec<HabitProgress>, StorageError>;

    fn all_subtasks(&self) -> Result<Vec<SubTask>, StorageError>;

    fn all_tasks(&self) -> Result<Vec<OneTimeTask>, StorageError>;

    fn all_images(&self) -> Result<Vec<ImageProgress>, StorageError>;

    fn delete_all_subtasks(&self) -> Result<(), StorageError>;

    fn delete_all_images(&self) -> Result<(), StorageError>;

    fn delete_all_progress(&self) -> Result<(), StorageError>;

    fn delete_all_habits(&self) -> Result<(), StorageError>;

    fn delete_all_goals(&self) -> Result<(), StorageError>;

    fn delete_all_tasks(&self) -> Result<(), StorageError>;
}
