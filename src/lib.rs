/// Public library interface for the Habitized core
///
/// This crate implements the habit scheduling and progress state-machine
/// subsystem: materializing per-day progress records, driving their
/// lifecycle, maintaining streak counters, and backing the whole dataset
/// up into portable documents. The UI layer consumes `HabitService` and
/// the read models it returns.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use thiserror::Error;

// Internal modules
pub mod analytics;
pub mod backup;
pub mod domain;
pub mod preferences;
pub mod schedule;
pub mod storage;
pub mod tracker;

// Re-export the types callers interact with
pub use analytics::StreakSummary;
pub use backup::{
    BackupError, BackupFileInfo, BackupKind, BackupManager, BackupSummary, DailyBackupWorker,
    ImageStore,
};
pub use domain::*;
pub use preferences::{Preferences, PreferencesStore};
pub use storage::{HabitStore, SqliteStore, StorageError};

/// Errors that can occur during service operation
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Backup error: {0}")]
    Backup(#[from] backup::BackupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the day view needs: habits due on the date joined with their
/// progress records, plus the date's one-time tasks
#[derive(Debug, Clone)]
pub struct DayView {
    pub date: NaiveDate,
    pub habits: Vec<HabitWithProgress>,
    pub tasks: Vec<OneTimeTask>,
}

/// Main service wiring the store, preferences, image directory and backup
/// coordinator together
///
/// Constructed once at startup and handed to callers by reference; all
/// components receive the storage handle explicitly instead of reaching
/// for a global instance.
pub struct HabitService {
    store: Arc<SqliteStore>,
    images: ImageStore,
    prefs: PreferencesStore,
    backup: Arc<BackupManager<SqliteStore>>,
}

impl HabitService {
    /// Open (or create) the database, image directory and preferences file
    /// under `data_dir`; backup documents go to `backup_dir`
    pub fn open(data_dir: &Path, backup_dir: PathBuf) -> Result<Self, ServiceError> {
        std::fs::create_dir_all(data_dir)?;

        let store = Arc::new(SqliteStore::open(data_dir.join("habitized.db"))?);
        let images = ImageStore::open(data_dir)?;
        let prefs = PreferencesStore::open(data_dir);
        let backup = Arc::new(BackupManager::new(
            Arc::clone(&store),
            images.clone(),
            backup_dir,
            prefs.clone(),
        ));

        tracing::info!("Habitized service initialized at {:?}", data_dir);

        Ok(Self {
            store,
            images,
            prefs,
            backup,
        })
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs.load()
    }

    // Day view

    /// Materialize progress records for every active habit due on `date`,
    /// then return the date's habits and one-time tasks
    pub fn load_day(&self, date: NaiveDate) -> Result<DayView, ServiceError> {
        let active = self.store.list_habits(true)?;
        schedule::ensure_progress_for(self.store.as_ref(), &active, date)?;

        Ok(DayView {
            date,
            habits: self.store.habits_for_day(date)?,
            tasks: self.store.tasks_for_day(date)?,
        })
    }

    /// Today's view using the local calendar date
    pub fn load_today(&self) -> Result<DayView, ServiceError> {
        self.load_day(Local::now().date_naive())
    }

    // Habit and goal management

    pub fn add_or_update_habit(&self, habit: &Habit) -> Result<(), ServiceError> {
        Ok(self.store.upsert_habit(habit)?)
    }

    pub fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, ServiceError> {
        Ok(self.store.get_habit(habit_id)?)
    }

    pub fn delete_habit(&self, habit_id: &HabitId) -> Result<(), ServiceError> {
        // Remove the habit's image files before the rows cascade away
        for image in self.store.images_for_habit(habit_id)? {
            self.images.delete_file(&image.image_path);
        }
        Ok(self.store.delete_habit(habit_id)?)
    }

    pub fn add_goal(&self, goal: &Goal) -> Result<(), ServiceError> {
        Ok(self.store.insert_goal(goal)?)
    }

    pub fn update_goal(&self, goal: &Goal) -> Result<(), ServiceError> {
        Ok(self.store.update_goal(goal)?)
    }

    pub fn delete_goal(&self, goal_id: &GoalId) -> Result<(), ServiceError> {
        Ok(self.store.delete_goal(goal_id)?)
    }

    pub fn list_goals(&self) -> Result<Vec<Goal>, ServiceError> {
        Ok(self.store.list_goals()?)
    }

    // Progress state machine commands

    pub fn mark_done(&self, progress_id: &ProgressId) -> Result<HabitProgress, ServiceError> {
        Ok(tracker::on_done(self.store.as_ref(), progress_id)?)
    }

    pub fn mark_skipped(&self, progress_id: &ProgressId) -> Result<HabitProgress, ServiceError> {
        Ok(tracker::on_skip(self.store.as_ref(), progress_id)?)
    }

    pub fn mark_not_started(
        &self,
        progress_id: &ProgressId,
    ) -> Result<HabitProgress, ServiceError> {
        Ok(tracker::on_not_started(self.store.as_ref(), progress_id)?)
    }

    pub fn mark_started(&self, progress_id: &ProgressId) -> Result<HabitProgress, ServiceError> {
        Ok(tracker::on_started(self.store.as_ref(), progress_id)?)
    }

    pub fn update_counter(
        &self,
        progress_id: &ProgressId,
        count: u32,
    ) -> Result<HabitProgress, ServiceError> {
        Ok(tracker::on_update_counter(
            self.store.as_ref(),
            progress_id,
            count,
        )?)
    }

    pub fn timer_elapsed(&self, progress_id: &ProgressId) -> Result<HabitProgress, ServiceError> {
        Ok(tracker::on_timer_elapsed(self.store.as_ref(), progress_id)?)
    }

    pub fn session_completed(
        &self,
        progress_id: &ProgressId,
    ) -> Result<HabitProgress, ServiceError> {
        Ok(tracker::on_session_completed(self.store.as_ref(), progress_id)?)
    }

    // Subtasks and one-time tasks

    pub fn add_or_update_subtask(&self, subtask: &SubTask) -> Result<(), ServiceError> {
        Ok(self.store.insert_subtask(subtask)?)
    }

    pub fn toggle_subtask(&self, subtask_id: &SubTaskId) -> Result<(), ServiceError> {
        Ok(self.store.toggle_subtask(subtask_id)?)
    }

    pub fn delete_subtask(&self, subtask_id: &SubTaskId) -> Result<(), ServiceError> {
        Ok(self.store.delete_subtask(subtask_id)?)
    }

    pub fn add_task(&self, task: &OneTimeTask) -> Result<(), ServiceError> {
        Ok(self.store.insert_task(task)?)
    }

    pub fn update_task(&self, task: &OneTimeTask) -> Result<(), ServiceError> {
        Ok(self.store.update_task(task)?)
    }

    pub fn delete_task(&self, task_id: &TaskId) -> Result<(), ServiceError> {
        Ok(self.store.delete_task(task_id)?)
    }

    // Image logs

    pub fn add_image(&self, image: &ImageProgress) -> Result<(), ServiceError> {
        Ok(self.store.insert_image(image)?)
    }

    pub fn images_for_habit(&self, habit_id: &HabitId) -> Result<Vec<ImageProgress>, ServiceError> {
        Ok(self.store.images_for_habit(habit_id)?)
    }

    /// Remove an image log entry: the database row and the file behind it
    pub fn delete_image(&self, image: &ImageProgress) -> Result<(), ServiceError> {
        self.store.delete_image(&image.id)?;
        self.images.delete_file(&image.image_path);
        Ok(())
    }

    // Backup and restore

    pub fn create_backup(&self, kind: BackupKind) -> Result<PathBuf, ServiceError> {
        Ok(self.backup.create_backup(kind)?)
    }

    pub fn restore_backup(&self, path: &Path) -> Result<(), ServiceError> {
        Ok(self.backup.restore_backup(path)?)
    }

    pub fn list_backups(&self) -> Vec<BackupFileInfo> {
        self.backup.list_available_backups()
    }

    pub fn delete_backup(&self, file_name: &str) -> Result<(), ServiceError> {
        Ok(self.backup.delete_backup(file_name)?)
    }

    pub fn backup_summary(&self, path: &Path) -> Result<BackupSummary, ServiceError> {
        Ok(self.backup.backup_summary(path)?)
    }

    pub fn set_auto_backup(&self, enabled: bool) -> Result<Preferences, ServiceError> {
        Ok(self.prefs.update(|p| p.auto_backup_enabled = enabled)?)
    }

    /// The periodic worker behind `habitized worker`; runs until dropped
    pub fn backup_worker(&self) -> DailyBackupWorker<SqliteStore> {
        DailyBackupWorker::new(Arc::clone(&self.backup))
    }
}
