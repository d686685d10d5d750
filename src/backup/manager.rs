/// Backup/restore coordinator
///
/// Produces the portable snapshot document from the full entity set and
/// consumes such documents, enforcing referential insert order and schema
/// version compatibility. Restore deliberately mirrors the mobile app's
/// sequence: clear everything, then insert table by table; failures after
/// clearing began surface as PartialRestore, not as a rollback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::backup::document::{
    BackupDocument, BackupMetadata, BackupPreferences, GoalRecord, HabitProgressRecord,
    HabitRecord, ImageProgressRecord, OneTimeTaskRecord, SubTaskRecord,
};
use crate::backup::{BackupError, ImageStore};
use crate::preferences::PreferencesStore;
use crate::storage::{migrations, HabitStore};

const BACKUP_FILE_PREFIX: &str = "habitized_backup_";
const BACKUP_FILE_EXTENSION: &str = ".json";

/// Whether a snapshot was requested by the user or the daily worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Manual,
    Automatic,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Manual => "manual",
            BackupKind::Automatic => "automatic",
        }
    }
}

/// A backup document found in the backup directory
#[derive(Debug, Clone)]
pub struct BackupFileInfo {
    pub file_name: String,
    /// File name with the fixed prefix/extension stripped
    pub display_name: String,
    /// Last-modified time, human formatted
    pub modified: String,
    pub size_bytes: u64,
    pub size_display: String,
    pub path: PathBuf,
}

/// Row counts a restore of the document would produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupSummary {
    pub habits: usize,
    pub progress: usize,
    pub goals: usize,
    pub subtasks: usize,
    pub tasks: usize,
    pub images: usize,
}

/// Coordinates snapshot creation and restore over the store, the image
/// directory and the preferences file
pub struct BackupManager<S> {
    store: Arc<S>,
    images: ImageStore,
    backup_dir: PathBuf,
    prefs: PreferencesStore,
}

impl<S: HabitStore> BackupManager<S> {
    pub fn new(
        store: Arc<S>,
        images: ImageStore,
        backup_dir: PathBuf,
        prefs: PreferencesStore,
    ) -> Self {
        Self {
            store,
            images,
            backup_dir,
            prefs,
        }
    }

    pub fn preferences_store(&self) -> &PreferencesStore {
        &self.prefs
    }

    /// Snapshot every entity table plus referenced images into a new
    /// document in the backup directory; returns the written path.
    /// An empty dataset is a valid (small) backup.
    pub fn create_backup(&self, kind: BackupKind) -> Result<PathBuf, BackupError> {
        let document = self.build_document(kind)?;

        let json = serde_json::to_string_pretty(&document)?;
        std::fs::create_dir_all(&self.backup_dir)?;

        let file_name = format!(
            "{}{}{}",
            BACKUP_FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            BACKUP_FILE_EXTENSION
        );
        let path = self.backup_dir.join(&file_name);
        std::fs::write(&path, json)?;

        if let Err(e) = self.prefs.update(|p| {
            p.last_backup_at = Some(document.metadata.backup_timestamp.clone());
        }) {
            tracing::warn!("Could not record last backup time: {}", e);
        }

        tracing::info!("Created {} backup: {}", kind.as_str(), file_name);
        Ok(path)
    }

    fn build_document(&self, kind: BackupKind) -> Result<BackupDocument, BackupError> {
        let habits: Vec<_> = self
            .store
            .list_habits(false)?
            .iter()
            .map(HabitRecord::from_entity)
            .collect();
        let habit_progress: Vec<_> = self
            .store
            .all_progress()?
            .iter()
            .map(HabitProgressRecord::from_entity)
            .collect();
        let goals: Vec<_> = self
            .store
            .list_goals()?
            .iter()
            .map(GoalRecord::from_entity)
            .collect();
        let subtasks: Vec<_> = self
            .store
            .all_subtasks()?
            .iter()
            .map(SubTaskRecord::from_entity)
            .collect();
        let image_rows = self.store.all_images()?;
        let image_progress: Vec<_> = image_rows.iter().map(ImageProgressRecord::from_entity).collect();
        let one_time_tasks: Vec<_> = self
            .store
            .all_tasks()?
            .iter()
            .map(OneTimeTaskRecord::from_entity)
            .collect();

        let images = self.images.encode_all(&image_rows);

        let prefs = self.prefs.load();
        let preferences = BackupPreferences {
            theme: prefs.theme,
            intro_shown: prefs.intro_shown,
            auto_backup_enabled: prefs.auto_backup_enabled,
        };

        let metadata = BackupMetadata {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            app_version_code: version_code(env!("CARGO_PKG_VERSION")),
            database_version: migrations::CURRENT_VERSION,
            backup_timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            backup_type: kind.as_str().to_string(),
            device_model: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            android_version: 0,
        };

        Ok(BackupDocument {
            metadata,
            habits,
            habit_progress,
            goals,
            subtasks,
            image_progress,
            one_time_tasks,
            preferences,
            images,
        })
    }

    /// Replace the entire dataset with the document's contents
    ///
    /// Parsing and validation happen before anything is touched; a document
    /// from a newer schema is refused outright. From the first delete
    /// onward, any failure is reported as PartialRestore naming the step.
    pub fn restore_backup(&self, path: &Path) -> Result<(), BackupError> {
        let contents = std::fs::read_to_string(path)?;
        let document: BackupDocument = serde_json::from_str(&contents)
            .map_err(|e| BackupError::Format(format!("Unparseable backup document: {}", e)))?;

        self.validate(&document.metadata)?;

        // Convert every record up front so malformed values are caught
        // while the existing data is still intact
        let goals = document
            .goals
            .iter()
            .map(GoalRecord::to_entity)
            .collect::<Result<Vec<_>, _>>()?;
        let habits = document
            .habits
            .iter()
            .map(HabitRecord::to_entity)
            .collect::<Result<Vec<_>, _>>()?;
        let progress = document
            .habit_progress
            .iter()
            .map(HabitProgressRecord::to_entity)
            .collect::<Result<Vec<_>, _>>()?;
        let subtasks = document
            .subtasks
            .iter()
            .map(SubTaskRecord::to_entity)
            .collect::<Result<Vec<_>, _>>()?;
        let mut images = document
            .image_progress
            .iter()
            .map(ImageProgressRecord::to_entity)
            .collect::<Result<Vec<_>, _>>()?;
        let tasks = document
            .one_time_tasks
            .iter()
            .map(OneTimeTaskRecord::to_entity)
            .collect::<Result<Vec<_>, _>>()?;

        // Image paths from another install are meaningless here; point the
        // rows into this install's image directory
        for image in &mut images {
            if let Some(file_name) = image.file_name() {
                image.image_path = self.images.local_path(&file_name).to_string_lossy().into_owned();
            }
        }

        // Clear existing data, children before parents
        step("clear subtasks", self.store.delete_all_subtasks().map_err(Into::into))?;
        step("clear image logs", self.store.delete_all_images().map_err(Into::into))?;
        step("clear progress", self.store.delete_all_progress().map_err(Into::into))?;
        step("clear habits", self.store.delete_all_habits().map_err(Into::into))?;
        step("clear goals", self.store.delete_all_goals().map_err(Into::into))?;
        step("clear tasks", self.store.delete_all_tasks().map_err(Into::into))?;
        self.images.clear_existing();

        // Insert in dependency order
        step("restore goals", {
            goals.iter().try_for_each(|g| self.store.insert_goal(g)).map_err(Into::into)
        })?;
        step("restore habits", {
            habits.iter().try_for_each(|h| self.store.upsert_habit(h)).map_err(Into::into)
        })?;
        step("restore progress", {
            progress
                .iter()
                .try_for_each(|p| self.store.insert_progress_if_absent(p).map(|_| ()))
                .map_err(Into::into)
        })?;
        step("restore subtasks", {
            subtasks.iter().try_for_each(|s| self.store.insert_subtask(s)).map_err(Into::into)
        })?;
        step("restore image logs", {
            images.iter().try_for_each(|i| self.store.insert_image(i)).map_err(Into::into)
        })?;
        step("restore tasks", {
            tasks.iter().try_for_each(|t| self.store.insert_task(t)).map_err(Into::into)
        })?;

        self.images.restore_all(&document.images);

        step(
            "restore preferences",
            self.prefs
                .update(|p| {
                    p.theme = document.preferences.theme.clone();
                    p.intro_shown = document.preferences.intro_shown;
                    p.auto_backup_enabled = document.preferences.auto_backup_enabled;
                })
                .map(|_| ())
                .map_err(Into::into),
        )?;

        tracing::info!("Restore completed from {}", path.display());
        Ok(())
    }

    fn validate(&self, metadata: &BackupMetadata) -> Result<(), BackupError> {
        if metadata.app_version.is_empty() {
            return Err(BackupError::Format(
                "Backup metadata is missing the app version".to_string(),
            ));
        }

        if metadata.database_version > migrations::CURRENT_VERSION {
            return Err(BackupError::Compatibility {
                found: metadata.database_version,
                supported: migrations::CURRENT_VERSION,
            });
        }

        Ok(())
    }

    /// Backup documents currently present, newest first
    pub fn list_available_backups(&self) -> Vec<BackupFileInfo> {
        let entries = match std::fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut backups: Vec<BackupFileInfo> = entries
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                if !file_name.starts_with(BACKUP_FILE_PREFIX)
                    || !file_name.ends_with(BACKUP_FILE_EXTENSION)
                {
                    return None;
                }

                let metadata = entry.metadata().ok()?;
                let modified = metadata.modified().ok()?;
                let modified_local: chrono::DateTime<Local> = modified.into();

                Some(BackupFileInfo {
                    display_name: file_name
                        .trim_start_matches(BACKUP_FILE_PREFIX)
                        .trim_end_matches(BACKUP_FILE_EXTENSION)
                        .to_string(),
                    modified: modified_local.format("%b %d, %Y %H:%M").to_string(),
                    size_bytes: metadata.len(),
                    size_display: format_file_size(metadata.len()),
                    path: entry.path(),
                    file_name,
                })
            })
            .collect();

        backups.sort_by(|a, b| b.file_name.cmp(&a.file_name));
        backups
    }

    /// Remove one backup document by file name
    pub fn delete_backup(&self, file_name: &str) -> Result<(), BackupError> {
        std::fs::remove_file(self.backup_dir.join(file_name))?;
        tracing::info!("Deleted backup: {}", file_name);
        Ok(())
    }

    /// Entity counts of a document without restoring it; matches exactly
    /// what a full restore would insert
    pub fn backup_summary(&self, path: &Path) -> Result<BackupSummary, BackupError> {
        let contents = std::fs::read_to_string(path)?;
        let document: BackupDocument = serde_json::from_str(&contents)
            .map_err(|e| BackupError::Format(format!("Unparseable backup document: {}", e)))?;

        Ok(BackupSummary {
            habits: document.habits.len(),
            progress: document.habit_progress.len(),
            goals: document.goals.len(),
            subtasks: document.subtasks.len(),
            tasks: document.one_time_tasks.len(),
            images: document.images.len(),
        })
    }
}

/// Label a restore step so a failure reports where the sequence stopped
fn step(name: &'static str, result: Result<(), BackupError>) -> Result<(), BackupError> {
    result.map_err(|source| BackupError::PartialRestore {
        step: name,
        source: Box::new(source),
    })
}

fn version_code(version: &str) -> i32 {
    let mut parts = version.split('.').map(|p| p.parse::<i32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    major * 10_000 + minor * 100 + patch
}

fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_code() {
        assert_eq!(version_code("0.1.0"), 100);
        assert_eq!(version_code("1.2.3"), 10_203);
        assert_eq!(version_code("garbage"), 0);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }
}
