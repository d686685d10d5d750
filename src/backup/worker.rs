/// Daily automatic backup job
///
/// Runs a 24-hour loop that snapshots the dataset when auto-backup is
/// enabled. A failed attempt is retried up to 3 times before the period is
/// written off; the next period starts fresh. The loop never overlaps with
/// itself, but the coordinator offers no mutual exclusion against a
/// user-initiated restore running at the same time.

use std::sync::Arc;
use std::time::Duration;

use crate::backup::{BackupKind, BackupManager};
use crate::storage::HabitStore;

const REPEAT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_ATTEMPTS: u32 = 3;

pub struct DailyBackupWorker<S> {
    manager: Arc<BackupManager<S>>,
}

impl<S: HabitStore + Send + Sync + 'static> DailyBackupWorker<S> {
    pub fn new(manager: Arc<BackupManager<S>>) -> Self {
        Self { manager }
    }

    /// Run the periodic loop until the task is dropped
    pub async fn run(self) {
        let mut interval = tokio::time::interval(REPEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.run_once();
        }
    }

    /// One backup period: skip when disabled, otherwise attempt with retry.
    /// Returns whether the period ended in success (a disabled period counts
    /// as success; callers only observe success or failure).
    pub fn run_once(&self) -> bool {
        if !self.manager.preferences_store().load().auto_backup_enabled {
            tracing::debug!("Auto-backup disabled, skipping period");
            return true;
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match self.manager.create_backup(BackupKind::Automatic) {
                Ok(path) => {
                    tracing::info!("Automatic backup written to {}", path.display());
                    return true;
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!("Automatic backup attempt {} failed: {}", attempt, e);
                }
                Err(e) => {
                    tracing::error!(
                        "Automatic backup failed after {} attempts: {}",
                        MAX_ATTEMPTS,
                        e
                    );
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::ImageStore;
    use crate::preferences::PreferencesStore;
    use crate::storage::SqliteStore;
    use tempfile::TempDir;

    fn worker(dir: &TempDir) -> DailyBackupWorker<SqliteStore> {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let images = ImageStore::open(dir.path()).unwrap();
        let prefs = PreferencesStore::open(dir.path());
        let manager = Arc::new(BackupManager::new(
            store,
            images,
            dir.path().join("backups"),
            prefs,
        ));
        DailyBackupWorker::new(manager)
    }

    #[test]
    fn test_disabled_period_is_a_successful_noop() {
        let dir = TempDir::new().unwrap();
        let worker = worker(&dir);

        assert!(worker.run_once());
        assert!(worker.manager.list_available_backups().is_empty());
    }

    #[test]
    fn test_enabled_period_writes_a_backup() {
        let dir = TempDir::new().unwrap();
        let worker = worker(&dir);
        worker
            .manager
            .preferences_store()
            .update(|p| p.auto_backup_enabled = true)
            .unwrap();

        assert!(worker.run_once());
        assert_eq!(worker.manager.list_available_backups().len(), 1);
    }
}
