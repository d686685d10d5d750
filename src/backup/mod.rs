/// Backup and restore of the full dataset
///
/// This module snapshots every entity table plus the referenced image files
/// into one portable JSON document, and restores such documents with schema
/// version checking. The restore sequence deletes existing data before
/// inserting; there is no transaction spanning both phases, so a failure
/// partway is reported as a PartialRestore rather than rolled back.

pub mod document;
pub mod images;
pub mod manager;
pub mod worker;

pub use document::*;
pub use images::ImageStore;
pub use manager::*;
pub use worker::DailyBackupWorker;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while creating or restoring backups
#[derive(Error, Debug)]
pub enum BackupError {
    /// The document is not parseable or carries malformed values; nothing
    /// was changed
    #[error("Invalid backup document: {0}")]
    Format(String),

    /// The document was created by a newer schema than this build supports;
    /// nothing was changed
    #[error("Backup schema version {found} is newer than supported version {supported}")]
    Compatibility { found: i32, supported: i32 },

    #[error("Backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backup serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The restore sequence failed after existing data had already been
    /// cleared; the store is left in whatever state the failed step produced
    #[error("Restore failed at step '{step}': {source}")]
    PartialRestore {
        step: &'static str,
        #[source]
        source: Box<BackupError>,
    },
}
