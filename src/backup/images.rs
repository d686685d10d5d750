/// Image file handling for backup and restore
///
/// Image files live in an app-private directory and are referenced by
/// absolute path from ImageProgress rows. Backups carry them inline as
/// base64; a single unreadable file is logged and skipped rather than
/// failing the whole snapshot.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::backup::document::ImageFileRecord;
use crate::domain::ImageProgress;

/// Handle on the local image directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn open(data_dir: &Path) -> std::io::Result<Self> {
        let dir = data_dir.join("habit_images");
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Where a file of this name lives in the local image directory
    pub fn local_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Encode every unique image referenced by the given rows
    pub fn encode_all(&self, images: &[ImageProgress]) -> Vec<ImageFileRecord> {
        let mut records = Vec::new();
        let mut processed: HashSet<&str> = HashSet::new();

        for image in images {
            let path = image.image_path.as_str();
            if !processed.insert(path) {
                continue;
            }

            match std::fs::read(path) {
                Ok(bytes) => {
                    let file_name = match image.file_name() {
                        Some(name) => name,
                        None => continue,
                    };
                    records.push(ImageFileRecord {
                        file_name,
                        base64_content: BASE64.encode(bytes),
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable image '{}': {}", path, e);
                }
            }
        }

        records
    }

    /// Write decoded image files into the local directory
    ///
    /// Individual failures are logged and skipped so one bad payload does
    /// not lose the rest.
    pub fn restore_all(&self, images: &[ImageFileRecord]) {
        for record in images {
            let target = self.local_path(&record.file_name);
            let bytes = match BASE64.decode(record.base64_content.as_bytes()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Skipping undecodable image '{}': {}", record.file_name, e);
                    continue;
                }
            };

            if let Err(e) = std::fs::write(&target, bytes) {
                tracing::warn!("Could not write image '{}': {}", record.file_name, e);
            }
        }
    }

    /// Remove every file in the local image directory
    pub fn clear_existing(&self) {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Could not list image directory: {}", e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!("Could not remove image '{}': {}", path.display(), e);
                }
            }
        }
    }

    /// Delete one image file; missing files are fine
    pub fn delete_file(&self, image_path: &str) {
        match std::fs::remove_file(image_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove image '{}': {}", image_path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HabitId;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn image_row(path: &str) -> ImageProgress {
        ImageProgress::new(
            HabitId::new(),
            "progress pic".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            path.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_restore_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).unwrap();

        let source = store.local_path("day1.jpg");
        std::fs::write(&source, b"fake jpeg bytes").unwrap();

        let rows = vec![image_row(source.to_str().unwrap())];
        let records = store.encode_all(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "day1.jpg");

        store.clear_existing();
        assert!(!source.exists());

        store.restore_all(&records);
        assert_eq!(std::fs::read(&source).unwrap(), b"fake jpeg bytes");
    }

    #[test]
    fn test_duplicate_paths_encoded_once() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).unwrap();

        let source = store.local_path("shared.jpg");
        std::fs::write(&source, b"shared").unwrap();

        let path = source.to_str().unwrap();
        let rows = vec![image_row(path), image_row(path)];
        assert_eq!(store.encode_all(&rows).len(), 1);
    }

    #[test]
    fn test_unreadable_image_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::open(dir.path()).unwrap();

        let rows = vec![image_row("/nonexistent/nowhere.jpg")];
        assert!(store.encode_all(&rows).is_empty());
    }
}
