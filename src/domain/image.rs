/// ImageProgress entity
///
/// A dated photographic log entry tied to a habit. The row references an
/// image file in the app-private image directory by absolute path; deleting
/// the entry removes both the row and the file.

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::domain::{DomainError, HabitId, ImageProgressId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProgress {
    pub id: ImageProgressId,
    pub habit_id: HabitId,
    pub description: String,
    pub date: NaiveDate,
    /// Absolute path into the local image directory; not portable across
    /// installs, rewritten on restore
    pub image_path: String,
}

impl ImageProgress {
    pub fn new(
        habit_id: HabitId,
        description: String,
        date: NaiveDate,
        image_path: String,
    ) -> Result<Self, DomainError> {
        if image_path.trim().is_empty() {
            return Err(DomainError::InvalidValue {
                message: "Image path cannot be empty".to_string(),
            });
        }

        Ok(Self {
            id: ImageProgressId::new(),
            habit_id,
            description,
            date,
            image_path,
        })
    }

    pub fn from_existing(
        id: ImageProgressId,
        habit_id: HabitId,
        description: String,
        date: NaiveDate,
        image_path: String,
    ) -> Self {
        Self {
            id,
            habit_id,
            description,
            date,
            image_path,
        }
    }

    /// File name component of the referenced image
    pub fn file_name(&self) -> Option<String> {
        std::path::Path::new(&self.image_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}
