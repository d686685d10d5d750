/// OneTimeTask entity
///
/// A single-occurrence task outside the recurring habit cycle.

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};

use crate::domain::{DomainError, TaskId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTimeTask {
    pub id: TaskId,
    pub title: String,
    pub is_completed: bool,
    /// The day the task is scheduled for
    pub date: NaiveDate,
    pub reminder_time: Option<NaiveTime>,
}

impl OneTimeTask {
    pub fn new(
        title: String,
        date: NaiveDate,
        reminder_time: Option<NaiveTime>,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidTitle(
                "Task title cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: TaskId::new(),
            title,
            is_completed: false,
            date,
            reminder_time,
        })
    }

    pub fn from_existing(
        id: TaskId,
        title: String,
        is_completed: bool,
        date: NaiveDate,
        reminder_time: Option<NaiveTime>,
    ) -> Self {
        Self {
            id,
            title,
            is_completed,
            date,
            reminder_time,
        }
    }
}
