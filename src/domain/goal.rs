/// Goal entity
///
/// A goal is an aspirational grouping of habits. Deleting a goal never
/// cascades to its habits; they just become un-grouped.

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::domain::{DomainError, GoalId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    /// Cached completion percentage (0-100), maintained by callers
    pub progress: Option<u32>,
}

impl Goal {
    pub fn new(
        title: String,
        description: Option<String>,
        start_date: Option<NaiveDate>,
        target_date: Option<NaiveDate>,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidTitle(
                "Goal title cannot be empty".to_string(),
            ));
        }
        if let (Some(start), Some(target)) = (start_date, target_date) {
            if target < start {
                return Err(DomainError::InvalidDate(
                    "Goal target date cannot be before its start date".to_string(),
                ));
            }
        }

        Ok(Self {
            id: GoalId::new(),
            title,
            description,
            start_date,
            target_date,
            progress: None,
        })
    }

    pub fn from_existing(
        id: GoalId,
        title: String,
        description: Option<String>,
        start_date: Option<NaiveDate>,
        target_date: Option<NaiveDate>,
        progress: Option<u32>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            start_date,
            target_date,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_date_order() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1);
        let target = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(Goal::new("Run a marathon".to_string(), None, start, target).is_err());
        assert!(Goal::new("Run a marathon".to_string(), None, target, start).is_ok());
    }
}
