/// Habit entity and related functionality
///
/// This module defines the core Habit struct that represents a recurring
/// intention the user wants to track, along with its validation rules.

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};

use crate::domain::{DomainError, Frequency, GoalId, HabitId, HabitType, WeekdaySet};

/// Optional reminder configuration carried on a habit
///
/// The core only stores and round-trips these values; actually scheduling
/// platform notifications is an external collaborator's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Reminder style as the platform understands it (e.g. "AtTime")
    pub kind: Option<String>,
    /// Start of a reminder window
    pub from: Option<NaiveTime>,
    /// End of a reminder window
    pub to: Option<NaiveTime>,
    /// Repeat interval in minutes within the window
    pub interval_minutes: Option<u32>,
    /// A single fixed reminder time
    pub time: Option<NaiveTime>,
}

/// A recurring intention with a frequency rule and a type-specific target
///
/// `current_streak` and `max_streak` are cached derived values owned by the
/// streak engine; everything else is user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Display title (e.g. "Morning Run")
    pub title: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Which kind of completion target this habit carries
    pub habit_type: HabitType,
    /// Optional owning goal; the habit is un-grouped when absent
    pub goal_id: Option<GoalId>,
    /// First day the habit applies
    pub start_date: NaiveDate,
    /// Recurrence rule
    pub frequency: Frequency,
    /// Weekday selector, meaningful for Weekly habits
    pub days_of_week: WeekdaySet,
    /// Month-day selector, meaningful for Monthly habits
    pub days_of_month: Vec<u32>,
    /// Optional reminder configuration
    pub reminder: Option<ReminderConfig>,
    /// Whether this habit is currently active (can be paused)
    pub is_active: bool,
    /// Display color key for the UI layer
    pub color_key: String,
    /// Unit for count targets (e.g. "glasses", "pages")
    pub count_param: Option<String>,
    /// Count target for Count habits; number of sessions for Session habits
    pub count_target: Option<u32>,
    /// Target duration for Duration habits; per-session duration for Session habits
    pub duration: Option<NaiveTime>,
    /// Cached: consecutive due-days completed, ending at the most recent due day
    pub current_streak: u32,
    /// Cached: best streak ever achieved; never revised downward
    pub max_streak: u32,
}

impl Habit {
    /// Create a new habit with validation
    ///
    /// This is the main constructor. It checks the title/description bounds
    /// and the type/target and frequency/day-selector invariants, and starts
    /// the habit active with zeroed streak counters.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        description: Option<String>,
        habit_type: HabitType,
        goal_id: Option<GoalId>,
        start_date: NaiveDate,
        frequency: Frequency,
        days_of_week: WeekdaySet,
        days_of_month: Vec<u32>,
        reminder: Option<ReminderConfig>,
        color_key: String,
        count_param: Option<String>,
        count_target: Option<u32>,
        duration: Option<NaiveTime>,
    ) -> Result<Self, DomainError> {
        Self::validate_title(&title)?;
        Self::validate_description(&description)?;
        Self::validate_targets(habit_type, &count_param, count_target, duration)?;
        Self::validate_day_selector(frequency, &days_of_week, &days_of_month)?;

        Ok(Self {
            id: HabitId::new(),
            title,
            description,
            habit_type,
            goal_id,
            start_date,
            frequency,
            days_of_week,
            days_of_month,
            reminder,
            is_active: true,
            color_key,
            count_param,
            count_target,
            duration,
            current_streak: 0,
            max_streak: 0,
        })
    }

    /// Create a habit from already-validated data (used when loading from
    /// the database or a backup document)
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: HabitId,
        title: String,
        description: Option<String>,
        habit_type: HabitType,
        goal_id: Option<GoalId>,
        start_date: NaiveDate,
        frequency: Frequency,
        days_of_week: WeekdaySet,
        days_of_month: Vec<u32>,
        reminder: Option<ReminderConfig>,
        is_active: bool,
        color_key: String,
        count_param: Option<String>,
        count_target: Option<u32>,
        duration: Option<NaiveTime>,
        current_streak: u32,
        max_streak: u32,
    ) -> Self {
        Self {
            id,
            title,
            description,
            habit_type,
            goal_id,
            start_date,
            frequency,
            days_of_week,
            days_of_month,
            reminder,
            is_active,
            color_key,
            count_param,
            count_target,
            duration,
            current_streak,
            max_streak,
        }
    }

    // Validation helper methods

    /// Validate habit title according to business rules
    fn validate_title(title: &str) -> Result<(), DomainError> {
        let trimmed = title.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidTitle(
                "Habit title cannot be empty".to_string(),
            ));
        }

        if trimmed.len() > 100 {
            return Err(DomainError::InvalidTitle(
                "Habit title cannot be longer than 100 characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate optional description
    fn validate_description(description: &Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = description {
            if desc.len() > 500 {
                return Err(DomainError::Validation {
                    message: "Description cannot be longer than 500 characters".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The habit type decides which target fields must be populated
    fn validate_targets(
        habit_type: HabitType,
        count_param: &Option<String>,
        count_target: Option<u32>,
        duration: Option<NaiveTime>,
    ) -> Result<(), DomainError> {
        match habit_type {
            HabitType::Count => {
                let target = count_target.ok_or(DomainError::InvalidValue {
                    message: "Count habits need a count target".to_string(),
                })?;
                if target == 0 {
                    return Err(DomainError::InvalidValue {
                        message: "Count target must be greater than 0".to_string(),
                    });
                }
                match count_param {
                    Some(param) if !param.trim().is_empty() => {}
                    _ => {
                        return Err(DomainError::InvalidValue {
                            message: "Count habits need a count unit".to_string(),
                        })
                    }
                }
            }
            HabitType::Duration => {
                if duration.is_none() {
                    return Err(DomainError::InvalidValue {
                        message: "Duration habits need a target duration".to_string(),
                    });
                }
            }
            HabitType::Session => {
                if duration.is_none() {
                    return Err(DomainError::InvalidValue {
                        message: "Session habits need a per-session duration".to_string(),
                    });
                }
                match count_target {
                    Some(sessions) if sessions > 0 => {}
                    _ => {
                        return Err(DomainError::InvalidValue {
                            message: "Session habits need a session count greater than 0"
                                .to_string(),
                        })
                    }
                }
            }
            HabitType::OneTime => {}
        }
        Ok(())
    }

    /// The frequency decides which day selector must be populated
    fn validate_day_selector(
        frequency: Frequency,
        days_of_week: &WeekdaySet,
        days_of_month: &[u32],
    ) -> Result<(), DomainError> {
        match frequency {
            Frequency::Daily => Ok(()),
            Frequency::Weekly => {
                if days_of_week.is_empty() {
                    return Err(DomainError::InvalidFrequency(
                        "Weekly habits must select at least one weekday".to_string(),
                    ));
                }
                Ok(())
            }
            Frequency::Monthly => {
                if days_of_month.is_empty() {
                    return Err(DomainError::InvalidFrequency(
                        "Monthly habits must select at least one day of the month".to_string(),
                    ));
                }
                if days_of_month.iter().any(|d| !(1..=31).contains(d)) {
                    return Err(DomainError::InvalidFrequency(
                        "Days of the month must be between 1 and 31".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}
