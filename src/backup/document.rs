/// Portable backup document model
///
/// Every entity table is mirrored by a record type whose fields are plain
/// text: identifiers, dates and enums are serialized as strings so the
/// document stays portable and human-inspectable. Field names are stable
/// and camelCase on the wire. Each record converts to and from its domain
/// entity; conversion back rejects malformed values as format errors.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::backup::BackupError;
use crate::domain::{
    month_days_from_csv, month_days_to_csv, Frequency, Goal, GoalId, Habit, HabitId,
    HabitProgress, HabitType, ImageProgress, ImageProgressId, OneTimeTask, ProgressId,
    ReminderConfig, Status, SubTask, SubTaskId, TaskId, WeekdaySet,
};

/// The complete snapshot document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub metadata: BackupMetadata,
    pub habits: Vec<HabitRecord>,
    pub habit_progress: Vec<HabitProgressRecord>,
    pub goals: Vec<GoalRecord>,
    pub subtasks: Vec<SubTaskRecord>,
    pub image_progress: Vec<ImageProgressRecord>,
    pub one_time_tasks: Vec<OneTimeTaskRecord>,
    pub preferences: BackupPreferences,
    pub images: Vec<ImageFileRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub app_version: String,
    pub app_version_code: i32,
    pub database_version: i32,
    /// ISO-8601 local date-time the snapshot was taken
    pub backup_timestamp: String,
    /// "manual" or "automatic"
    pub backup_type: String,
    pub device_model: String,
    pub android_version: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPreferences {
    pub theme: String,
    pub intro_shown: bool,
    pub auto_backup_enabled: bool,
}

/// A referenced image file carried inline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFileRecord {
    pub file_name: String,
    pub base64_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRecord {
    pub habit_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub habit_type: String,
    pub goal_id: Option<String>,
    pub start_date: String,
    pub frequency: String,
    pub days_of_week: String,
    pub days_of_month: Option<String>,
    pub reminder_type: Option<String>,
    pub reminder_from: Option<String>,
    pub reminder_to: Option<String>,
    pub reminder_interval: Option<u32>,
    pub reminder_time: Option<String>,
    pub is_active: bool,
    pub color_key: String,
    pub count_param: Option<String>,
    pub count_target: Option<u32>,
    pub duration: Option<String>,
    pub current_streak: u32,
    pub max_streak: u32,
}

impl HabitRecord {
    pub fn from_entity(habit: &Habit) -> Self {
        let reminder = habit.reminder.clone().unwrap_or_default();
        Self {
            habit_id: habit.id.to_string(),
            title: habit.title.clone(),
            description: habit.description.clone(),
            habit_type: habit.habit_type.as_str().to_string(),
            goal_id: habit.goal_id.map(|g| g.to_string()),
            start_date: habit.start_date.to_string(),
            frequency: habit.frequency.as_str().to_string(),
            days_of_week: habit.days_of_week.to_flags(),
            days_of_month: if habit.days_of_month.is_empty() {
                None
            } else {
                Some(month_days_to_csv(&habit.days_of_month))
            },
            reminder_type: reminder.kind,
            reminder_from: reminder.from.map(format_time),
            reminder_to: reminder.to.map(format_time),
            reminder_interval: reminder.interval_minutes,
            reminder_time: reminder.time.map(format_time),
            is_active: habit.is_active,
            color_key: habit.color_key.clone(),
            count_param: habit.count_param.clone(),
            count_target: habit.count_target,
            duration: habit.duration.map(format_time),
            current_streak: habit.current_streak,
            max_streak: habit.max_streak,
        }
    }

    pub fn to_entity(&self) -> Result<Habit, BackupError> {
        let reminder = if self.reminder_type.is_none()
            && self.reminder_from.is_none()
            && self.reminder_to.is_none()
            && self.reminder_interval.is_none()
            && self.reminder_time.is_none()
        {
            None
        } else {
            Some(ReminderConfig {
                kind: self.reminder_type.clone(),
                from: parse_opt_time(&self.reminder_from)?,
                to: parse_opt_time(&self.reminder_to)?,
                interval_minutes: self.reminder_interval,
                time: parse_opt_time(&self.reminder_time)?,
            })
        };

        let goal_id = match &self.goal_id {
            Some(raw) => Some(GoalId::from_string(raw).map_err(format_err)?),
            None => None,
        };
        let days_of_month = match &self.days_of_month {
            Some(raw) => month_days_from_csv(raw).map_err(format_err)?,
            None => Vec::new(),
        };

        Ok(Habit::from_existing(
            HabitId::from_string(&self.habit_id).map_err(format_err)?,
            self.title.clone(),
            self.description.clone(),
            HabitType::parse(&self.habit_type).map_err(format_err)?,
            goal_id,
            parse_date(&self.start_date)?,
            Frequency::parse(&self.frequency).map_err(format_err)?,
            WeekdaySet::from_flags(&self.days_of_week).map_err(format_err)?,
            days_of_month,
            reminder,
            self.is_active,
            self.color_key.clone(),
            self.count_param.clone(),
            self.count_target,
            parse_opt_time(&self.duration)?,
            self.current_streak,
            self.max_streak,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitProgressRecord {
    pub progress_id: String,
    pub habit_id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub habit_type: String,
    pub count_param: Option<String>,
    pub current_count: Option<u32>,
    pub target_count: Option<u32>,
    pub target_duration_value: Option<String>,
    pub current_session_number: Option<u32>,
    pub target_session_number: Option<u32>,
    pub status: String,
    pub notes: Option<String>,
    pub excuse: Option<String>,
}

impl HabitProgressRecord {
    pub fn from_entity(progress: &HabitProgress) -> Self {
        Self {
            progress_id: progress.id.to_string(),
            habit_id: progress.habit_id.to_string(),
            date: progress.date.to_string(),
            habit_type: progress.habit_type.as_str().to_string(),
            count_param: progress.count_param.clone(),
            current_count: progress.current_count,
            target_count: progress.target_count,
            target_duration_value: progress.target_duration.map(format_time),
            current_session_number: progress.current_session,
            target_session_number: progress.target_session,
            status: progress.status.as_str().to_string(),
            notes: progress.notes.clone(),
            excuse: progress.excuse.clone(),
        }
    }

    pub fn to_entity(&self) -> Result<HabitProgress, BackupError> {
        Ok(HabitProgress::from_existing(
            ProgressId::from_string(&self.progress_id).map_err(format_err)?,
            HabitId::from_string(&self.habit_id).map_err(format_err)?,
            parse_date(&self.date)?,
            HabitType::parse(&self.habit_type).map_err(format_err)?,
            self.count_param.clone(),
            self.current_count,
            self.target_count,
            parse_opt_time(&self.target_duration_value)?,
            self.current_session_number,
            self.target_session_number,
            Status::parse(&self.status).map_err(format_err)?,
            self.notes.clone(),
            self.excuse.clone(),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub goal_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<String>,
    pub start_date: Option<String>,
    pub progress: Option<u32>,
}

impl GoalRecord {
    pub fn from_entity(goal: &Goal) -> Self {
        Self {
            goal_id: goal.id.to_string(),
            title: goal.title.clone(),
            description: goal.description.clone(),
            target_date: goal.target_date.map(|d| d.to_string()),
            start_date: goal.start_date.map(|d| d.to_string()),
            progress: goal.progress,
        }
    }

    pub fn to_entity(&self) -> Result<Goal, BackupError> {
        Ok(Goal::from_existing(
            GoalId::from_string(&self.goal_id).map_err(format_err)?,
            self.title.clone(),
            self.description.clone(),
            parse_opt_date(&self.start_date)?,
            parse_opt_date(&self.target_date)?,
            self.progress,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskRecord {
    pub subtask_id: String,
    pub title: String,
    pub is_completed: bool,
    pub habit_progress_id: String,
}

impl SubTaskRecord {
    pub fn from_entity(subtask: &SubTask) -> Self {
        Self {
            subtask_id: subtask.id.to_string(),
            title: subtask.title.clone(),
            is_completed: subtask.is_completed,
            habit_progress_id: subtask.progress_id.to_string(),
        }
    }

    pub fn to_entity(&self) -> Result<SubTask, BackupError> {
        Ok(SubTask::from_existing(
            SubTaskId::from_string(&self.subtask_id).map_err(format_err)?,
            self.title.clone(),
            self.is_completed,
            ProgressId::from_string(&self.habit_progress_id).map_err(format_err)?,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProgressRecord {
    pub id: String,
    pub habit_id: String,
    pub description: String,
    pub date: String,
    pub image_path: String,
}

impl ImageProgressRecord {
    pub fn from_entity(image: &ImageProgress) -> Self {
        Self {
            id: image.id.to_string(),
            habit_id: image.habit_id.to_string(),
            description: image.description.clone(),
            date: image.date.to_string(),
            image_path: image.image_path.clone(),
        }
    }

    pub fn to_entity(&self) -> Result<ImageProgress, BackupError> {
        Ok(ImageProgress::from_existing(
            ImageProgressId::from_string(&self.id).map_err(format_err)?,
            HabitId::from_string(&self.habit_id).map_err(format_err)?,
            self.description.clone(),
            parse_date(&self.date)?,
            self.image_path.clone(),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimeTaskRecord {
    pub task_id: String,
    pub title: String,
    pub is_completed: bool,
    pub date: String,
    pub reminder_time: Option<String>,
}

impl OneTimeTaskRecord {
    pub fn from_entity(task: &OneTimeTask) -> Self {
        Self {
            task_id: task.id.to_string(),
            title: task.title.clone(),
            is_completed: task.is_completed,
            date: task.date.to_string(),
            reminder_time: task.reminder_time.map(format_time),
        }
    }

    pub fn to_entity(&self) -> Result<OneTimeTask, BackupError> {
        Ok(OneTimeTask::from_existing(
            TaskId::from_string(&self.task_id).map_err(format_err)?,
            self.title.clone(),
            self.is_completed,
            parse_date(&self.date)?,
            parse_opt_time(&self.reminder_time)?,
        ))
    }
}

// Text round-trip helpers

fn format_err(e: crate::domain::DomainError) -> BackupError {
    BackupError::Format(e.to_string())
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate, BackupError> {
    s.parse::<NaiveDate>()
        .map_err(|_| BackupError::Format(format!("Invalid date: '{}'", s)))
}

fn parse_opt_date(s: &Option<String>) -> Result<Option<NaiveDate>, BackupError> {
    s.as_deref().map(parse_date).transpose()
}

fn parse_time(s: &str) -> Result<NaiveTime, BackupError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| BackupError::Format(format!("Invalid time: '{}'", s)))
}

fn parse_opt_time(s: &Option<String>) -> Result<Option<NaiveTime>, BackupError> {
    s.as_deref().map(parse_time).transpose()
}
