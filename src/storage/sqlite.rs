/// SQLite implementation of the habit store
///
/// This module provides the concrete SQLite implementation of the repository
/// contract. The connection sits behind a mutex so one handle can be shared
/// between the foreground command path and the background backup worker;
/// SQLite's single-writer transactions serialize concurrent mutations of the
/// same row.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{
    month_days_from_csv, month_days_to_csv, Frequency, Goal, GoalId, Habit, HabitId,
    HabitProgress, HabitType, HabitWithProgress, ImageProgress, ImageProgressId, OneTimeTask,
    ProgressId, ReminderConfig, Status, SubTask, SubTaskId, TaskId, WeekdaySet,
};
use crate::storage::{migrations, HabitStore, StorageError};

/// SQLite-based store implementation
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and run pending migrations
    pub fn open(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        Self::initialize(conn, Some(&db_path))
    }

    /// Open an in-memory database (used by tests)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        Self::initialize(conn, None)
    }

    fn initialize(conn: Connection, db_path: Option<&PathBuf>) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        if let Some(path) = db_path {
            tracing::info!("SQLite store initialized at: {:?}", path);
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Database lock poisoned".to_string()))
    }

    // Row mapping helpers. Enum text is parsed strictly; a row carrying an
    // unrecognized value surfaces as StorageError::Corrupt rather than being
    // silently defaulted.

    fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<RawHabit> {
        Ok(RawHabit {
            habit_id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            habit_type: row.get(3)?,
            goal_id: row.get(4)?,
            start_date: row.get(5)?,
            frequency: row.get(6)?,
            days_of_week: row.get(7)?,
            days_of_month: row.get(8)?,
            reminder_type: row.get(9)?,
            reminder_from: row.get(10)?,
            reminder_to: row.get(11)?,
            reminder_interval: row.get(12)?,
            reminder_time: row.get(13)?,
            is_active: row.get(14)?,
            color_key: row.get(15)?,
            count_param: row.get(16)?,
            count_target: row.get(17)?,
            duration: row.get(18)?,
            current_streak: row.get(19)?,
            max_streak: row.get(20)?,
        })
    }

    fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<RawProgress> {
        Ok(RawProgress {
            progress_id: row.get(0)?,
            habit_id: row.get(1)?,
            date: row.get(2)?,
            habit_type: row.get(3)?,
            count_param: row.get(4)?,
            current_count: row.get(5)?,
            target_count: row.get(6)?,
            target_duration: row.get(7)?,
            current_session: row.get(8)?,
            target_session: row.get(9)?,
            status: row.get(10)?,
            notes: row.get(11)?,
            excuse: row.get(12)?,
        })
    }

    fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<RawGoal> {
        Ok(RawGoal {
            goal_id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            start_date: row.get(3)?,
            target_date: row.get(4)?,
            progress: row.get(5)?,
        })
    }
}

const HABIT_COLUMNS: &str = "habit_id, title, description, type, goal_id, start_date, frequency, \
     days_of_week, days_of_month, reminder_type, reminder_from, reminder_to, reminder_interval, \
     reminder_time, is_active, color_key, count_param, count_target, duration, current_streak, max_streak";

const PROGRESS_COLUMNS: &str = "progress_id, habit_id, date, type, count_param, current_count, \
     target_count, target_duration, current_session, target_session, status, notes, excuse";

/// Habit row exactly as stored, before enum/selector text is parsed
struct RawHabit {
    habit_id: String,
    title: String,
    description: Option<String>,
    habit_type: String,
    goal_id: Option<String>,
    start_date: NaiveDate,
    frequency: String,
    days_of_week: String,
    days_of_month: Option<String>,
    reminder_type: Option<String>,
    reminder_from: Option<NaiveTime>,
    reminder_to: Option<NaiveTime>,
    reminder_interval: Option<u32>,
    reminder_time: Option<NaiveTime>,
    is_active: bool,
    color_key: String,
    count_param: Option<String>,
    count_target: Option<u32>,
    duration: Option<NaiveTime>,
    current_streak: u32,
    max_streak: u32,
}

impl RawHabit {
    fn into_habit(self) -> Result<Habit, StorageError> {
        let reminder = if self.reminder_type.is_none()
            && self.reminder_from.is_none()
            && self.reminder_to.is_none()
            && self.reminder_interval.is_none()
            && self.reminder_time.is_none()
        {
            None
        } else {
            Some(ReminderConfig {
                kind: self.reminder_type,
                from: self.reminder_from,
                to: self.reminder_to,
                interval_minutes: self.reminder_interval,
                time: self.reminder_time,
            })
        };

        let goal_id = match self.goal_id {
            Some(raw) => Some(GoalId::from_string(&raw)?),
            None => None,
        };
        let days_of_month = match self.days_of_month {
            Some(raw) => month_days_from_csv(&raw)?,
            None => Vec::new(),
        };

        Ok(Habit::from_existing(
            HabitId::from_string(&self.habit_id)?,
            self.title,
            self.description,
            HabitType::parse(&self.habit_type)?,
            goal_id,
            self.start_date,
            Frequency::parse(&self.frequency)?,
            WeekdaySet::from_flags(&self.days_of_week)?,
            days_of_month,
            reminder,
            self.is_active,
            self.color_key,
            self.count_param,
            self.count_target,
            self.duration,
            self.current_streak,
            self.max_streak,
        ))
    }
}

/// Progress row exactly as stored
struct RawProgress {
    progress_id: String,
    habit_id: String,
    date: NaiveDate,
    habit_type: String,
    count_param: Option<String>,
    current_count: Option<u32>,
    target_count: Option<u32>,
    target_duration: Option<NaiveTime>,
    current_session: Option<u32>,
    target_session: Option<u32>,
    status: String,
    notes: Option<String>,
    excuse: Option<String>,
}

impl RawProgress {
    fn into_progress(self) -> Result<HabitProgress, StorageError> {
        Ok(HabitProgress::from_existing(
            ProgressId::from_string(&self.progress_id)?,
            HabitId::from_string(&self.habit_id)?,
            self.date,
            HabitType::parse(&self.habit_type)?,
            self.count_param,
            self.current_count,
            self.target_count,
            self.target_duration,
            self.current_session,
            self.target_session,
            Status::parse(&self.status)?,
            self.notes,
            self.excuse,
        ))
    }
}

struct RawGoal {
    goal_id: String,
    title: String,
    description: Option<String>,
    start_date: Option<NaiveDate>,
    target_date: Option<NaiveDate>,
    progress: Option<u32>,
}

impl RawGoal {
    fn into_goal(self) -> Result<Goal, StorageError> {
        Ok(Goal::from_existing(
            GoalId::from_string(&self.goal_id)?,
            self.title,
            self.description,
            self.start_date,
            self.target_date,
            self.progress,
        ))
    }
}

impl HabitStore for SqliteStore {
    fn upsert_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let reminder = habit.reminder.clone().unwrap_or_default();
        let days_of_month = if habit.days_of_month.is_empty() {
            None
        } else {
            Some(month_days_to_csv(&habit.days_of_month))
        };

        conn.execute(
            "INSERT INTO habits (
                habit_id, title, description, type, goal_id, start_date, frequency,
                days_of_week, days_of_month, reminder_type, reminder_from, reminder_to,
                reminder_interval, reminder_time, is_active, color_key, count_param,
                count_target, duration, current_streak, max_streak
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
            ON CONFLICT(habit_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                type = excluded.type,
                goal_id = excluded.goal_id,
                start_date = excluded.start_date,
                frequency = excluded.frequency,
                days_of_week = excluded.days_of_week,
                days_of_month = excluded.days_of_month,
                reminder_type = excluded.reminder_type,
                reminder_from = excluded.reminder_from,
                reminder_to = excluded.reminder_to,
                reminder_interval = excluded.reminder_interval,
                reminder_time = excluded.reminder_time,
                is_active = excluded.is_active,
                color_key = excluded.color_key,
                count_param = excluded.count_param,
                count_target = excluded.count_target,
                duration = excluded.duration,
                current_streak = excluded.current_streak,
                max_streak = excluded.max_streak",
            params![
                habit.id.to_string(),
                habit.title,
                habit.description,
                habit.habit_type.as_str(),
                habit.goal_id.map(|g| g.to_string()),
                habit.start_date,
                habit.frequency.as_str(),
                habit.days_of_week.to_flags(),
                days_of_month,
                reminder.kind,
                reminder.from,
                reminder.to,
                reminder.interval_minutes,
                reminder.time,
                habit.is_active,
                habit.color_key,
                habit.count_param,
                habit.count_target,
                habit.duration,
                habit.current_streak,
                habit.max_streak,
            ],
        )?;

        tracing::debug!("Upserted habit: {} ({})", habit.title, habit.id);
        Ok(())
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM habits WHERE habit_id = ?1", HABIT_COLUMNS);
        let raw = conn
            .query_row(&sql, params![habit_id.to_string()], Self::habit_from_row)
            .optional()?;

        match raw {
            Some(raw) => raw.into_habit(),
            None => Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            }),
        }
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM habits WHERE habit_id = ?1",
            params![habit_id.to_string()],
        )?;

        if rows == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tracing::debug!("Deleted habit {} with cascading records", habit_id);
        Ok(())
    }

    fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>, StorageError> {
        let conn = self.conn()?;
        let sql = if active_only {
            format!("SELECT {} FROM habits WHERE is_active = 1 ORDER BY title", HABIT_COLUMNS)
        } else {
            format!("SELECT {} FROM habits ORDER BY title", HABIT_COLUMNS)
        };

        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
            .query_map([], Self::habit_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(RawHabit::into_habit).collect()
    }

    fn insert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO goals (goal_id, title, description, start_date, target_date, progress)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                goal.id.to_string(),
                goal.title,
                goal.description,
                goal.start_date,
                goal.target_date,
                goal.progress,
            ],
        )?;
        Ok(())
    }

    fn update_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE goals SET title = ?2, description = ?3, start_date = ?4, target_date = ?5, progress = ?6
             WHERE goal_id = ?1",
            params![
                goal.id.to_string(),
                goal.title,
                goal.description,
                goal.start_date,
                goal.target_date,
                goal.progress,
            ],
        )?;

        if rows == 0 {
            return Err(StorageError::GoalNotFound {
                goal_id: goal.id.to_string(),
            });
        }
        Ok(())
    }

    fn get_goal(&self, goal_id: &GoalId) -> Result<Goal, StorageError> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                "SELECT goal_id, title, description, start_date, target_date, progress
                 FROM goals WHERE goal_id = ?1",
                params![goal_id.to_string()],
                Self::goal_from_row,
            )
            .optional()?;

        match raw {
            Some(raw) => raw.into_goal(),
            None => Err(StorageError::GoalNotFound {
                goal_id: goal_id.to_string(),
            }),
        }
    }

    fn list_goals(&self) -> Result<Vec<Goal>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT goal_id, title, description, start_date, target_date, progress
             FROM goals ORDER BY title",
        )?;
        let raws = stmt
            .query_map([], Self::goal_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(RawGoal::into_goal).collect()
    }

    fn delete_goal(&self, goal_id: &GoalId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM goals WHERE goal_id = ?1",
            params![goal_id.to_string()],
        )?;

        if rows == 0 {
            return Err(StorageError::GoalNotFound {
                goal_id: goal_id.to_string(),
            });
        }
        Ok(())
    }

    fn insert_progress_if_absent(&self, progress: &HabitProgress) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "INSERT OR IGNORE INTO habit_progress (
                progress_id, habit_id, date, type, count_param, current_count, target_count,
                target_duration, current_session, target_session, status, notes, excuse
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                progress.id.to_string(),
                progress.habit_id.to_string(),
                progress.date,
                progress.habit_type.as_str(),
                progress.count_param,
                progress.current_count,
                progress.target_count,
                progress.target_duration,
                progress.current_session,
                progress.target_session,
                progress.status.as_str(),
                progress.notes,
                progress.excuse,
            ],
        )?;

        Ok(rows > 0)
    }

    fn get_progress(&self, progress_id: &ProgressId) -> Result<HabitProgress, StorageError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM habit_progress WHERE progress_id = ?1",
            PROGRESS_COLUMNS
        );
        let raw = conn
            .query_row(&sql, params![progress_id.to_string()], Self::progress_from_row)
            .optional()?;

        match raw {
            Some(raw) => raw.into_progress(),
            None => Err(StorageError::ProgressNotFound {
                progress_id: progress_id.to_string(),
            }),
        }
    }

    fn progress_for(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<Option<HabitProgress>, StorageError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM habit_progress WHERE habit_id = ?1 AND date = ?2",
            PROGRESS_COLUMNS
        );
        let raw = conn
            .query_row(&sql, params![habit_id.to_string(), date], Self::progress_from_row)
            .optional()?;

        raw.map(RawProgress::into_progress).transpose()
    }

    fn all_progress_for_habit(
        &self,
        habit_id: &HabitId,
    ) -> Result<Vec<HabitProgress>, StorageError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM habit_progress WHERE habit_id = ?1 ORDER BY date",
            PROGRESS_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
            .query_map(params![habit_id.to_string()], Self::progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(RawProgress::into_progress).collect()
    }

    fn update_progress(&self, progress: &HabitProgress) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE habit_progress SET
                habit_id = ?2, date = ?3, type = ?4, count_param = ?5, current_count = ?6,
                target_count = ?7, target_duration = ?8, current_session = ?9,
                target_session = ?10, status = ?11, notes = ?12, excuse = ?13
             WHERE progress_id = ?1",
            params![
                progress.id.to_string(),
                progress.habit_id.to_string(),
                progress.date,
                progress.habit_type.as_str(),
                progress.count_param,
                progress.current_count,
                progress.target_count,
                progress.target_duration,
                progress.current_session,
                progress.target_session,
                progress.status.as_str(),
                progress.notes,
                progress.excuse,
            ],
        )?;

        if rows == 0 {
            return Err(StorageError::ProgressNotFound {
                progress_id: progress.id.to_string(),
            });
        }
        Ok(())
    }

    fn habits_for_day(&self, date: NaiveDate) -> Result<Vec<HabitWithProgress>, StorageError> {
        let progress_rows = {
            let conn = self.conn()?;
            let sql = format!(
                "SELECT {} FROM habit_progress WHERE date = ?1",
                PROGRESS_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let raws = stmt
                .query_map(params![date], Self::progress_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            raws.into_iter()
                .map(RawProgress::into_progress)
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut result = Vec::with_capacity(progress_rows.len());
        for progress in progress_rows {
            let habit = self.get_habit(&progress.habit_id)?;
            let subtasks = self.subtasks_for_progress(&progress.id)?;
            result.push(HabitWithProgress {
                habit,
                progress,
                subtasks,
            });
        }

        result.sort_by(|a, b| a.habit.title.cmp(&b.habit.title));
        Ok(result)
    }

    fn insert_subtask(&self, subtask: &SubTask) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO subtasks (subtask_id, title, is_completed, progress_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(subtask_id) DO UPDATE SET
                title = excluded.title,
                is_completed = excluded.is_completed,
                progress_id = excluded.progress_id",
            params![
                subtask.id.to_string(),
                subtask.title,
                subtask.is_completed,
                subtask.progress_id.to_string(),
            ],
        )?;
        Ok(())
    }

    fn update_subtask(&self, subtask: &SubTask) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE subtasks SET title = ?2, is_completed = ?3, progress_id = ?4
             WHERE subtask_id = ?1",
            params![
                subtask.id.to_string(),
                subtask.title,
                subtask.is_completed,
                subtask.progress_id.to_string(),
            ],
        )?;

        if rows == 0 {
            return Err(StorageError::SubTaskNotFound {
                subtask_id: subtask.id.to_string(),
            });
        }
        Ok(())
    }

    fn toggle_subtask(&self, subtask_id: &SubTaskId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE subtasks SET is_completed = NOT is_completed WHERE subtask_id = ?1",
            params![subtask_id.to_string()],
        )?;

        if rows == 0 {
            return Err(StorageError::SubTaskNotFound {
                subtask_id: subtask_id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_subtask(&self, subtask_id: &SubTaskId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM subtasks WHERE subtask_id = ?1",
            params![subtask_id.to_string()],
        )?;

        if rows == 0 {
            return Err(StorageError::SubTaskNotFound {
                subtask_id: subtask_id.to_string(),
            });
        }
        Ok(())
    }

    fn subtasks_for_progress(
        &self,
        progress_id: &ProgressId,
    ) -> Result<Vec<SubTask>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT subtask_id, title, is_completed, progress_id
             FROM subtasks WHERE progress_id = ?1 ORDER BY title",
        )?;
        let raws = stmt
            .query_map(params![progress_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter()
            .map(|(id, title, is_completed, progress_id)| {
                Ok(SubTask::from_existing(
                    SubTaskId::from_string(&id)?,
                    title,
                    is_completed,
                    ProgressId::from_string(&progress_id)?,
                ))
            })
            .collect()
    }

    fn insert_task(&self, task: &OneTimeTask) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO one_time_tasks (task_id, title, is_completed, date, reminder_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.id.to_string(),
                task.title,
                task.is_completed,
                task.date,
                task.reminder_time,
            ],
        )?;
        Ok(())
    }

    fn update_task(&self, task: &OneTimeTask) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE one_time_tasks SET title = ?2, is_completed = ?3, date = ?4, reminder_time = ?5
             WHERE task_id = ?1",
            params![
                task.id.to_string(),
                task.title,
                task.is_completed,
                task.date,
                task.reminder_time,
            ],
        )?;

        if rows == 0 {
            return Err(StorageError::TaskNotFound {
                task_id: task.id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_task(&self, task_id: &TaskId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM one_time_tasks WHERE task_id = ?1",
            params![task_id.to_string()],
        )?;

        if rows == 0 {
            return Err(StorageError::TaskNotFound {
                task_id: task_id.to_string(),
            });
        }
        Ok(())
    }

    fn tasks_for_day(&self, date: NaiveDate) -> Result<Vec<OneTimeTask>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT task_id, title, is_completed, date, reminder_time
             FROM one_time_tasks WHERE date = ?1 ORDER BY title",
        )?;
        let raws = stmt
            .query_map(params![date], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, NaiveDate>(3)?,
                    row.get::<_, Option<NaiveTime>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter()
            .map(|(id, title, is_completed, date, reminder_time)| {
                Ok(OneTimeTask::from_existing(
                    TaskId::from_string(&id)?,
                    title,
                    is_completed,
                    date,
                    reminder_time,
                ))
            })
            .collect()
    }

    fn insert_image(&self, image: &ImageProgress) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO image_progress (image_id, habit_id, description, date, image_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                image.id.to_string(),
                image.habit_id.to_string(),
                image.description,
                image.date,
                image.image_path,
            ],
        )?;
        Ok(())
    }

    fn images_for_habit(&self, habit_id: &HabitId) -> Result<Vec<ImageProgress>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT image_id, habit_id, description, date, image_path
             FROM image_progress WHERE habit_id = ?1 ORDER BY date DESC",
        )?;
        let raws = stmt
            .query_map(params![habit_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, NaiveDate>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter()
            .map(|(id, habit_id, description, date, path)| {
                Ok(ImageProgress::from_existing(
                    ImageProgressId::from_string(&id)?,
                    HabitId::from_string(&habit_id)?,
                    description,
                    date,
                    path,
                ))
            })
            .collect()
    }

    fn delete_image(&self, image_id: &ImageProgressId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM image_progress WHERE image_id = ?1",
            params![image_id.to_string()],
        )?;

        if rows == 0 {
            return Err(StorageError::ImageNotFound {
                image_id: image_id.to_string(),
            });
        }
        Ok(())
    }

    fn all_progress(&self) -> Result<Vec<HabitProgress>, StorageError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM habit_progress ORDER BY date", PROGRESS_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
            .query_map([], Self::progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(RawProgress::into_progress).collect()
    }

    fn all_subtasks(&self) -> Result<Vec<SubTask>, StorageError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT subtask_id, title, is_completed, progress_id FROM subtasks")?;
        let raws = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter()
            .map(|(id, title, is_completed, progress_id)| {
                Ok(SubTask::from_existing(
                    SubTaskId::from_string(&id)?,
                    title,
                    is_completed,
                    ProgressId::from_string(&progress_id)?,
                ))
            })
            .collect()
    }

    fn all_tasks(&self) -> Result<Vec<OneTimeTask>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT task_id, title, is_completed, date, reminder_time FROM one_time_tasks",
        )?;
        let raws = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, NaiveDate>(3)?,
                    row.get::<_, Option<NaiveTime>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter()
            .map(|(id, title, is_completed, date, reminder_time)| {
                Ok(OneTimeTask::from_existing(
                    TaskId::from_string(&id)?,
                    title,
                    is_completed,
                    date,
                    reminder_time,
                ))
            })
            .collect()
    }

    fn all_images(&self) -> Result<Vec<ImageProgress>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT image_id, habit_id, description, date, image_path FROM image_progress")?;
        let raws = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, NaiveDate>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter()
            .map(|(id, habit_id, description, date, path)| {
                Ok(ImageProgress::from_existing(
                    ImageProgressId::from_string(&id)?,
                    HabitId::from_string(&habit_id)?,
                    description,
                    date,
                    path,
                ))
            })
            .collect()
    }

    fn delete_all_subtasks(&self) -> Result<(), StorageError> {
        self.conn()?.execute("DELETE FROM subtasks", [])?;
        Ok(())
    }

    fn delete_all_images(&self) -> Result<(), StorageError> {
        self.conn()?.execute("DELETE FROM image_progress", [])?;
        Ok(())
    }

    fn delete_all_progress(&self) -> Result<(), StorageError> {
        self.conn()?.execute("DELETE FROM habit_progress", [])?;
        Ok(())
    }

    fn delete_all_habits(&self) -> Result<(), StorageError> {
        self.conn()?.execute("DELETE FROM habits", [])?;
        Ok(())
    }

    fn delete_all_goals(&self) -> Result<(), StorageError> {
        self.conn()?.execute("DELETE FROM goals", [])?;
        Ok(())
    }

    fn delete_all_tasks(&self) -> Result<(), StorageError> {
        self.conn()?.execute("DELETE FROM one_time_tasks", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, HabitType, WeekdaySet};
    use chrono::NaiveDate;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn sample_habit() -> Habit {
        Habit::new(
            "Drink Water".to_string(),
            Some("8 glasses".to_string()),
            HabitType::Count,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "blue".to_string(),
            Some("glasses".to_string()),
            Some(8),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_habit_round_trip() {
        let store = store();
        let habit = sample_habit();

        store.upsert_habit(&habit).unwrap();
        let loaded = store.get_habit(&habit.id).unwrap();
        assert_eq!(loaded, habit);
    }

    #[test]
    fn test_habit_upsert_updates_in_place() {
        let store = store();
        let mut habit = sample_habit();
        store.upsert_habit(&habit).unwrap();

        habit.title = "Drink More Water".to_string();
        habit.current_streak = 3;
        store.upsert_habit(&habit).unwrap();

        let loaded = store.get_habit(&habit.id).unwrap();
        assert_eq!(loaded.title, "Drink More Water");
        assert_eq!(loaded.current_streak, 3);
        assert_eq!(store.list_habits(false).unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_habit_is_not_found() {
        let store = store();
        let result = store.get_habit(&HabitId::new());
        assert!(matches!(result, Err(StorageError::HabitNotFound { .. })));
    }

    #[test]
    fn test_progress_insert_if_absent_ignores_duplicates() {
        let store = store();
        let habit = sample_habit();
        store.upsert_habit(&habit).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let first = HabitProgress::materialized(&habit, date);
        let second = HabitProgress::materialized(&habit, date);

        assert!(store.insert_progress_if_absent(&first).unwrap());
        assert!(!store.insert_progress_if_absent(&second).unwrap());

        // The original row is untouched
        let loaded = store.progress_for(&habit.id, date).unwrap().unwrap();
        assert_eq!(loaded.id, first.id);
    }

    #[test]
    fn test_habit_delete_cascades() {
        let store = store();
        let habit = sample_habit();
        store.upsert_habit(&habit).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let progress = HabitProgress::materialized(&habit, date);
        store.insert_progress_if_absent(&progress).unwrap();
        store
            .insert_subtask(&SubTask::new("warm up".to_string(), progress.id))
            .unwrap();
        store
            .insert_image(
                &ImageProgress::new(habit.id, "day 1".to_string(), date, "/tmp/img.jpg".to_string())
                    .unwrap(),
            )
            .unwrap();

        store.delete_habit(&habit.id).unwrap();

        assert!(store.all_progress().unwrap().is_empty());
        assert!(store.all_subtasks().unwrap().is_empty());
        assert!(store.all_images().unwrap().is_empty());
    }

    #[test]
    fn test_goal_delete_ungroups_habits() {
        let store = store();
        let goal = Goal::new("Get fit".to_string(), None, None, None).unwrap();
        store.insert_goal(&goal).unwrap();

        let mut habit = sample_habit();
        habit.goal_id = Some(goal.id);
        store.upsert_habit(&habit).unwrap();

        store.delete_goal(&goal.id).unwrap();

        let loaded = store.get_habit(&habit.id).unwrap();
        assert_eq!(loaded.goal_id, None);
    }

    #[test]
    fn test_toggle_subtask() {
        let store = store();
        let habit = sample_habit();
        store.upsert_habit(&habit).unwrap();
        let progress =
            HabitProgress::materialized(&habit, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        store.insert_progress_if_absent(&progress).unwrap();

        let subtask = SubTask::new("stretch".to_string(), progress.id);
        store.insert_subtask(&subtask).unwrap();

        store.toggle_subtask(&subtask.id).unwrap();
        let loaded = store.subtasks_for_progress(&progress.id).unwrap();
        assert!(loaded[0].is_completed);

        store.toggle_subtask(&subtask.id).unwrap();
        let loaded = store.subtasks_for_progress(&progress.id).unwrap();
        assert!(!loaded[0].is_completed);
    }

    #[test]
    fn test_tasks_for_day() {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let other = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();

        store
            .insert_task(&OneTimeTask::new("Call dentist".to_string(), date, None).unwrap())
            .unwrap();
        store
            .insert_task(&OneTimeTask::new("Pay rent".to_string(), other, None).unwrap())
            .unwrap();

        let tasks = store.tasks_for_day(date).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Call dentist");
    }
}
