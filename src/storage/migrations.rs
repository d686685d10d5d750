/// Database migration management
///
/// This module handles creating and updating the SQLite schema. It ensures
/// the database has all required tables, foreign keys and indexes, and
/// tracks a numeric version that backup documents are checked against.

use rusqlite::Connection;

use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations. Backup documents created
/// against a newer version are rejected on restore.
pub const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// Creates all required tables and indexes if they don't exist and records
/// the schema version for future migrations. Safe to call repeatedly.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    // Create version tracking table first
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

/// Get the current database schema version
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .unwrap_or(0); // Default to version 0 if no version record exists

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    // Future migrations would go here:
    // if from_version < 2 {
    //     migration_v2(conn)?;
    // }

    Ok(())
}

/// Migration to version 1: Create initial tables
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS goals (
            goal_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            start_date TEXT,
            target_date TEXT,
            progress INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS habits (
            habit_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            type TEXT NOT NULL,
            goal_id TEXT REFERENCES goals (goal_id) ON DELETE SET NULL,
            start_date TEXT NOT NULL,
            frequency TEXT NOT NULL,
            days_of_week TEXT NOT NULL,
            days_of_month TEXT,
            reminder_type TEXT,
            reminder_from TEXT,
            reminder_to TEXT,
            reminder_interval INTEGER,
            reminder_time TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            color_key TEXT NOT NULL,
            count_param TEXT,
            count_target INTEGER,
            duration TEXT,
            current_streak INTEGER NOT NULL DEFAULT 0,
            max_streak INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS habit_progress (
            progress_id TEXT PRIMARY KEY,
            habit_id TEXT NOT NULL REFERENCES habits (habit_id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            type TEXT NOT NULL,
            count_param TEXT,
            current_count INTEGER,
            target_count INTEGER,
            target_duration TEXT,
            current_session INTEGER,
            target_session INTEGER,
            status TEXT NOT NULL,
            notes TEXT,
            excuse TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subtasks (
            subtask_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            is_completed BOOLEAN NOT NULL DEFAULT FALSE,
            progress_id TEXT NOT NULL REFERENCES habit_progress (progress_id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS image_progress (
            image_id TEXT PRIMARY KEY,
            habit_id TEXT NOT NULL REFERENCES habits (habit_id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            image_path TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS one_time_tasks (
            task_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            is_completed BOOLEAN NOT NULL DEFAULT FALSE,
            date TEXT NOT NULL,
            reminder_time TEXT
        )",
        [],
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}

/// Create database indexes for version 1
fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // One progress record per habit per day; the materializer relies on
    // this to make duplicate insertion a benign no-op
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_progress_habit_date
         ON habit_progress (habit_id, date)",
        [],
    )?;

    // Day view lookup
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_progress_date
         ON habit_progress (date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_active
         ON habits (is_active)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subtasks_progress
         ON subtasks (progress_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_images_habit
         ON image_progress (habit_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_date
         ON one_time_tasks (date)",
        [],
    )?;

    tracing::info!("Created database indexes for v1");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_initialize_database() {
        let conn = Connection::open_in_memory().unwrap();

        // Should succeed on a fresh database
        assert!(initialize_database(&conn).is_ok());

        // Should succeed when called again (idempotent)
        assert!(initialize_database(&conn).is_ok());

        let table_count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN \
                 ('goals', 'habits', 'habit_progress', 'subtasks', 'image_progress', 'one_time_tasks')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 6);
    }

    #[test]
    fn test_version_tracking() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_database(&conn).unwrap();
        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_progress_uniqueness_index() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_database(&conn).unwrap();

        conn.execute(
            "INSERT INTO habits (habit_id, title, type, start_date, frequency, days_of_week, color_key)
             VALUES ('h1', 'Test', 'OneTime', '2024-01-01', 'Daily', '0,0,0,0,0,0,0', 'blue')",
            [],
        )
        .unwrap();

        let insert = "INSERT OR IGNORE INTO habit_progress (progress_id, habit_id, date, type, status)
                      VALUES (?1, 'h1', '2024-01-02', 'OneTime', 'NotStarted')";
        let first = conn.execute(insert, ["p1"]).unwrap();
        let second = conn.execute(insert, ["p2"]).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0); // constraint hit is silently ignored
    }
}
