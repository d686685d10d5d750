/// Main entry point for the Habitized CLI
///
/// A thin driver over the library: shows the day view, runs backups and
/// restores, and can host the daily automatic backup worker in the
/// foreground. Logging goes to stderr so command output stays clean.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use habitized::{BackupKind, HabitService, Status};

/// Get the default data directory with a robust fallback strategy
fn get_default_data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Try various locations in order of preference
    let potential_paths = [
        // 1. User's home directory (preferred)
        dirs::home_dir().map(|mut p| {
            p.push(".habitized");
            p
        }),
        // 2. User's data directory (platform-specific)
        dirs::data_dir().map(|mut p| {
            p.push("habitized");
            p
        }),
        // 3. User's config directory
        dirs::config_dir().map(|mut p| {
            p.push("habitized");
            p
        }),
        // 4. Current working directory (last resort)
        std::env::current_dir().ok().map(|mut p| {
            p.push(".habitized");
            p
        }),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if let Ok(()) = std::fs::create_dir_all(potential_path) {
            // Test if we can write to this directory
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.clone());
            }
        }
    }

    // Ultimate fallback: use a temporary directory
    let mut temp_path = std::env::temp_dir();
    temp_path.push("habitized");
    std::fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for data: {}", temp_path.display());
    Ok(temp_path)
}

/// Backups default to the user-visible download folder so documents survive
/// an uninstall of the app data directory
fn get_default_backup_dir(data_dir: &std::path::Path) -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| data_dir.join("backups"))
}

/// Command line arguments for the Habitized CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the database, images and preferences
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory backup documents are written to and read from
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the habits and tasks due on a date (default: today)
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create a manual backup document
    Backup,
    /// Restore a backup document, replacing all existing data
    Restore { file: PathBuf },
    /// List available backup documents
    Backups,
    /// Delete a backup document by file name
    DeleteBackup { file_name: String },
    /// Enable or disable the daily automatic backup
    AutoBackup {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Run the daily automatic backup worker in the foreground
    Worker,
}

fn status_marker(status: Status) -> &'static str {
    match status {
        Status::Done => "[x]",
        Status::Skipped => "[-]",
        Status::Ongoing => "[~]",
        Status::NotStarted => "[ ]",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("habitized={}", log_level))
        .with_writer(std::io::stderr) // Keep stdout for command output
        .init();

    let data_dir = match args.data_dir {
        Some(path) => {
            std::fs::create_dir_all(&path)?;
            path
        }
        None => get_default_data_dir()?,
    };
    let backup_dir = args
        .backup_dir
        .unwrap_or_else(|| get_default_backup_dir(&data_dir));

    info!("Using data directory: {}", data_dir.display());

    let service = HabitService::open(&data_dir, backup_dir)?;

    match args.command {
        Command::Today { date } => {
            let view = match date {
                Some(date) => service.load_day(date)?,
                None => service.load_today()?,
            };

            println!("{}", view.date);
            if view.habits.is_empty() && view.tasks.is_empty() {
                println!("  nothing due");
            }
            for entry in &view.habits {
                let streak = entry.habit.current_streak;
                println!(
                    "  {} {} ({} day streak)",
                    status_marker(entry.progress.status),
                    entry.habit.title,
                    streak
                );
                for subtask in &entry.subtasks {
                    let marker = if subtask.is_completed { "[x]" } else { "[ ]" };
                    println!("      {} {}", marker, subtask.title);
                }
            }
            for task in &view.tasks {
                let marker = if task.is_completed { "[x]" } else { "[ ]" };
                println!("  {} {} (task)", marker, task.title);
            }
        }
        Command::Backup => {
            let path = service.create_backup(BackupKind::Manual)?;
            println!("Backup written to {}", path.display());
        }
        Command::Restore { file } => {
            let summary = service.backup_summary(&file)?;
            service.restore_backup(&file)?;
            println!(
                "Restored {} habits, {} progress records, {} goals, {} tasks, {} images",
                summary.habits, summary.progress, summary.goals, summary.tasks, summary.images
            );
        }
        Command::Backups => {
            let backups = service.list_backups();
            if backups.is_empty() {
                println!("No backups found");
            }
            for info in backups {
                println!(
                    "{}  {}  {}",
                    info.file_name, info.modified, info.size_display
                );
            }
        }
        Command::DeleteBackup { file_name } => {
            service.delete_backup(&file_name)?;
            println!("Deleted {}", file_name);
        }
        Command::AutoBackup { state } => {
            let enabled = state == "on";
            service.set_auto_backup(enabled)?;
            println!(
                "Automatic daily backup is now {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        Command::Worker => {
            info!("Starting daily backup worker");
            service.backup_worker().run().await;
        }
    }

    Ok(())
}
