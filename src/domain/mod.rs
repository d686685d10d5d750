/// Domain module containing core entities and their validation rules
///
/// This module defines the canonical representations of Habit, HabitProgress,
/// SubTask, Goal, ImageProgress and OneTimeTask, plus the closed enumerations
/// they use. No storage or scheduling behavior lives here.

pub mod habit;
pub mod progress;
pub mod goal;
pub mod task;
pub mod image;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use progress::*;
pub use goal::*;
pub use task::*;
pub use image::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain validation
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("Unrecognized {what} value: '{value}'")]
    UnknownValue { what: &'static str, value: String },
}
