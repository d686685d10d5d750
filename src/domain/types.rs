/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier newtypes, the closed habit/frequency/status
/// enumerations with their text round-trip, and the weekday selector used by
/// weekly habits.

use serde::{Deserialize, Serialize};
use chrono::Weekday;
use uuid::Uuid;

use crate::domain::DomainError;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from its string form (used when loading
            /// from the database or a backup document)
            pub fn from_string(s: &str) -> Result<Self, DomainError> {
                Uuid::parse_str(s).map(Self).map_err(|_| DomainError::UnknownValue {
                    what: stringify!($name),
                    value: s.to_string(),
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a habit
    HabitId
);
entity_id!(
    /// Unique identifier for one calendar-day progress record of a habit
    ProgressId
);
entity_id!(
    /// Unique identifier for a goal
    GoalId
);
entity_id!(
    /// Unique identifier for a subtask attached to a progress record
    SubTaskId
);
entity_id!(
    /// Unique identifier for a photographic progress log entry
    ImageProgressId
);
entity_id!(
    /// Unique identifier for a one-time task
    TaskId
);

/// What kind of completion target a habit carries
///
/// The type decides which target fields on the habit and its progress records
/// are populated: Count needs a count target and unit, Duration and Session
/// need a duration, OneTime needs neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HabitType {
    /// Reach a numeric count (e.g. 8 glasses of water)
    Count,
    /// Run a single timer for a target duration
    Duration,
    /// Complete a number of timed sessions
    Session,
    /// A habit done once per due day with no measured target
    OneTime,
}

impl HabitType {
    /// Stable text form used by the database and backup documents
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitType::Count => "Count",
            HabitType::Duration => "Duration",
            HabitType::Session => "Session",
            HabitType::OneTime => "OneTime",
        }
    }

    /// Parse the text form, rejecting anything unrecognized
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "Count" => Ok(HabitType::Count),
            "Duration" => Ok(HabitType::Duration),
            "Session" => Ok(HabitType::Session),
            "OneTime" => Ok(HabitType::OneTime),
            other => Err(DomainError::UnknownValue {
                what: "HabitType",
                value: other.to_string(),
            }),
        }
    }
}

/// How often a habit recurs
///
/// The associated day selector lives on the habit itself: a `WeekdaySet` for
/// Weekly habits and a list of month-days for Monthly habits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Due every single day
    Daily,
    /// Due on the weekdays selected in the habit's `WeekdaySet`
    Weekly,
    /// Due on the selected days of the month; a day past the end of a
    /// shorter month is simply never due that month
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "Daily" => Ok(Frequency::Daily),
            "Weekly" => Ok(Frequency::Weekly),
            "Monthly" => Ok(Frequency::Monthly),
            other => Err(DomainError::UnknownValue {
                what: "Frequency",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a single progress record
///
/// This is a reactive toggle model: every status is reachable from every
/// other via an explicit user or timer action, there are no terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    NotStarted,
    Ongoing,
    Done,
    Skipped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "NotStarted",
            Status::Ongoing => "Ongoing",
            Status::Done => "Done",
            Status::Skipped => "Skipped",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "NotStarted" => Ok(Status::NotStarted),
            "Ongoing" => Ok(Status::Ongoing),
            "Done" => Ok(Status::Done),
            "Skipped" => Ok(Status::Skipped),
            other => Err(DomainError::UnknownValue {
                what: "Status",
                value: other.to_string(),
            }),
        }
    }
}

/// Weekday selector for weekly habits
///
/// Stored as seven flags, Monday first. The text form is the comma-joined
/// flag list ("1,0,1,1,0,0,0") that the database and backup documents carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdaySet([bool; 7]);

impl WeekdaySet {
    /// An empty selector (no weekday chosen)
    pub fn empty() -> Self {
        Self([false; 7])
    }

    /// Build a selector from explicit weekdays
    pub fn from_days(days: &[Weekday]) -> Self {
        let mut flags = [false; 7];
        for day in days {
            flags[day.num_days_from_monday() as usize] = true;
        }
        Self(flags)
    }

    /// Parse the comma-joined flag list; exactly seven 0/1 fields expected
    pub fn from_flags(s: &str) -> Result<Self, DomainError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 7 {
            return Err(DomainError::UnknownValue {
                what: "WeekdaySet",
                value: s.to_string(),
            });
        }
        let mut flags = [false; 7];
        for (i, part) in parts.iter().enumerate() {
            flags[i] = match part.trim() {
                "0" => false,
                "1" => true,
                _ => {
                    return Err(DomainError::UnknownValue {
                        what: "WeekdaySet",
                        value: s.to_string(),
                    })
                }
            };
        }
        Ok(Self(flags))
    }

    /// The comma-joined flag list form
    pub fn to_flags(&self) -> String {
        self.0
            .iter()
            .map(|f| if *f { "1" } else { "0" })
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|f| *f)
    }
}

impl Default for WeekdaySet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Join month-days into the comma list stored by the database and backups
pub fn month_days_to_csv(days: &[u32]) -> String {
    days.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(",")
}

/// Parse a comma list of month-days (1-31), rejecting anything else
pub fn month_days_from_csv(s: &str) -> Result<Vec<u32>, DomainError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .ok()
                .filter(|d| (1..=31).contains(d))
                .ok_or_else(|| DomainError::UnknownValue {
                    what: "days_of_month",
                    value: s.to_string(),
                })
        })
        .collect()
}
