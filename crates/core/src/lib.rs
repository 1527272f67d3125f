//! Rutinia core data models.
//!
//! This crate defines the habits, completion records and progress reports
//! shared by the storage backends and the progress tracker.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;

// Directory
mod user;

// Habits and their records
mod recurrence;
mod habit;
mod completion;
mod progress;

// Re-exports
pub use id::*;
pub use error::{CoreError, Result};

pub use user::{User, Role, Category};

pub use recurrence::{
    Frequency, DayToken, parse_weekday, parse_day_of_month, resolve_days, resolve_days_lenient,
    deserialize_day_tokens,
};
pub use habit::{Habit, HabitFilter, Reminder};
pub use completion::{Completion, parse_date};
pub use progress::{WeeklyProgress, MonthlyProgress};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
