//! Habit Progress Tracking
//!
//! Calendar windows, the expected-vs-completed engine, and the tracker
//! service that ties them to storage.

#![warn(missing_docs)]

pub mod window;
pub mod engine;
pub mod tracker;

pub use window::{Window, days_in_month, week_rows_in_month};
pub use engine::{weekly_progress, monthly_progress, expected_in_week, expected_in_month, percent};
pub use tracker::{
    ProgressTracker, BasicProgressTracker, TrackerConfig, Clock, ToggleOutcome, ProgressSnapshot,
    ProgressError, Result, parse_habit_id, parse_user_id,
};
