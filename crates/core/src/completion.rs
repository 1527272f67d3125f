//! Completion records - whether a habit was done on a given date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::id::{CompletionId, HabitId};
use crate::Time;

/// A dated record of whether a habit was performed.
///
/// At most one completion exists per `(habit_id, date)`; storage backends
/// upsert on that pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Unique identifier
    pub id: CompletionId,

    /// Owning habit
    pub habit_id: HabitId,

    /// Calendar date
    pub date: NaiveDate,

    /// Completed or not
    pub state: bool,

    /// Last write
    pub updated_at: Time,
}

impl Completion {
    /// Create a new completion record.
    pub fn new(habit_id: HabitId, date: NaiveDate, state: bool) -> Self {
        Self {
            id: CompletionId::new(),
            habit_id,
            date,
            state,
            updated_at: chrono::Utc::now(),
        }
    }
}

/// Parse an ISO calendar date (`YYYY-MM-DD`, four-digit year).
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if !is_iso_date_shape(trimmed) {
        return Err(CoreError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDate(raw.to_string()))
}

// chrono alone also accepts signed and extended years.
fn is_iso_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
