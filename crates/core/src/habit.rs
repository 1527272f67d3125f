//! Habit model - a recurring activity a user wants to keep up.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::id::{CategoryId, HabitId, UserId};
use crate::recurrence::{deserialize_day_tokens, resolve_days, resolve_days_lenient, DayToken, Frequency};
use crate::Time;

/// A habit with its recurrence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier
    pub id: HabitId,

    /// Owning user
    pub user_id: UserId,

    /// Optional category
    #[serde(default)]
    pub category_id: Option<CategoryId>,

    /// Habit name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Free-form difficulty label
    #[serde(default)]
    pub difficulty: Option<String>,

    /// First day the habit applies
    pub start_date: NaiveDate,

    /// Recurrence kind
    pub frequency: Frequency,

    /// Configured days as raw tokens, interpreted by `frequency`
    #[serde(default, deserialize_with = "deserialize_day_tokens")]
    pub days: Vec<String>,

    /// Visible to other users
    #[serde(default)]
    pub public: bool,

    /// Whether the habit is currently tracked
    #[serde(default = "default_active")]
    pub active: bool,

    /// Reminder times
    #[serde(default)]
    pub reminders: Vec<Reminder>,

    /// Display icon
    #[serde(default)]
    pub icon: Option<String>,

    /// Display color
    #[serde(default)]
    pub color: Option<String>,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

fn default_active() -> bool {
    true
}

/// A reminder at a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Local time of day
    pub at: NaiveTime,
}

impl Habit {
    /// Create an active habit with no configured days.
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: HabitId::new(),
            user_id,
            category_id: None,
            name: name.into(),
            description: String::new(),
            difficulty: None,
            start_date,
            frequency,
            days: Vec::new(),
            public: false,
            active: true,
            reminders: Vec::new(),
            icon: None,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set configured days.
    pub fn with_days<I, T>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.days = days.into_iter().map(|d| d.to_string()).collect();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Check the habit can be stored: the name is not blank and every
    /// configured day fits the frequency.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Blank("habit name"));
        }
        resolve_days(&self.frequency, &self.days)?;
        Ok(())
    }

    /// Configured days resolved against the frequency, ignoring tokens that
    /// do not fit.
    pub fn resolved_days(&self) -> Vec<DayToken> {
        resolve_days_lenient(&self.frequency, &self.days)
    }

    /// Mark the habit as modified now.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

/// Filter for listing habits.
#[derive(Debug, Clone, Default)]
pub struct HabitFilter {
    /// Only habits of this user
    pub user_id: Option<UserId>,
    /// Only habits with this active flag
    pub active: Option<bool>,
    /// Only habits in this category
    pub category_id: Option<CategoryId>,
}

impl HabitFilter {
    /// Whether a habit passes the filter.
    pub fn matches(&self, habit: &Habit) -> bool {
        self.user_id.map_or(true, |id| habit.user_id == id)
            && self.active.map_or(true, |active| habit.active == active)
            && self.category_id.map_or(true, |id| habit.category_id == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_validate_blank_name() {
        let habit = Habit::new(UserId::new(), "   ", Frequency::Daily, date("2025-10-01"));
        assert_eq!(habit.validate(), Err(CoreError::Blank("habit name")));
    }

    #[test]
    fn test_validate_days_by_frequency() {
        let user = UserId::new();
        let weekly = Habit::new(user, "Leer", Frequency::Weekly, date("2025-10-01"))
            .with_days(["lun", "mie", "vie"]);
        assert!(weekly.validate().is_ok());

        let monthly_bad = Habit::new(user, "Pagar", Frequency::Monthly, date("2025-10-01"))
            .with_days(["Mon"]);
        assert!(matches!(
            monthly_bad.validate(),
            Err(CoreError::InvalidDayToken { .. })
        ));
    }

    #[test]
    fn test_deserialize_legacy_document() {
        let json = r#"{
            "id": "01JA0000000000000000000000",
            "user_id": "01JA0000000000000000000001",
            "name": "Pagar renta",
            "start_date": "2025-10-01",
            "frequency": "Mensual",
            "days": [5, 15, "25"],
            "created_at": "2025-10-01T00:00:00Z",
            "updated_at": "2025-10-01T00:00:00Z"
        }"#;
        let habit: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(habit.frequency, Frequency::Monthly);
        assert_eq!(habit.days, vec!["5", "15", "25"]);
        assert!(habit.active);
        assert!(!habit.public);
        assert_eq!(
            habit.resolved_days(),
            vec![DayToken::DayOfMonth(5), DayToken::DayOfMonth(15), DayToken::DayOfMonth(25)]
        );
    }

    #[test]
    fn test_filter_matches() {
        let user = UserId::new();
        let mut habit = Habit::new(user, "Correr", Frequency::Daily, date("2025-10-01"));
        assert!(HabitFilter::default().matches(&habit));
        assert!(HabitFilter { user_id: Some(user), ..Default::default() }.matches(&habit));
        assert!(!HabitFilter { user_id: Some(UserId::new()), ..Default::default() }.matches(&habit));

        habit.active = false;
        assert!(!HabitFilter { active: Some(true), ..Default::default() }.matches(&habit));
    }
}
