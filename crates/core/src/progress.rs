//! Progress reports over a week or month window.
//!
//! Field names on the wire are the ones existing clients read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::HabitId;

/// Progress over the Monday..Sunday week containing a reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    /// Habit the report is about
    #[serde(rename = "habito_id")]
    pub habit_id: HabitId,

    /// Habit name
    #[serde(rename = "habito")]
    pub habit_name: String,

    /// Monday of the week
    #[serde(rename = "inicio_semana")]
    pub window_start: NaiveDate,

    /// Sunday of the week
    #[serde(rename = "fin_semana")]
    pub window_end: NaiveDate,

    /// Completed / expected * 100, two decimals
    #[serde(rename = "progreso_semanal")]
    pub percent: f64,

    /// Completions marked done inside the window
    #[serde(rename = "completados")]
    pub completed: u32,

    /// Expected occurrences inside the window
    #[serde(rename = "total")]
    pub expected: u32,
}

/// Progress over the calendar month containing a reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProgress {
    /// Habit the report is about
    #[serde(rename = "habito_id")]
    pub habit_id: HabitId,

    /// Habit name
    #[serde(rename = "habito")]
    pub habit_name: String,

    /// First day of the month
    #[serde(rename = "inicio_mes")]
    pub window_start: NaiveDate,

    /// Last day of the month
    #[serde(rename = "fin_mes")]
    pub window_end: NaiveDate,

    /// Completed / expected * 100, two decimals
    #[serde(rename = "progreso_mensual")]
    pub percent: f64,

    /// Completions marked done inside the window
    #[serde(rename = "completados")]
    pub completed: u32,

    /// Expected occurrences inside the window
    #[serde(rename = "total")]
    pub expected: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_wire_names() {
        let report = WeeklyProgress {
            habit_id: HabitId::new(),
            habit_name: "Leer".into(),
            window_start: NaiveDate::from_ymd_opt(2025, 10, 6).unwrap(),
            window_end: NaiveDate::from_ymd_opt(2025, 10, 12).unwrap(),
            percent: 66.67,
            completed: 2,
            expected: 3,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["inicio_semana"], "2025-10-06");
        assert_eq!(value["fin_semana"], "2025-10-12");
        assert_eq!(value["progreso_semanal"], 66.67);
        assert_eq!(value["completados"], 2);
        assert_eq!(value["total"], 3);
        assert_eq!(value["habito"], "Leer");
        assert!(value.get("habito_id").is_some());
    }

    #[test]
    fn test_monthly_wire_names() {
        let report = MonthlyProgress {
            habit_id: HabitId::new(),
            habit_name: "Correr".into(),
            window_start: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            window_end: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            percent: 0.0,
            completed: 0,
            expected: 28,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["inicio_mes"], "2025-02-01");
        assert_eq!(value["fin_mes"], "2025-02-28");
        assert_eq!(value["progreso_mensual"], 0.0);
        assert_eq!(value["total"], 28);
    }
}
