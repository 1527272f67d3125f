//! Expected-vs-completed progress over week and month windows.
//!
//! Everything here is a pure function of a habit, its completion records and
//! a reference date. Loading those from storage is the tracker's job.

use chrono::{Datelike, NaiveDate};
use rutinia_core::{Completion, Frequency, Habit, MonthlyProgress, WeeklyProgress};
use std::collections::HashSet;

use crate::window::{days_in_month, week_rows_in_month, Window};

/// Occurrences a habit is expected to have in the week `window`.
///
/// - daily: 7
/// - weekly: number of configured days, without checking them against the window
/// - monthly: days of the window whose day-of-month is configured
/// - anything else: 0
pub fn expected_in_week(habit: &Habit, window: &Window) -> u32 {
    match habit.frequency {
        Frequency::Daily => 7,
        Frequency::Weekly => habit.days.len() as u32,
        Frequency::Monthly => {
            let configured: HashSet<u32> = habit
                .resolved_days()
                .iter()
                .filter_map(|d| d.day_of_month())
                .collect();
            window.days().filter(|d| configured.contains(&d.day())).count() as u32
        }
        Frequency::Other(_) => 0,
    }
}

/// Occurrences a habit is expected to have in the month `window`.
///
/// - daily: days in the month
/// - weekly: configured days times the week rows the month spans on a
///   Monday-first grid (an approximation, not an exact weekday count)
/// - monthly: configured days that exist in this month, or 1 if none do
/// - anything else: 0
pub fn expected_in_month(habit: &Habit, window: &Window) -> u32 {
    let last_day = days_in_month(window.start);
    match habit.frequency {
        Frequency::Daily => last_day,
        Frequency::Weekly => habit.days.len() as u32 * week_rows_in_month(window.start),
        Frequency::Monthly => {
            let valid = habit
                .resolved_days()
                .iter()
                .filter_map(|d| d.day_of_month())
                .filter(|day| *day <= last_day)
                .count() as u32;
            if valid == 0 { 1 } else { valid }
        }
        Frequency::Other(_) => 0,
    }
}

/// Completions of `habit` marked done inside `window`.
pub fn completed_in(habit: &Habit, completions: &[Completion], window: &Window) -> u32 {
    completions
        .iter()
        .filter(|c| c.habit_id == habit.id && c.state && window.contains(c.date))
        .count() as u32
}

/// `completed / expected * 100` rounded to two decimals, 0 when nothing is
/// expected.
pub fn percent(completed: u32, expected: u32) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    let raw = completed as f64 / expected as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Progress over the Monday..Sunday week containing `reference`.
pub fn weekly_progress(habit: &Habit, completions: &[Completion], reference: NaiveDate) -> WeeklyProgress {
    let window = Window::week_of(reference);
    let expected = expected_in_week(habit, &window);
    let completed = completed_in(habit, completions, &window);

    WeeklyProgress {
        habit_id: habit.id,
        habit_name: habit.name.clone(),
        window_start: window.start,
        window_end: window.end,
        percent: percent(completed, expected),
        completed,
        expected,
    }
}

/// Progress over the calendar month containing `reference`.
pub fn monthly_progress(habit: &Habit, completions: &[Completion], reference: NaiveDate) -> MonthlyProgress {
    let window = Window::month_of(reference);
    let expected = expected_in_month(habit, &window);
    let completed = completed_in(habit, completions, &window);

    MonthlyProgress {
        habit_id: habit.id,
        habit_name: habit.name.clone(),
        window_start: window.start,
        window_end: window.end,
        percent: percent(completed, expected),
        completed,
        expected,
    }
}
