//! Calendar windows progress is measured over.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// First day
    pub start: NaiveDate,
    /// Last day, inclusive
    pub end: NaiveDate,
}

impl Window {
    /// Monday..Sunday of the week containing `date`, clamped to the
    /// representable date range.
    pub fn week_of(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday() as u64;
        let start = date.checked_sub_days(Days::new(offset)).unwrap_or(NaiveDate::MIN);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// First..last day of the month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_days(Days::new(days_in_month(date) as u64 - 1))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day of the window in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Number of days in the month containing `date` (28-31).
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(first)) => (next - first).num_days() as u32,
        _ => 31,
    }
}

/// Rows the month containing `date` occupies on a Monday-first calendar grid
/// (4-6).
pub fn week_rows_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let leading = first.weekday().num_days_from_monday();
    (leading + days_in_month(date)).div_ceil(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_of_runs_monday_to_sunday() {
        // 2025-10-12 is a Sunday
        let w = Window::week_of(date(2025, 10, 12));
        assert_eq!(w.start, date(2025, 10, 6));
        assert_eq!(w.end, date(2025, 10, 12));

        // A Monday is its own week start
        let w = Window::week_of(date(2025, 10, 13));
        assert_eq!(w.start, date(2025, 10, 13));
        assert_eq!(w.end, date(2025, 10, 19));
    }

    #[test]
    fn test_week_of_spans_month_boundary() {
        // 2025-10-01 is a Wednesday
        let w = Window::week_of(date(2025, 10, 1));
        assert_eq!(w.start, date(2025, 9, 29));
        assert_eq!(w.end, date(2025, 10, 5));
        assert_eq!(w.days().count(), 7);
    }

    #[test]
    fn test_month_of() {
        let w = Window::month_of(date(2024, 2, 17));
        assert_eq!(w.start, date(2024, 2, 1));
        assert_eq!(w.end, date(2024, 2, 29));

        let w = Window::month_of(date(2025, 12, 31));
        assert_eq!(w.start, date(2025, 12, 1));
        assert_eq!(w.end, date(2025, 12, 31));
        assert!(w.contains(date(2025, 12, 15)));
        assert!(!w.contains(date(2026, 1, 1)));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2025, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2025, 4, 1)), 30);
        assert_eq!(days_in_month(date(2025, 12, 1)), 31);
    }

    #[test]
    fn test_week_rows_in_month() {
        // February 2021 starts on a Monday and has 28 days
        assert_eq!(week_rows_in_month(date(2021, 2, 1)), 4);
        // October 2025 starts on a Wednesday
        assert_eq!(week_rows_in_month(date(2025, 10, 1)), 5);
        // March 2025 starts on a Saturday with 31 days
        assert_eq!(week_rows_in_month(date(2025, 3, 1)), 6);
    }

    #[test]
    fn test_windows_at_range_edges_do_not_overflow() {
        let w = Window::week_of(NaiveDate::MAX);
        assert_eq!(w.end, NaiveDate::MAX);
        assert!(w.contains(NaiveDate::MAX));

        let w = Window::week_of(NaiveDate::MIN);
        assert_eq!(w.start, NaiveDate::MIN);

        let w = Window::month_of(NaiveDate::MAX);
        assert_eq!(w.end, NaiveDate::MAX);
    }
}
