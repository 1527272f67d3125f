//! Progress tracking service.
//!
//! Resolves habit and user ids against storage, feeds the engine, and owns
//! the completion toggle.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rutinia_core::{
    parse_date, Completion, CoreError, Habit, HabitFilter, HabitId, MonthlyProgress, UserId,
    WeeklyProgress,
};
use rutinia_storage::{Storage, StorageError};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::engine;
use crate::window::Window;

/// Error type for progress operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors surfaced by the tracker.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Habit or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] CoreError),

    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Where "today" comes from when no reference date is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Local calendar date of the host
    #[default]
    Local,
    /// UTC calendar date
    Utc,
    /// A fixed date
    Fixed(NaiveDate),
}

impl Clock {
    /// Today's date according to this clock.
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Local => chrono::Local::now().date_naive(),
            Clock::Utc => Utc::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Configuration for the progress tracker.
#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    /// Source of the default reference date
    pub clock: Clock,
    /// Include inactive habits in snapshots
    pub include_inactive: bool,
}

/// Result of a completion toggle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleOutcome {
    /// The stored completion
    pub completion: Completion,
    /// True if the record was created, false if an existing one was updated
    pub created: bool,
}

/// Progress of every habit of a user at one reference date.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Whose habits
    pub user_id: UserId,

    /// Date the windows were computed around
    pub reference_date: NaiveDate,

    /// Weekly progress per habit
    pub weekly: Vec<WeeklyProgress>,

    /// Monthly progress per habit
    pub monthly: Vec<MonthlyProgress>,
}

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Progress over the week containing `reference` (today if `None`).
    async fn weekly_progress(
        &self,
        habit_id: HabitId,
        reference: Option<NaiveDate>,
    ) -> Result<WeeklyProgress>;

    /// Progress over the month containing `reference` (today if `None`).
    async fn monthly_progress(
        &self,
        habit_id: HabitId,
        reference: Option<NaiveDate>,
    ) -> Result<MonthlyProgress>;

    /// Mark a habit done or not done on `date` (`YYYY-MM-DD`). Repeated calls
    /// for the same habit and date overwrite the same record.
    async fn toggle(&self, habit_id: HabitId, date: &str, completed: bool) -> Result<ToggleOutcome>;

    /// Weekly and monthly progress for every habit of a user.
    async fn snapshot(&self, user_id: UserId, reference: Option<NaiveDate>) -> Result<ProgressSnapshot>;
}

/// Parse a habit id, treating malformed ids as missing habits.
pub fn parse_habit_id(raw: &str) -> Result<HabitId> {
    raw.trim()
        .parse()
        .map_err(|_| ProgressError::NotFound(format!("habit {}", raw)))
}

/// Parse a user id, treating malformed ids as missing users.
pub fn parse_user_id(raw: &str) -> Result<UserId> {
    raw.trim()
        .parse()
        .map_err(|_| ProgressError::NotFound(format!("user {}", raw)))
}

/// Basic progress tracker implementation.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<Mutex<S>>,
    config: TrackerConfig,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(storage: S) -> Self {
        Self::from_shared(Arc::new(Mutex::new(storage)))
    }

    /// Create a tracker over storage shared with other services.
    pub fn from_shared(storage: Arc<Mutex<S>>) -> Self {
        Self {
            storage,
            config: TrackerConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared handle to the underlying storage.
    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    fn reference(&self, reference: Option<NaiveDate>) -> NaiveDate {
        reference.unwrap_or_else(|| self.config.clock.today())
    }

    /// Load a habit and its completions inside `window`.
    async fn load_window(&self, habit_id: HabitId, window: Window) -> Result<(Habit, Vec<Completion>)> {
        let storage = self.storage.lock().await;
        let habit = storage
            .load_habit(habit_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound(format!("habit {}", habit_id)))?;
        let completions = storage
            .query_completions(habit_id, window.start, window.end)
            .await?;
        Ok((habit, completions))
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn weekly_progress(
        &self,
        habit_id: HabitId,
        reference: Option<NaiveDate>,
    ) -> Result<WeeklyProgress> {
        let reference = self.reference(reference);
        let (habit, completions) = self.load_window(habit_id, Window::week_of(reference)).await?;
        let report = engine::weekly_progress(&habit, &completions, reference);
        debug!(
            "Weekly progress for {}: {}/{} ({}%)",
            habit_id, report.completed, report.expected, report.percent
        );
        Ok(report)
    }

    async fn monthly_progress(
        &self,
        habit_id: HabitId,
        reference: Option<NaiveDate>,
    ) -> Result<MonthlyProgress> {
        let reference = self.reference(reference);
        let (habit, completions) = self.load_window(habit_id, Window::month_of(reference)).await?;
        let report = engine::monthly_progress(&habit, &completions, reference);
        debug!(
            "Monthly progress for {}: {}/{} ({}%)",
            habit_id, report.completed, report.expected, report.percent
        );
        Ok(report)
    }

    async fn toggle(&self, habit_id: HabitId, date: &str, completed: bool) -> Result<ToggleOutcome> {
        let date = parse_date(date)?;

        // Held across the lookup and the write so toggles on one key serialize.
        let mut storage = self.storage.lock().await;
        if storage.load_habit(habit_id).await?.is_none() {
            return Err(ProgressError::NotFound(format!("habit {}", habit_id)));
        }
        let outcome = storage.upsert_completion(habit_id, date, completed).await?;

        info!(
            "{} completion for habit {} on {} (state: {})",
            if outcome.created { "Created" } else { "Updated" },
            habit_id,
            date,
            completed
        );
        Ok(ToggleOutcome {
            completion: outcome.completion,
            created: outcome.created,
        })
    }

    async fn snapshot(&self, user_id: UserId, reference: Option<NaiveDate>) -> Result<ProgressSnapshot> {
        let reference = self.reference(reference);
        let week = Window::week_of(reference);
        let month = Window::month_of(reference);
        let range = Window {
            start: week.start.min(month.start),
            end: week.end.max(month.end),
        };

        let storage = self.storage.lock().await;
        if storage.load_user(user_id).await?.is_none() {
            return Err(ProgressError::NotFound(format!("user {}", user_id)));
        }
        let filter = HabitFilter {
            user_id: Some(user_id),
            active: if self.config.include_inactive { None } else { Some(true) },
            ..Default::default()
        };
        let habits = storage.list_habits(&filter).await?;

        let mut weekly = Vec::with_capacity(habits.len());
        let mut monthly = Vec::with_capacity(habits.len());
        for habit in &habits {
            let completions = storage
                .query_completions(habit.id, range.start, range.end)
                .await?;
            weekly.push(engine::weekly_progress(habit, &completions, reference));
            monthly.push(engine::monthly_progress(habit, &completions, reference));
        }

        Ok(ProgressSnapshot {
            timestamp: Utc::now(),
            user_id,
            reference_date: reference,
            weekly,
            monthly,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rutinia_core::{Frequency, User};
    use rutinia_storage::JsonStorage;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    async fn setup(
        frequency: Frequency,
        days: &[&str],
    ) -> (tempfile::TempDir, BasicProgressTracker<JsonStorage>, User, Habit) {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let user = User::new("Harold", "Durán", "harold@example.com").unwrap();
        storage.save_user(&user).await.unwrap();
        let habit = Habit::new(user.id, "Leer", frequency, date("2025-10-01")).with_days(days.iter());
        storage.save_habit(&habit).await.unwrap();

        let tracker = BasicProgressTracker::new(storage).with_config(TrackerConfig {
            clock: Clock::Fixed(date("2025-10-16")),
            include_inactive: false,
        });
        (dir, tracker, user, habit)
    }

    async fn stored(tracker: &BasicProgressTracker<JsonStorage>, habit: HabitId, day: &str) -> Vec<Completion> {
        let d = date(day);
        tracker.storage().lock().await.query_completions(habit, d, d).await.unwrap()
    }

    #[tokio::test]
    async fn test_toggle_twice_keeps_one_record() {
        let (_dir, tracker, _user, habit) = setup(Frequency::Daily, &[]).await;

        let first = tracker.toggle(habit.id, "2025-10-12", true).await.unwrap();
        let second = tracker.toggle(habit.id, "2025-10-12", true).await.unwrap();
        assert!(first.created);
        assert!(!second.created);

        let rows = stored(&tracker, habit.id, "2025-10-12").await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].state);
    }

    #[tokio::test]
    async fn test_toggle_overwrites_state() {
        let (_dir, tracker, _user, habit) = setup(Frequency::Daily, &[]).await;

        tracker.toggle(habit.id, "2025-10-12", true).await.unwrap();
        let undone = tracker.toggle(habit.id, "2025-10-12", false).await.unwrap();
        assert!(!undone.completion.state);

        let rows = stored(&tracker, habit.id, "2025-10-12").await;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].state);
    }

    #[tokio::test]
    async fn test_toggle_unknown_habit() {
        let (_dir, tracker, _user, _habit) = setup(Frequency::Daily, &[]).await;
        let err = tracker.toggle(HabitId::new(), "2025-10-12", true).await.unwrap_err();
        assert!(matches!(err, ProgressError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_bad_date() {
        let (_dir, tracker, _user, habit) = setup(Frequency::Daily, &[]).await;
        let err = tracker.toggle(habit.id, "12-10-2025", true).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressError::InvalidArgument(CoreError::InvalidDate(_))
        ));

        let err = tracker.toggle(habit.id, "+262142-12-31", true).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressError::InvalidArgument(CoreError::InvalidDate(_))
        ));
        assert!(stored(&tracker, habit.id, "2025-10-16").await.is_empty());
    }

    #[tokio::test]
    async fn test_progress_at_last_representable_date() {
        let (_dir, tracker, _user, habit) = setup(Frequency::Daily, &[]).await;
        let report = tracker.weekly_progress(habit.id, Some(NaiveDate::MAX)).await.unwrap();
        assert_eq!(report.window_end, NaiveDate::MAX);
        assert_eq!(report.expected, 7);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_never_duplicate() {
        let (_dir, tracker, _user, habit) = setup(Frequency::Daily, &[]).await;
        let tracker = Arc::new(tracker);

        let mut handles = Vec::new();
        for i in 0..8 {
            let tracker = Arc::clone(&tracker);
            let id = habit.id;
            handles.push(tokio::spawn(async move {
                tracker.toggle(id, "2025-10-12", i % 2 == 0).await
            }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(stored(&tracker, habit.id, "2025-10-12").await.len(), 1);
    }

    #[tokio::test]
    async fn test_weekly_progress_uses_clock() {
        let (_dir, tracker, _user, habit) = setup(Frequency::Weekly, &["Mon", "Wed", "Fri"]).await;
        tracker.toggle(habit.id, "2025-10-13", true).await.unwrap();
        tracker.toggle(habit.id, "2025-10-15", true).await.unwrap();
        tracker.toggle(habit.id, "2025-10-17", false).await.unwrap();
        tracker.toggle(habit.id, "2025-10-10", true).await.unwrap();

        let report = tracker.weekly_progress(habit.id, None).await.unwrap();
        assert_eq!(report.window_start, date("2025-10-13"));
        assert_eq!(report.window_end, date("2025-10-19"));
        assert_eq!(report.expected, 3);
        assert_eq!(report.completed, 2);
        assert_eq!(report.percent, 66.67);
    }

    #[tokio::test]
    async fn test_monthly_progress_with_reference() {
        let (_dir, tracker, _user, habit) = setup(Frequency::Monthly, &["5", "15", "25"]).await;
        tracker.toggle(habit.id, "2025-10-05", true).await.unwrap();
        tracker.toggle(habit.id, "2025-11-05", true).await.unwrap();

        let report = tracker
            .monthly_progress(habit.id, Some(date("2025-10-31")))
            .await
            .unwrap();
        assert_eq!(report.window_start, date("2025-10-01"));
        assert_eq!(report.window_end, date("2025-10-31"));
        assert_eq!(report.expected, 3);
        assert_eq!(report.completed, 1);
        assert_eq!(report.percent, 33.33);
    }

    #[tokio::test]
    async fn test_progress_unknown_habit() {
        let (_dir, tracker, _user, _habit) = setup(Frequency::Daily, &[]).await;
        assert!(matches!(
            tracker.weekly_progress(HabitId::new(), None).await,
            Err(ProgressError::NotFound(_))
        ));
        assert!(matches!(
            tracker.monthly_progress(HabitId::new(), None).await,
            Err(ProgressError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_skips_inactive() {
        let (_dir, tracker, user, habit) = setup(Frequency::Daily, &[]).await;
        {
            let storage = tracker.storage();
            let mut storage = storage.lock().await;
            let mut paused = Habit::new(user.id, "Pausado", Frequency::Daily, date("2025-10-01"));
            paused.active = false;
            storage.save_habit(&paused).await.unwrap();
        }
        tracker.toggle(habit.id, "2025-10-14", true).await.unwrap();

        let snapshot = tracker.snapshot(user.id, None).await.unwrap();
        assert_eq!(snapshot.reference_date, date("2025-10-16"));
        assert_eq!(snapshot.weekly.len(), 1);
        assert_eq!(snapshot.monthly.len(), 1);
        assert_eq!(snapshot.weekly[0].habit_id, habit.id);
        assert_eq!(snapshot.weekly[0].completed, 1);
        assert_eq!(snapshot.monthly[0].expected, 31);
    }

    #[tokio::test]
    async fn test_snapshot_unknown_user() {
        let (_dir, tracker, _user, _habit) = setup(Frequency::Daily, &[]).await;
        assert!(matches!(
            tracker.snapshot(UserId::new(), None).await,
            Err(ProgressError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_ids_map_to_not_found() {
        assert!(matches!(parse_habit_id("nope"), Err(ProgressError::NotFound(_))));
        assert!(matches!(parse_user_id(""), Err(ProgressError::NotFound(_))));
        let id = HabitId::new();
        assert_eq!(parse_habit_id(&id.to_string()).unwrap(), id);
    }
}
