//! Storage trait abstraction.

use async_trait::async_trait;
use chrono::NaiveDate;
use rutinia_core::{
    Category, CategoryId, Completion, Habit, HabitFilter, HabitId, Role, RoleId, User, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write would break a uniqueness rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result of writing a completion by its natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    /// The stored completion
    pub completion: Completion,
    /// True if a new record was inserted, false if an existing one was updated
    pub created: bool,
}

/// Storage abstraction for Rutinia data.
///
/// This trait allows different storage backends to be plugged in. Deletes
/// cascade explicitly: removing a habit removes its completions, removing a
/// user removes their habits, removing a category clears it from habits.
#[async_trait]
pub trait Storage: Send + Sync {
    // === User operations ===

    /// Save a user (create or update). Fails with `Conflict` if another user
    /// already has the same e-mail.
    async fn save_user(&mut self, user: &User) -> Result<()>;

    /// Load a user by ID.
    async fn load_user(&self, id: UserId) -> Result<Option<User>>;

    /// List all users.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Delete a user together with their habits and completions.
    async fn delete_user(&mut self, id: UserId) -> Result<()>;

    // === Role operations ===

    /// Save a role.
    async fn save_role(&mut self, role: &Role) -> Result<()>;

    /// Load a role by ID.
    async fn load_role(&self, id: RoleId) -> Result<Option<Role>>;

    /// List all roles.
    async fn list_roles(&self) -> Result<Vec<Role>>;

    // === Category operations ===

    /// Save a category.
    async fn save_category(&mut self, category: &Category) -> Result<()>;

    /// Load a category by ID.
    async fn load_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// List all categories.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Delete a category and clear it from habits that referenced it.
    async fn delete_category(&mut self, id: CategoryId) -> Result<()>;

    // === Habit operations ===

    /// Save a habit (create or update).
    async fn save_habit(&mut self, habit: &Habit) -> Result<()>;

    /// Load a habit by ID.
    async fn load_habit(&self, id: HabitId) -> Result<Option<Habit>>;

    /// List habits matching the filter.
    async fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>>;

    /// Delete a habit together with its completions.
    async fn delete_habit(&mut self, id: HabitId) -> Result<()>;

    // === Completion operations ===

    /// Completions of a habit dated within `from..=to`, ordered by date.
    async fn query_completions(
        &self,
        habit_id: HabitId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Completion>>;

    /// Insert or overwrite the completion for `(habit_id, date)`.
    async fn upsert_completion(
        &mut self,
        habit_id: HabitId,
        date: NaiveDate,
        state: bool,
    ) -> Result<UpsertOutcome>;
}
