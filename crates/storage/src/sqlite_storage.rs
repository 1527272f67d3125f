//! SQLite storage backend for Rutinia.
//!
//! Users, roles, categories and habits live in a single `entities` table as
//! JSON documents. Completions get their own table with a UNIQUE
//! `(habit_id, date)` constraint so the natural key is enforced by the
//! database as well.

use async_trait::async_trait;
use chrono::NaiveDate;
use rutinia_core::{
    Category, CategoryId, Completion, CompletionId, Habit, HabitFilter, HabitId, Role, RoleId,
    User, UserId,
};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use tracing::debug;

use super::trait_::{Storage, StorageError, Result, UpsertOutcome};

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance from a connection URL.
    pub async fn new(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new().connect(url).await?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Open (creating if needed) a database file.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let path = path
            .to_str()
            .ok_or_else(|| StorageError::Other(format!("non UTF-8 path: {}", path.display())))?;
        Self::new(&format!("sqlite://{}?mode=rwc", path)).await
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// Each in-memory connection is its own database, so the pool is capped
    /// at one connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                entity_type TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS completions (
                id TEXT PRIMARY KEY,
                habit_id TEXT NOT NULL,
                date TEXT NOT NULL,
                state INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (habit_id, date)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(entity_type)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn save_entity<T: Serialize>(&self, kind: &str, id: String, value: &T) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO entities (id, entity_type, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(id)
        .bind(kind)
        .bind(data)
        .bind(now.clone())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_entity<T: DeserializeOwned>(&self, kind: &str, id: String) -> Result<Option<T>> {
        let row = sqlx::query("SELECT data FROM entities WHERE id = ? AND entity_type = ?")
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_entity(&row)).transpose()
    }

    async fn list_entities<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<T>> {
        let rows = sqlx::query(
            "SELECT data FROM entities WHERE entity_type = ? ORDER BY created_at, id",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_entity).collect()
    }

    async fn delete_entity(&self, kind: &str, id: String) -> Result<()> {
        sqlx::query("DELETE FROM entities WHERE id = ? AND entity_type = ?")
            .bind(id)
            .bind(kind)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn decode_entity<T: DeserializeOwned>(row: &SqliteRow) -> Result<T> {
    let data: String = row.try_get("data")?;
    Ok(serde_json::from_str(&data)?)
}

fn decode_completion(row: &SqliteRow) -> Result<Completion> {
    let parse_err = |what: &str, value: &str| StorageError::Other(format!("bad {} '{}'", what, value));

    let id: String = row.try_get("id")?;
    let habit_id: String = row.try_get("habit_id")?;
    let date: String = row.try_get("date")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Completion {
        id: id.parse::<CompletionId>().map_err(|_| parse_err("completion id", &id))?,
        habit_id: habit_id.parse::<HabitId>().map_err(|_| parse_err("habit id", &habit_id))?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| parse_err("date", &date))?,
        state: row.try_get::<i64, _>("state")? != 0,
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
            .map_err(|_| parse_err("timestamp", &updated_at))?
            .with_timezone(&chrono::Utc),
    })
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[async_trait]
impl Storage for SqliteStorage {
    // === User operations ===

    async fn save_user(&mut self, user: &User) -> Result<()> {
        let users: Vec<User> = self.list_entities("user").await?;
        if users.iter().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StorageError::Conflict(format!(
                "e-mail {} already registered",
                user.email
            )));
        }
        self.save_entity("user", user.id.to_string(), user).await
    }

    async fn load_user(&self, id: UserId) -> Result<Option<User>> {
        self.load_entity("user", id.to_string()).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.list_entities("user").await
    }

    async fn delete_user(&mut self, id: UserId) -> Result<()> {
        let owned = self
            .list_habits(&HabitFilter { user_id: Some(id), ..Default::default() })
            .await?;
        for habit in owned {
            self.delete_habit(habit.id).await?;
        }
        self.delete_entity("user", id.to_string()).await?;
        debug!("Deleted user {}", id);
        Ok(())
    }

    // === Role operations ===

    async fn save_role(&mut self, role: &Role) -> Result<()> {
        self.save_entity("role", role.id.to_string(), role).await
    }

    async fn load_role(&self, id: RoleId) -> Result<Option<Role>> {
        self.load_entity("role", id.to_string()).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.list_entities("role").await
    }

    // === Category operations ===

    async fn save_category(&mut self, category: &Category) -> Result<()> {
        self.save_entity("category", category.id.to_string(), category).await
    }

    async fn load_category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.load_entity("category", id.to_string()).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.list_entities("category").await
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        let tagged = self
            .list_habits(&HabitFilter { category_id: Some(id), ..Default::default() })
            .await?;
        for mut habit in tagged {
            habit.category_id = None;
            habit.touch();
            self.save_habit(&habit).await?;
        }
        self.delete_entity("category", id.to_string()).await
    }

    // === Habit operations ===

    async fn save_habit(&mut self, habit: &Habit) -> Result<()> {
        self.save_entity("habit", habit.id.to_string(), habit).await
    }

    async fn load_habit(&self, id: HabitId) -> Result<Option<Habit>> {
        self.load_entity("habit", id.to_string()).await
    }

    async fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>> {
        let habits: Vec<Habit> = self.list_entities("habit").await?;
        Ok(habits.into_iter().filter(|h| filter.matches(h)).collect())
    }

    async fn delete_habit(&mut self, id: HabitId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM completions WHERE habit_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM entities WHERE id = ? AND entity_type = 'habit'")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Deleted habit {} and its completions", id);
        Ok(())
    }

    // === Completion operations ===

    async fn query_completions(
        &self,
        habit_id: HabitId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Completion>> {
        let rows = sqlx::query(
            "SELECT id, habit_id, date, state, updated_at FROM completions
            WHERE habit_id = ? AND date >= ? AND date <= ?
            ORDER BY date",
        )
        .bind(habit_id.to_string())
        .bind(iso(from))
        .bind(iso(to))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_completion).collect()
    }

    async fn upsert_completion(
        &mut self,
        habit_id: HabitId,
        date: NaiveDate,
        state: bool,
    ) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM completions WHERE habit_id = ? AND date = ?")
            .bind(habit_id.to_string())
            .bind(iso(date))
            .fetch_optional(&mut *tx)
            .await?;
        let created = existing.is_none();

        // The conflict clause keeps a racing insert from adding a second row.
        let row = sqlx::query(
            "INSERT INTO completions (id, habit_id, date, state, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(habit_id, date) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at
            RETURNING id, habit_id, date, state, updated_at",
        )
        .bind(CompletionId::new().to_string())
        .bind(habit_id.to_string())
        .bind(iso(date))
        .bind(state as i64)
        .bind(chrono::Utc::now().to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;

        let completion = decode_completion(&row)?;
        tx.commit().await?;

        Ok(UpsertOutcome { completion, created })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rutinia_core::{parse_date, Frequency};

    async fn setup() -> (SqliteStorage, User, Habit) {
        let mut storage = SqliteStorage::in_memory().await.unwrap();
        let user = User::new("Harold", "Durán", "harold@example.com").unwrap();
        storage.save_user(&user).await.unwrap();
        let habit = Habit::new(user.id, "Leer", Frequency::Weekly, parse_date("2025-10-01").unwrap())
            .with_days(["Mon", "Wed", "Fri"]);
        storage.save_habit(&habit).await.unwrap();
        (storage, user, habit)
    }

    #[tokio::test]
    async fn test_health_check() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert!(storage.health_check().await);
    }

    #[tokio::test]
    async fn test_habit_operations() {
        let (storage, user, habit) = setup().await;

        let loaded = storage.load_habit(habit.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Leer");
        assert_eq!(loaded.days, vec!["Mon", "Wed", "Fri"]);

        let filter = HabitFilter { user_id: Some(user.id), ..Default::default() };
        assert_eq!(storage.list_habits(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row() {
        let (mut storage, _user, habit) = setup().await;
        let d = parse_date("2025-10-12").unwrap();

        let first = storage.upsert_completion(habit.id, d, true).await.unwrap();
        let second = storage.upsert_completion(habit.id, d, false).await.unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.completion.id, second.completion.id);

        let rows = storage.query_completions(habit.id, d, d).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].state);
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_completions() {
        let (mut storage, user, habit) = setup().await;
        let d = parse_date("2025-10-12").unwrap();
        storage.upsert_completion(habit.id, d, true).await.unwrap();

        storage.delete_user(user.id).await.unwrap();

        assert!(storage.load_habit(habit.id).await.unwrap().is_none());
        assert!(storage.query_completions(habit.id, d, d).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (mut storage, _user, _habit) = setup().await;
        let twin = User::new("Otro", "Harold", "harold@example.com").unwrap();
        assert!(matches!(
            storage.save_user(&twin).await,
            Err(StorageError::Conflict(_))
        ));
    }
}
