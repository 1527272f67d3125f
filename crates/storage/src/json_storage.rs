//! JSON file storage implementation.
//!
//! Stores one JSON document per entity under a root directory. Completions
//! are keyed on disk by their natural key, `completions/<habit>/<date>.json`,
//! so a second write for the same habit and date lands on the same file.

use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use rutinia_core::{
    Category, CategoryId, Completion, Habit, HabitFilter, HabitId, Role, RoleId, User, UserId,
};
use tokio::fs;
use tracing::debug;
use super::{Storage, StorageError, Result, UpsertOutcome};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage, creating the entity directories under `root`.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("users")).await?;
        fs::create_dir_all(root.join("roles")).await?;
        fs::create_dir_all(root.join("categories")).await?;
        fs::create_dir_all(root.join("habits")).await?;
        fs::create_dir_all(root.join("completions")).await?;

        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_path(&self, id: UserId) -> PathBuf {
        self.root.join("users").join(format!("{}.json", id))
    }
    fn role_path(&self, id: RoleId) -> PathBuf {
        self.root.join("roles").join(format!("{}.json", id))
    }
    fn category_path(&self, id: CategoryId) -> PathBuf {
        self.root.join("categories").join(format!("{}.json", id))
    }
    fn habit_path(&self, id: HabitId) -> PathBuf {
        self.root.join("habits").join(format!("{}.json", id))
    }
    fn completions_dir(&self, habit_id: HabitId) -> PathBuf {
        self.root.join("completions").join(habit_id.to_string())
    }
    fn completion_path(&self, habit_id: HabitId, date: NaiveDate) -> PathBuf {
        self.completions_dir(habit_id)
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_user(&mut self, user: &User) -> Result<()> {
        let users: Vec<User> = list_dir(&self.root.join("users")).await?;
        if users.iter().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StorageError::Conflict(format!(
                "e-mail {} already registered",
                user.email
            )));
        }
        write_json(&self.user_path(user.id), user).await
    }

    async fn load_user(&self, id: UserId) -> Result<Option<User>> {
        read_json(&self.user_path(id)).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = list_dir(&self.root.join("users")).await?;
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn delete_user(&mut self, id: UserId) -> Result<()> {
        let owned = self
            .list_habits(&HabitFilter { user_id: Some(id), ..Default::default() })
            .await?;
        for habit in owned {
            self.delete_habit(habit.id).await?;
        }
        remove_file(&self.user_path(id)).await?;
        debug!("Deleted user {}", id);
        Ok(())
    }

    async fn save_role(&mut self, role: &Role) -> Result<()> {
        write_json(&self.role_path(role.id), role).await
    }

    async fn load_role(&self, id: RoleId) -> Result<Option<Role>> {
        read_json(&self.role_path(id)).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let mut roles: Vec<Role> = list_dir(&self.root.join("roles")).await?;
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn save_category(&mut self, category: &Category) -> Result<()> {
        write_json(&self.category_path(category.id), category).await
    }

    async fn load_category(&self, id: CategoryId) -> Result<Option<Category>> {
        read_json(&self.category_path(id)).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = list_dir(&self.root.join("categories")).await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
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
        remove_file(&self.category_path(id)).await
    }

    async fn save_habit(&mut self, habit: &Habit) -> Result<()> {
        write_json(&self.habit_path(habit.id), habit).await
    }

    async fn load_habit(&self, id: HabitId) -> Result<Option<Habit>> {
        read_json(&self.habit_path(id)).await
    }

    async fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>> {
        let all: Vec<Habit> = list_dir(&self.root.join("habits")).await?;
        let mut habits: Vec<Habit> = all.into_iter().filter(|h| filter.matches(h)).collect();
        habits.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(habits)
    }

    async fn delete_habit(&mut self, id: HabitId) -> Result<()> {
        match fs::remove_dir_all(self.completions_dir(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        remove_file(&self.habit_path(id)).await?;
        debug!("Deleted habit {} and its completions", id);
        Ok(())
    }

    async fn query_completions(
        &self,
        habit_id: HabitId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Completion>> {
        let dir = self.completions_dir(habit_id);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }
        let all: Vec<Completion> = list_dir(&dir).await?;
        let mut completions: Vec<Completion> = all
            .into_iter()
            .filter(|c| c.date >= from && c.date <= to)
            .collect();
        completions.sort_by_key(|c| c.date);
        Ok(completions)
    }

    async fn upsert_completion(
        &mut self,
        habit_id: HabitId,
        date: NaiveDate,
        state: bool,
    ) -> Result<UpsertOutcome> {
        let path = self.completion_path(habit_id, date);
        let outcome = match read_json::<Completion>(&path).await? {
            Some(mut existing) => {
                existing.state = state;
                existing.updated_at = chrono::Utc::now();
                UpsertOutcome { completion: existing, created: false }
            }
            None => {
                fs::create_dir_all(self.completions_dir(habit_id)).await?;
                UpsertOutcome {
                    completion: Completion::new(habit_id, date, state),
                    created: true,
                }
            }
        };
        write_json(&path, &outcome.completion).await?;
        Ok(outcome)
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json.as_bytes()).await?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
    })?;
    Ok(())
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Some(item) = read_json(&entry.path()).await? {
            items.push(item);
        }
    }
    Ok(items)
}
