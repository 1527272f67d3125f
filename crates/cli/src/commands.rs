//! Command handlers. Every handler prints its result as JSON on stdout.

use anyhow::Result;
use chrono::NaiveTime;
use rutinia_core::{
    parse_date, Category, CategoryId, CoreError, Frequency, Habit, HabitFilter, Reminder, Role,
    RoleId, User,
};
use rutinia_progress::{
    parse_habit_id, parse_user_id, BasicProgressTracker, Clock, ProgressError, ProgressTracker,
    TrackerConfig,
};
use rutinia_storage::Storage;
use serde::Serialize;
use tracing::info;

use crate::{CategoryCommand, Commands, HabitCommand, ProgressCommand, RoleCommand, UserCommand};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<chrono::NaiveDate>, ProgressError> {
    Ok(raw.map(parse_date).transpose()?)
}

fn parse_category_id(raw: &str) -> Result<CategoryId, ProgressError> {
    raw.trim()
        .parse()
        .map_err(|_| ProgressError::NotFound(format!("category {}", raw)))
}

fn parse_role_id(raw: &str) -> Result<RoleId, ProgressError> {
    raw.trim()
        .parse()
        .map_err(|_| ProgressError::NotFound(format!("role {}", raw)))
}

fn parse_reminder(raw: &str) -> Result<Reminder, ProgressError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|at| Reminder { at })
        .map_err(|_| ProgressError::InvalidArgument(CoreError::InvalidTime(raw.to_string())))
}

fn parse_reminders(raw: &[String]) -> Result<Vec<Reminder>, ProgressError> {
    raw.iter()
        .filter(|r| !r.trim().is_empty())
        .map(|r| parse_reminder(r))
        .collect()
}

fn configured_days(raw: &[String]) -> Vec<&str> {
    raw.iter().map(|d| d.trim()).filter(|d| !d.is_empty()).collect()
}

async fn existing_category<S: Storage>(storage: &S, raw: &str) -> Result<CategoryId> {
    let category_id = parse_category_id(raw)?;
    if storage.load_category(category_id).await?.is_none() {
        return Err(ProgressError::NotFound(format!("category {}", category_id)).into());
    }
    Ok(category_id)
}

async fn existing_role<S: Storage>(storage: &S, raw: &str) -> Result<RoleId> {
    let role_id = parse_role_id(raw)?;
    if storage.load_role(role_id).await?.is_none() {
        return Err(ProgressError::NotFound(format!("role {}", role_id)).into());
    }
    Ok(role_id)
}

/// Run one command against the given storage backend.
pub async fn run<S: Storage + 'static>(storage: S, command: Commands) -> Result<()> {
    let summary_all = matches!(command, Commands::Summary { all: true, .. });
    let tracker = BasicProgressTracker::new(storage).with_config(TrackerConfig {
        clock: Clock::Local,
        include_inactive: summary_all,
    });

    match command {
        Commands::User(cmd) => run_user(&tracker, cmd).await,
        Commands::Role(cmd) => run_role(&tracker, cmd).await,
        Commands::Category(cmd) => run_category(&tracker, cmd).await,
        Commands::Habit(cmd) => run_habit(&tracker, cmd).await,
        Commands::Toggle { habit, date, completed } => {
            let outcome = tracker.toggle(parse_habit_id(&habit)?, &date, completed).await?;
            print_json(&outcome)
        }
        Commands::History { habit, from, to } => {
            let habit_id = parse_habit_id(&habit)?;
            let (from, to) = (parse_date(&from).map_err(ProgressError::from)?, parse_date(&to).map_err(ProgressError::from)?);
            let storage = tracker.storage();
            let storage = storage.lock().await;
            if storage.load_habit(habit_id).await?.is_none() {
                return Err(ProgressError::NotFound(format!("habit {}", habit_id)).into());
            }
            let completions = storage.query_completions(habit_id, from, to).await?;
            print_json(&completions)
        }
        Commands::Progress(ProgressCommand::Week { habit, date }) => {
            let reference = parse_optional_date(date.as_deref())?;
            let report = tracker.weekly_progress(parse_habit_id(&habit)?, reference).await?;
            print_json(&report)
        }
        Commands::Progress(ProgressCommand::Month { habit, date }) => {
            let reference = parse_optional_date(date.as_deref())?;
            let report = tracker.monthly_progress(parse_habit_id(&habit)?, reference).await?;
            print_json(&report)
        }
        Commands::Summary { user, date, .. } => {
            let reference = parse_optional_date(date.as_deref())?;
            let snapshot = tracker.snapshot(parse_user_id(&user)?, reference).await?;
            print_json(&snapshot)
        }
    }
}

async fn run_user<S: Storage + 'static>(tracker: &BasicProgressTracker<S>, cmd: UserCommand) -> Result<()> {
    let storage = tracker.storage();
    let mut storage = storage.lock().await;

    match cmd {
        UserCommand::Add { first_name, last_name, email, theme, role } => {
            let mut user = User::new(first_name, last_name, email).map_err(ProgressError::from)?;
            user.theme = theme;
            if let Some(role) = role {
                user.role_id = Some(existing_role(&*storage, &role).await?);
            }
            storage.save_user(&user).await?;
            info!("Registered user {} <{}>", user.id, user.email);
            print_json(&user)
        }
        UserCommand::List => print_json(&storage.list_users().await?),
        UserCommand::Update { id, first_name, last_name, email, theme, role } => {
            let user_id = parse_user_id(&id)?;
            let mut user = storage
                .load_user(user_id)
                .await?
                .ok_or_else(|| ProgressError::NotFound(format!("user {}", user_id)))?;
            if let Some(first_name) = first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                user.last_name = last_name;
            }
            if let Some(email) = email {
                user.set_email(email).map_err(ProgressError::from)?;
            }
            if let Some(theme) = theme {
                user.theme = Some(theme);
            }
            if let Some(role) = role {
                user.role_id = Some(existing_role(&*storage, &role).await?);
            }
            // The backend rejects an e-mail owned by another user.
            storage.save_user(&user).await?;
            info!("Updated user {}", user.id);
            print_json(&user)
        }
        UserCommand::Delete { id } => {
            let user_id = parse_user_id(&id)?;
            if storage.load_user(user_id).await?.is_none() {
                return Err(ProgressError::NotFound(format!("user {}", user_id)).into());
            }
            storage.delete_user(user_id).await?;
            info!("Deleted user {}", user_id);
            print_json(&serde_json::json!({ "deleted": user_id }))
        }
    }
}

async fn run_role<S: Storage + 'static>(tracker: &BasicProgressTracker<S>, cmd: RoleCommand) -> Result<()> {
    let storage = tracker.storage();
    let mut storage = storage.lock().await;

    match cmd {
        RoleCommand::Add { name } => {
            let role = Role::new(name).map_err(ProgressError::from)?;
            storage.save_role(&role).await?;
            print_json(&role)
        }
        RoleCommand::List => print_json(&storage.list_roles().await?),
    }
}

async fn run_category<S: Storage + 'static>(
    tracker: &BasicProgressTracker<S>,
    cmd: CategoryCommand,
) -> Result<()> {
    let storage = tracker.storage();
    let mut storage = storage.lock().await;

    match cmd {
        CategoryCommand::Add { name } => {
            let category = Category::new(name).map_err(ProgressError::from)?;
            storage.save_category(&category).await?;
            print_json(&category)
        }
        CategoryCommand::List => print_json(&storage.list_categories().await?),
        CategoryCommand::Delete { id } => {
            let category_id = existing_category(&*storage, &id).await?;
            storage.delete_category(category_id).await?;
            print_json(&serde_json::json!({ "deleted": category_id }))
        }
    }
}

async fn run_habit<S: Storage + 'static>(tracker: &BasicProgressTracker<S>, cmd: HabitCommand) -> Result<()> {
    let storage = tracker.storage();
    let mut storage = storage.lock().await;

    match cmd {
        HabitCommand::Add {
            user,
            name,
            description,
            frequency,
            days,
            category,
            difficulty,
            start_date,
            public,
            reminders,
            icon,
            color,
        } => {
            let user_id = parse_user_id(&user)?;
            if storage.load_user(user_id).await?.is_none() {
                return Err(ProgressError::NotFound(format!("user {}", user_id)).into());
            }
            let start_date = match start_date {
                Some(raw) => parse_date(&raw).map_err(ProgressError::from)?,
                None => Clock::Local.today(),
            };

            let mut habit = Habit::new(user_id, name, Frequency::parse(&frequency), start_date)
                .with_description(description)
                .with_days(configured_days(&days));
            if let Some(category) = category {
                habit = habit.with_category(existing_category(&*storage, &category).await?);
            }
            habit.difficulty = difficulty;
            habit.public = public;
            habit.icon = icon;
            habit.color = color;
            habit.reminders = parse_reminders(&reminders)?;
            habit.validate().map_err(ProgressError::from)?;

            storage.save_habit(&habit).await?;
            info!("Created habit {} ({}) for user {}", habit.id, habit.frequency, user_id);
            print_json(&habit)
        }
        HabitCommand::List { user, active, category } => {
            let filter = HabitFilter {
                user_id: user.as_deref().map(parse_user_id).transpose()?,
                active,
                category_id: category.as_deref().map(parse_category_id).transpose()?,
            };
            print_json(&storage.list_habits(&filter).await?)
        }
        HabitCommand::Show { id } => {
            let habit_id = parse_habit_id(&id)?;
            let habit = storage
                .load_habit(habit_id)
                .await?
                .ok_or_else(|| ProgressError::NotFound(format!("habit {}", habit_id)))?;
            print_json(&habit)
        }
        HabitCommand::Update {
            id,
            name,
            description,
            frequency,
            days,
            category,
            clear_category,
            difficulty,
            public,
            reminders,
            icon,
            color,
        } => {
            let habit_id = parse_habit_id(&id)?;
            let mut habit = storage
                .load_habit(habit_id)
                .await?
                .ok_or_else(|| ProgressError::NotFound(format!("habit {}", habit_id)))?;

            if let Some(name) = name {
                habit.name = name;
            }
            if let Some(description) = description {
                habit.description = description;
            }
            if let Some(frequency) = frequency {
                habit.frequency = Frequency::parse(&frequency);
            }
            if let Some(days) = days {
                habit = habit.with_days(configured_days(&days));
            }
            if let Some(category) = category {
                habit.category_id = Some(existing_category(&*storage, &category).await?);
            } else if clear_category {
                habit.category_id = None;
            }
            if let Some(difficulty) = difficulty {
                habit.difficulty = Some(difficulty);
            }
            if let Some(public) = public {
                habit.public = public;
            }
            if let Some(reminders) = reminders {
                habit.reminders = parse_reminders(&reminders)?;
            }
            if let Some(icon) = icon {
                habit.icon = Some(icon);
            }
            if let Some(color) = color {
                habit.color = Some(color);
            }
            habit.validate().map_err(ProgressError::from)?;
            habit.touch();

            storage.save_habit(&habit).await?;
            info!("Updated habit {} ({})", habit.id, habit.frequency);
            print_json(&habit)
        }
        HabitCommand::Activate { id } => set_active(&mut *storage, &id, true).await,
        HabitCommand::Deactivate { id } => set_active(&mut *storage, &id, false).await,
        HabitCommand::Delete { id } => {
            let habit_id = parse_habit_id(&id)?;
            if storage.load_habit(habit_id).await?.is_none() {
                return Err(ProgressError::NotFound(format!("habit {}", habit_id)).into());
            }
            storage.delete_habit(habit_id).await?;
            info!("Deleted habit {}", habit_id);
            print_json(&serde_json::json!({ "deleted": habit_id }))
        }
    }
}

async fn set_active<S: Storage>(storage: &mut S, id: &str, active: bool) -> Result<()> {
    let habit_id = parse_habit_id(id)?;
    let mut habit = storage
        .load_habit(habit_id)
        .await?
        .ok_or_else(|| ProgressError::NotFound(format!("habit {}", habit_id)))?;
    habit.active = active;
    habit.touch();
    storage.save_habit(&habit).await?;
    print_json(&habit)
}
