//! Rutinia CLI - habit tracking from the command line.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rutinia_progress::ProgressError;
use rutinia_storage::{JsonStorage, StorageError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rutinia")]
#[command(about = "Habit tracking: habits, completions and progress", long_about = None)]
struct Cli {
    /// Storage directory
    #[arg(long, env = "RUTINIA_STORAGE", default_value = ".rutinia", global = true)]
    storage: PathBuf,

    /// Storage backend
    #[arg(long, value_enum, env = "RUTINIA_BACKEND", default_value = "json", global = true)]
    backend: Backend,

    /// Log filter, e.g. `info` or `rutinia_progress=debug`
    #[arg(long, env = "RUTINIA_LOG", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// One JSON file per record
    Json,
    /// SQLite database (requires the `sqlite` feature)
    Sqlite,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Manage roles
    #[command(subcommand)]
    Role(RoleCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Manage habits
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Mark a habit done (or not) on a date
    Toggle {
        /// Habit ID
        habit: String,
        /// Date (YYYY-MM-DD)
        date: String,
        /// Completion state
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        completed: bool,
    },
    /// List completion records of a habit
    History {
        /// Habit ID
        habit: String,
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last date (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
    /// Show progress of a habit
    #[command(subcommand)]
    Progress(ProgressCommand),
    /// Show progress of every habit of a user
    Summary {
        /// User ID
        user: String,
        /// Reference date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Include inactive habits
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Register a user
    Add {
        /// First name
        #[arg(long)]
        first_name: String,
        /// Last name
        #[arg(long, default_value = "")]
        last_name: String,
        /// E-mail (unique)
        #[arg(long)]
        email: String,
        /// UI theme
        #[arg(long)]
        theme: Option<String>,
        /// Role ID
        #[arg(long)]
        role: Option<String>,
    },
    /// List users
    List,
    /// Edit a user's profile; only the given options change
    Update {
        /// User ID
        id: String,
        /// First name
        #[arg(long)]
        first_name: Option<String>,
        /// Last name
        #[arg(long)]
        last_name: Option<String>,
        /// E-mail (unique)
        #[arg(long)]
        email: Option<String>,
        /// UI theme
        #[arg(long)]
        theme: Option<String>,
        /// Role ID
        #[arg(long)]
        role: Option<String>,
    },
    /// Delete a user and all their habits
    Delete {
        /// User ID
        id: String,
    },
}

#[derive(Subcommand)]
enum RoleCommand {
    /// Create a role
    Add {
        /// Role name
        name: String,
    },
    /// List roles
    List,
}

#[derive(Subcommand)]
enum CategoryCommand {
    /// Create a category
    Add {
        /// Category name
        name: String,
    },
    /// List categories
    List,
    /// Delete a category, clearing it from habits
    Delete {
        /// Category ID
        id: String,
    },
}

#[derive(Subcommand)]
enum HabitCommand {
    /// Create a habit
    Add {
        /// Owning user ID
        #[arg(long)]
        user: String,
        /// Habit name
        #[arg(long)]
        name: String,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
        /// daily | weekly | monthly (Spanish names accepted)
        #[arg(long)]
        frequency: String,
        /// Configured days, comma separated: weekdays or days of the month
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
        /// Category ID
        #[arg(long)]
        category: Option<String>,
        /// Difficulty label
        #[arg(long)]
        difficulty: Option<String>,
        /// Start date (default: today)
        #[arg(long)]
        start_date: Option<String>,
        /// Make the habit public
        #[arg(long)]
        public: bool,
        /// Reminder time (HH:MM), repeatable
        #[arg(long = "reminder")]
        reminders: Vec<String>,
        /// Icon
        #[arg(long)]
        icon: Option<String>,
        /// Color
        #[arg(long)]
        color: Option<String>,
    },
    /// List habits
    List {
        /// Only habits of this user
        #[arg(long)]
        user: Option<String>,
        /// Only active (true) or inactive (false) habits
        #[arg(long)]
        active: Option<bool>,
        /// Only habits in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Show a habit
    Show {
        /// Habit ID
        id: String,
    },
    /// Edit a habit; only the given options change
    Update {
        /// Habit ID
        id: String,
        /// Habit name
        #[arg(long)]
        name: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// daily | weekly | monthly (Spanish names accepted)
        #[arg(long)]
        frequency: Option<String>,
        /// Configured days, comma separated; an empty value clears them
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<String>>,
        /// Category ID
        #[arg(long, conflicts_with = "clear_category")]
        category: Option<String>,
        /// Remove the habit from its category
        #[arg(long)]
        clear_category: bool,
        /// Difficulty label
        #[arg(long)]
        difficulty: Option<String>,
        /// Public flag
        #[arg(long)]
        public: Option<bool>,
        /// Reminder time (HH:MM), repeatable; replaces all reminders
        #[arg(long = "reminder")]
        reminders: Option<Vec<String>>,
        /// Icon
        #[arg(long)]
        icon: Option<String>,
        /// Color
        #[arg(long)]
        color: Option<String>,
    },
    /// Resume tracking a habit
    Activate {
        /// Habit ID
        id: String,
    },
    /// Pause tracking a habit
    Deactivate {
        /// Habit ID
        id: String,
    },
    /// Delete a habit and its completion records
    Delete {
        /// Habit ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ProgressCommand {
    /// Progress over the Monday..Sunday week
    Week {
        /// Habit ID
        habit: String,
        /// Reference date (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Progress over the calendar month
    Month {
        /// Habit ID
        habit: String,
        /// Reference date (default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit status for an error: 4 for missing records, 3 for bad input.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ProgressError>() {
        Some(ProgressError::NotFound(_)) => 4,
        Some(ProgressError::InvalidArgument(_)) => 3,
        Some(ProgressError::Storage(StorageError::NotFound(_))) => 4,
        Some(ProgressError::Storage(StorageError::Conflict(_))) => 3,
        _ => match err.downcast_ref::<StorageError>() {
            Some(StorageError::NotFound(_)) => 4,
            Some(StorageError::Conflict(_)) => 3,
            _ => 1,
        },
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    debug!("Opening {:?} storage at {}", cli.backend, cli.storage.display());
    match cli.backend {
        Backend::Json => {
            let storage = JsonStorage::new(&cli.storage).await?;
            commands::run(storage, cli.command).await
        }
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => {
            tokio::fs::create_dir_all(&cli.storage).await?;
            let storage = rutinia_storage::SqliteStorage::new_from_path(&cli.storage.join("rutinia.db")).await?;
            commands::run(storage, cli.command).await
        }
        #[cfg(not(feature = "sqlite"))]
        Backend::Sqlite => anyhow::bail!("this build does not include the sqlite backend"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
