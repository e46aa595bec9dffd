mod attendance;
mod class;
mod config_cmd;
mod sync_cmd;

pub use attendance::AttendanceCommand;
pub use class::ClassCommand;
pub use config_cmd::ConfigCommand;
pub use sync_cmd::SyncCommand;

use chrono::{Local, NaiveDate};
use clap::ValueEnum;

use rollcall::classes::ClassRepository;
use rollcall::models::Class;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a `YYYY-MM-DD` date, defaulting to today in local time.
fn parse_date(date: Option<&String>) -> Result<NaiveDate, String> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", d)),
        None => Ok(Local::now().date_naive()),
    }
}

/// Looks a class up by id or name.
async fn resolve_class(repo: &ClassRepository, identifier: &str) -> Result<Class, String> {
    repo.find(identifier)
        .await
        .ok_or_else(|| format!("Class not found: {}", identifier))
}
