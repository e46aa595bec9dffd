use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{AttendanceCommand, ClassCommand, ConfigCommand, SyncCommand};
use rollcall::classes::ClassRepository;
use rollcall::config::Config;
use rollcall::db::{init_db, KvRepository};
use rollcall::ledger::AttendanceLedger;
use rollcall::store::LocalStore;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(version)]
#[command(about = "Class rosters and daily attendance", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage classes and rosters
    Class(ClassCommand),

    /// Take and review attendance
    Attendance(AttendanceCommand),

    /// Push classes and attendance to the remote store
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Class(cmd)) => {
            let store = open_store(&config).await?;
            cmd.run(&ClassRepository::new(store)).await?;
        }
        Some(Commands::Attendance(cmd)) => {
            let store = open_store(&config).await?;
            let repo = ClassRepository::new(store.clone());
            let ledger = AttendanceLedger::new(store);
            cmd.run(&repo, &ledger, config.roster_order.value).await?;
        }
        Some(Commands::Sync(cmd)) => {
            let store = open_store(&config).await?;
            let repo = ClassRepository::new(store.clone());
            let ledger = AttendanceLedger::new(store);
            cmd.run(&repo, &ledger, &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<LocalStore, sqlx::Error> {
    let pool = init_db(&config.database_path.value).await?;
    Ok(LocalStore::new(KvRepository::new(pool)))
}
