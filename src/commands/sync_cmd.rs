//! Sync CLI commands for pushing local data to the document store.

use clap::{Args, Subcommand};

use rollcall::classes::ClassRepository;
use rollcall::config::Config;
use rollcall::ledger::AttendanceLedger;
use rollcall::sync::{HttpDocumentStore, SyncEngine, SyncError, SyncReport};

/// Push classes and attendance to the remote store
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub async fn run(
        &self,
        repo: &ClassRepository,
        ledger: &AttendanceLedger,
        config: &Config,
    ) -> Result<(), SyncError> {
        match &self.command {
            None => self.sync(repo, ledger, config).await,
            Some(SyncSubcommand::Status) => {
                self.status(config).await;
                Ok(())
            }
        }
    }

    async fn sync(
        &self,
        repo: &ClassRepository,
        ledger: &AttendanceLedger,
        config: &Config,
    ) -> Result<(), SyncError> {
        if !config.sync.is_configured() {
            return Err(SyncError::NotConfigured);
        }
        if !config.sync.is_logged_in() {
            return Err(SyncError::NotLoggedIn);
        }
        let remote = HttpDocumentStore::from_config(&config.sync).ok_or(SyncError::NotLoggedIn)?;

        let classes = repo.list().await;
        if classes.is_empty() {
            println!("No classes to sync.");
            return Ok(());
        }

        println!("Syncing with {}...", remote.server_url());
        println!();

        let engine = SyncEngine::new(ledger.clone(), remote, config.sync.write_mode);
        let report = engine.sync_all(&classes).await;
        print_report(&report);

        println!();
        let synced = report.into_result()?;
        println!("Sync complete: {} class(es).", synced.len());
        Ok(())
    }

    async fn status(&self, config: &Config) {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let (Some(server_url), Some(api_key)) = (&config.sync.server_url, &config.sync.api_key)
        else {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  sync:");
            println!("    server_url: \"http://localhost:8080\"");
            println!("    api_key: \"your-api-key\"");
            println!("    write_mode: replace");
            println!();
            println!("Or set environment variables:");
            println!("  ROLLCALL_SYNC_URL");
            println!("  ROLLCALL_SYNC_API_KEY");
            return;
        };

        println!("Server:     {}", server_url);
        println!(
            "API Key:    {}...",
            api_key.chars().take(8).collect::<String>()
        );
        println!("Write mode: {}", config.sync.write_mode);
        println!();

        print!("Server status: ");
        let client = HttpDocumentStore::new(server_url.clone(), api_key.clone());
        if client.check_health().await {
            println!("✓ connected");
        } else {
            println!("✗ unreachable");
        }
    }
}

fn print_report(report: &SyncReport) {
    for id in &report.synced {
        println!("  ✓ {}", id);
    }
    if let Some(failure) = &report.failed {
        println!("  ✗ {}: {}", failure.class_id, failure.error);
    }
    for id in &report.not_attempted {
        println!("  - {} (not attempted)", id);
    }
}
