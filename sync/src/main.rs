//! Tandem sync CLI - runs one sync operation for a user and prints the outcome.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tandem_sync::{
    Config, DebugFacade, FileLocalStore, PgRemoteStore, RemoteDatasets, SyncCoordinator,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "tandem", about = "Synchronize Tandem datasets with the remote store")]
struct Cli {
    /// User whose datasets are synchronized
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy local datasets up where the remote is empty
    Migrate,
    /// Overwrite local datasets with remote ones
    Download,
    /// Reconcile both sides, newest wins
    Sync,
    /// Show both sides and what sync would do
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let local = Arc::new(FileLocalStore::open(&config.data_dir)?);
    let remote = Arc::new(PgRemoteStore::connect_lazy(&config)?);

    match remote.run_migrations().await {
        Ok(()) => {}
        // Offline start is allowed; the probe reports the outage per operation.
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, "could not run remote migrations");
        }
        Err(e) => {
            tracing::error!(error = %e, "remote migrations failed");
            return Err(e.into());
        }
    }

    let coordinator = SyncCoordinator::new(Arc::clone(&local), Arc::clone(&remote));
    let success = match cli.command {
        Command::Migrate => {
            let outcome = coordinator.migrate_local_to_remote(&cli.user).await;
            print(&outcome, |o| o.success)?
        }
        Command::Download => {
            let outcome = coordinator.download_remote_to_local(&cli.user).await;
            print(&outcome, |o| o.success)?
        }
        Command::Sync => {
            let outcome = coordinator.sync_bidirectional(&cli.user).await;
            print(&outcome, |o| o.success)?
        }
        Command::Status => {
            let datasets = RemoteDatasets::new(remote);
            let facade = DebugFacade::new(&*local, &datasets);
            print(&facade.snapshot(&cli.user).await?, |_| true)?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print<T: Serialize>(value: &T, success: impl Fn(&T) -> bool) -> serde_json::Result<bool> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(success(value))
}
