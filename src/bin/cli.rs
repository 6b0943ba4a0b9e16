//! wuppertal-live CLI
//!
//! Runs the feed server with its refresh scheduler, or single maintenance
//! commands against the same storage directory.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use wuppertal_live::{
    error::Result,
    models::{Config, MailSettings},
    pipeline::{self, Pipeline},
    server,
    storage::{EventStore, LocalStorage},
};

/// wuppertal-live - event listing to RSS and mail
#[derive(Parser, Debug)]
#[command(
    name = "wuppertal-live",
    version,
    about = "Wuppertal Live event feed"
)]
struct Cli {
    /// Path to storage directory containing config.toml and events.json
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the feed and refresh it on schedule (default)
    Serve,

    /// Run a single refresh cycle and print the feed
    Once {
        /// Write the feed to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration and mail settings
    Validate,

    /// Show storage info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Resolves on Ctrl-C.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let data_dir = config.storage.data_dir_or(&cli.storage_dir);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            config.validate()?;
            let store: Arc<dyn EventStore> = Arc::new(LocalStorage::open(&data_dir).await?);
            let (runner, reader) = Pipeline::from_config(&config, store, MailSettings::from_env())?;
            let runner = Arc::new(runner);

            let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
            let scheduler = {
                let schedule = config.schedule.clone();
                let mut stop_rx = stop_rx.clone();
                tokio::spawn(async move {
                    pipeline::run_scheduler(runner, &schedule, async move {
                        let _ = stop_rx.changed().await;
                    })
                    .await;
                })
            };

            let mut server_stop = stop_rx;
            let http = server::serve(&config.server.bind, reader, async move {
                let _ = server_stop.changed().await;
            });
            tokio::pin!(http);

            tokio::select! {
                result = &mut http => {
                    let _ = stop_tx.send(true);
                    result?;
                }
                _ = ctrl_c() => {
                    let _ = stop_tx.send(true);
                    // Let in-flight requests drain.
                    http.await?;
                }
            }

            if let Err(e) = scheduler.await {
                log::error!("Scheduler task failed: {}", e);
            }
        }

        Command::Once { output } => {
            let store: Arc<dyn EventStore> = Arc::new(LocalStorage::open(&data_dir).await?);
            let (runner, reader) = Pipeline::from_config(&config, store, MailSettings::from_env())?;

            let report = runner.run_cycle().await?;
            log::info!(
                "Extracted {} event(s), {} new, {} skipped",
                report.extracted,
                report.new_events,
                report.parse_failures
            );

            let xml = reader.current().map(|doc| doc.xml.clone()).unwrap_or_default();
            match output {
                Some(path) => {
                    tokio::fs::write(&path, xml).await?;
                    log::info!("Feed written to {}", path.display());
                }
                None => println!("{xml}"),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            match MailSettings::from_env().resolve() {
                Ok(smtp) => log::info!(
                    "✓ Mail OK ({} recipient(s) via {}:{})",
                    smtp.recipients.len(),
                    smtp.host,
                    smtp.port
                ),
                Err(e) => log::warn!("Mail notifications disabled: {}", e),
            }
        }

        Command::Info => {
            let store = LocalStorage::open(&data_dir).await?;
            log::info!("Storage directory: {}", store.root_dir().display());
            log::info!("Known events: {}", store.len().await?);
            if let Some(latest) = store.all().await?.last() {
                log::info!(
                    "Last discovered: {} ({}, {})",
                    latest.title,
                    latest.date,
                    latest.id
                );
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
