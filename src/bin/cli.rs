//! pagewatch CLI
//!
//! One invocation performs one pass; schedule it externally (cron, CI).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagewatch::{
    error::Result,
    models::{Config, Credentials},
    pipeline::{self, ChangeDetector},
    services::{ElksSender, HttpFetcher, LogSender, Notifier, RetryPolicy, SmsSender},
    storage::{JsonStateStore, StateStore},
};

/// pagewatch - Web Page Change Alerts
#[derive(Parser, Debug)]
#[command(name = "pagewatch", version, about = "Web page change detection with SMS alerts")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every source once and alert on changes (default)
    Check {
        /// Log alerts instead of sending them and do not save state
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration and credentials
    Validate,

    /// Show stored signatures
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)?;
    config.validate()?;
    let store = JsonStateStore::new(config.state_path(&cli.config));

    match cli.command.unwrap_or(Command::Check { dry_run: false }) {
        Command::Check { dry_run } => {
            let (recipients, sender) = if dry_run {
                let recipients = Credentials::from_env()
                    .map(|c| c.recipients)
                    .unwrap_or_else(|_| vec!["<recipient>".to_string()]);
                let sender: Box<dyn SmsSender> = Box::new(LogSender);
                (recipients, sender)
            } else {
                let credentials = Credentials::from_env()?;
                let sender: Box<dyn SmsSender> =
                    Box::new(ElksSender::new(&config.sms, &credentials)?);
                (credentials.recipients, sender)
            };

            let notifier = Notifier::new(config.message_prefix.clone(), recipients, sender);
            let detector = ChangeDetector::new(
                Box::new(HttpFetcher::new(&config.fetch)?),
                notifier,
                RetryPolicy::from_config(&config.fetch),
            );

            pipeline::run_check(&store, &detector, &config.sources, dry_run).await?;
        }

        Command::Validate => {
            if let Err(e) = config.validate_sources() {
                log::error!("Source validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} sources, state at {})",
                config.sources.len(),
                store.path().display()
            );
            match Credentials::from_env() {
                Ok(credentials) => log::info!(
                    "✓ Credentials OK ({} recipients)",
                    credentials.recipients.len()
                ),
                Err(e) => {
                    log::error!("Credentials invalid: {}", e);
                    return Err(e);
                }
            }
        }

        Command::Info => {
            log::info!("State file: {}", store.path().display());
            let state = store.load().await;
            for source in &config.sources {
                match state.get(&source.url) {
                    Some("") => log::info!("{} ({}): no matching link", source.name, source.url),
                    Some(signature) => {
                        log::info!("{} ({}): {}", source.name, source.url, signature)
                    }
                    None => log::info!("{} ({}): not checked yet", source.name, source.url),
                }
            }
            let orphaned = state
                .sources
                .keys()
                .filter(|url| !config.sources.iter().any(|s| &s.url == *url))
                .count();
            if orphaned > 0 {
                log::info!("{} stored signatures belong to removed sources", orphaned);
            }
        }
    }

    Ok(())
}
