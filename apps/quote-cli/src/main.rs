//! # Kvota Quote CLI
//!
//! Runs quote calculations against the admin settings store.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            quote-cli                                    │
//! │                                                                         │
//! │  request.json ──► QuoteCalculator ──► result JSON (stdout)             │
//! │                        │                                                │
//! │                        ▼                                                │
//! │              CachedSettingsProvider ──► SettingsDb ──► SQLite          │
//! │                                                                         │
//! │  settings.toml ──► settings import ──► admin_settings table            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable.

mod config;
mod seed;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quote_core::{QuoteCalculator, QuoteRequest};
use quote_settings::{CachedSettingsProvider, SettingsDb, SettingsDbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, LogFormat};
use crate::seed::SettingsSeed;

#[derive(Parser)]
#[command(name = "quote-cli")]
#[command(about = "Kvota B2B quote pricing engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a quote request and print the result as JSON
    Calculate {
        /// Organization whose admin settings apply
        #[arg(long)]
        org: String,

        /// Path to the request JSON
        #[arg(long)]
        request: PathBuf,

        /// Print compact JSON on one line
        #[arg(long, default_value_t = false)]
        compact: bool,
    },

    /// Admin settings maintenance
    Settings {
        #[command(subcommand)]
        cmd: SettingsCmd,
    },

    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },
}

#[derive(Subcommand)]
enum SettingsCmd {
    /// Insert or replace organizations from a TOML seed file
    Import {
        path: PathBuf,
    },

    /// Print every stored organization
    List,

    /// Print one organization, as stored and as the engine sees it
    Show {
        #[arg(long)]
        org: String,
    },

    /// Remove one organization
    Delete {
        #[arg(long)]
        org: String,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Print applied vs embedded migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load()?;
    init_tracing(config.log_format);

    info!(
        db_path = %config.db_path.display(),
        ttl_secs = config.settings_ttl.as_secs(),
        "Configuration loaded"
    );

    let db = SettingsDb::new(SettingsDbConfig::new(&config.db_path))
        .await
        .context("cannot open admin settings database")?;

    let outcome = run(cli.cmd, &config, &db).await;
    db.close().await;
    outcome
}

async fn run(cmd: Commands, config: &CliConfig, db: &SettingsDb) -> Result<()> {
    match cmd {
        Commands::Calculate { org, request, compact } => {
            let text = std::fs::read_to_string(&request)
                .with_context(|| format!("cannot read {}", request.display()))?;
            let request: QuoteRequest = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a valid quote request", request.display()))?;

            let provider = CachedSettingsProvider::new(db.clone(), config.settings_ttl);
            let calculator = QuoteCalculator::new(provider);
            let result = calculator.calculate(&org, &request).await?;

            let json = if compact {
                serde_json::to_string(&result)?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{json}");
        }

        Commands::Settings { cmd } => {
            let repo = db.admin_settings_repo();
            match cmd {
                SettingsCmd::Import { path } => {
                    let seed = SettingsSeed::read(&path)?;
                    for record in &seed.organizations {
                        repo.upsert(record)
                            .await
                            .with_context(|| format!("cannot store {}", record.organization_id))?;
                    }
                    info!(count = seed.organizations.len(), "Admin settings imported");
                    println!("imported {} organization(s)", seed.organizations.len());
                }
                SettingsCmd::List => {
                    let records = repo.list().await?;
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
                SettingsCmd::Show { org } => {
                    let record = repo.get_record(&org).await?;
                    let settings = repo.get(&org).await?;
                    let view = serde_json::json!({ "stored": record, "effective": settings });
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                SettingsCmd::Delete { org } => {
                    if repo.delete(&org).await? {
                        println!("deleted {org}");
                    } else {
                        anyhow::bail!("no admin settings for organization {org}");
                    }
                }
            }
        }

        Commands::Db { cmd: DbCmd::Status } => {
            let (total, applied) = quote_settings::migrations::migration_status(db.pool()).await?;
            println!("migrations: {applied}/{total} applied");
        }
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}
