mod commands;
mod config;
mod notify;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_add, cmd_backfill, cmd_categories, cmd_delete, cmd_export, cmd_list, cmd_recent,
    cmd_search, cmd_show, cmd_stats, cmd_sync, cmd_update,
};
use crate::config::Config;
use crate::notify::Notifier;
use larder_core::db::Database;
use larder_core::models::RecordKind;
use larder_core::sync::sync_content_dir;

#[derive(Parser)]
#[command(
    name = "larder",
    version,
    about = "A self-hosted recipe box and food tip CLI",
    long_about = "\n\n  ██╗      █████╗ ██████╗ ██████╗ ███████╗██████╗
  ██║     ██╔══██╗██╔══██╗██╔══██╗██╔════╝██╔══██╗
  ██║     ███████║██████╔╝██║  ██║█████╗  ██████╔╝
  ██║     ██╔══██║██╔══██╗██║  ██║██╔══╝  ██╔══██╗
  ███████╗██║  ██║██║  ██║██████╔╝███████╗██║  ██║
  ╚══════╝╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚══════╝╚═╝  ╚═╝
            every recipe in its place.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes or tips
    List {
        /// Record kind: recipes or tips
        kind: String,
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only show highlighted records
        #[arg(long)]
        highlighted: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single record in full
    Show {
        /// Record kind: recipe or tip
        kind: String,
        /// Record ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a record from a JSON file (object with a "type" field)
    Add {
        /// Path to the JSON file, or "-" for stdin
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace a record's fields from a JSON file
    Update {
        /// Record kind: recipe or tip
        kind: String,
        /// Record ID
        id: i64,
        /// Path to the JSON file, or "-" for stdin
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a record by ID
    Delete {
        /// Record kind: recipe or tip
        kind: String,
        /// Record ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search recipes and tips by title, contents, and notes
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List categories with record counts
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show records added in the last N days
    Recent {
        /// Number of days to look back
        #[arg(short, long, default_value = "7")]
        days: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show record counts
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mirror the content directory into the database
    Sync {
        /// Content directory (default: the configured one)
        #[arg(long, value_name = "DIR")]
        content_dir: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export every record as pretty-printed JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Output a summary as JSON (only with --output)
        #[arg(long)]
        json: bool,
    },
    /// Fill in missing created_at values from conversation exports
    BackfillDates {
        /// Directory of conversation JSON exports
        conversations_dir: PathBuf,
        /// Preview without writing changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the JSON API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "65432")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Start without an API token (/api requests answer 503)
        #[arg(long)]
        no_token: bool,
        /// Skip the content sync pass on startup
        #[arg(long)]
        skip_sync: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;
    let notifier = Notifier::new(config.webhook_url.clone(), &config.site_url);

    match cli.command {
        Commands::List {
            kind,
            category,
            highlighted,
            json,
        } => cmd_list(
            &db,
            kind.parse::<RecordKind>()?,
            category.as_deref(),
            highlighted,
            json,
        ),
        Commands::Show { kind, id, json } => cmd_show(&db, kind.parse::<RecordKind>()?, id, json),
        Commands::Add { file, json } => cmd_add(&db, &notifier, &file, json).await,
        Commands::Update {
            kind,
            id,
            file,
            json,
        } => cmd_update(&db, kind.parse::<RecordKind>()?, id, &file, json),
        Commands::Delete { kind, id, json } => {
            cmd_delete(&db, kind.parse::<RecordKind>()?, id, json)
        }
        Commands::Search { query, json } => cmd_search(&db, &query, json),
        Commands::Categories { json } => cmd_categories(&db, json),
        Commands::Recent { days, json } => cmd_recent(&db, days, json),
        Commands::Stats { json } => cmd_stats(&db, json),
        Commands::Sync { content_dir, json } => {
            let dir = content_dir.unwrap_or_else(|| config.content_dir.clone());
            cmd_sync(&db, &dir, json)
        }
        Commands::Export { output, json } => cmd_export(&db, output.as_deref(), json),
        Commands::BackfillDates {
            conversations_dir,
            dry_run,
            json,
        } => cmd_backfill(&db, &conversations_dir, dry_run, json),
        Commands::Serve {
            port,
            bind,
            no_token,
            skip_sync,
        } => {
            let api_token = if no_token {
                None
            } else if let Some(token) = config.api_token.clone() {
                Some(token)
            } else {
                let (token, _) = config.load_or_create_api_token()?;
                Some(token)
            };

            if !skip_sync && config.content_dir.is_dir() {
                let summary = sync_content_dir(&db, &config.content_dir)?;
                if summary.changed() > 0 {
                    eprintln!(
                        "Content sync: {} inserted, {} updated, {} deleted",
                        summary.inserted, summary.updated, summary.deleted
                    );
                }
            }

            server::start_server(db, notifier, port, &bind, api_token).await
        }
    }
}
