//! # Campus Lost & Found CLI (`lostfound`)
//!
//! Runs the match server and offers local commands for inspecting items,
//! previewing prompts, and requesting match suggestions.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lostfound serve` | Start the HTTP match server |
//! | `lostfound items` | List items and dashboard statistics |
//! | `lostfound prompt <id>` | Print the prompt that would be sent for an item |
//! | `lostfound match <id>` | Request match suggestions for an item |
//!
//! ## Examples
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! lostfound serve --config ./config/lostfound.toml
//! lostfound match 1 --remote
//! lostfound match 1 --items ./reports.json --confirm
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lostfound::client::MatchClient;
use lostfound::config::{self, Config};
use lostfound::models::{Item, MatchSuggestion};
use lostfound::pipeline::MatchPipeline;
use lostfound::server;
use lostfound::store::{Command, ItemStore};

/// Campus Lost & Found — item tracking with AI-assisted match suggestions.
#[derive(Parser)]
#[command(name = "lostfound", version)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "./config/lostfound.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP match server on `[server].bind`.
    Serve,

    /// List items and dashboard statistics.
    Items {
        /// JSON file holding an array of items. Demo data when omitted.
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// Print the prompt that would be sent for an item. No model call is made.
    Prompt {
        /// Target item id.
        id: String,
        #[arg(long)]
        items: Option<PathBuf>,
    },

    /// Request match suggestions for an item.
    Match {
        /// Target item id.
        id: String,
        #[arg(long)]
        items: Option<PathBuf>,
        /// Go through the HTTP endpoint at `[client].endpoint` instead of
        /// calling the model in-process.
        #[arg(long)]
        remote: bool,
        /// Confirm the top suggestion and print the resulting items.
        #[arg(long)]
        confirm: bool,
    },
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_env("LOSTFOUND_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found; using defaults");
        Ok(Config::minimal())
    }
}

fn load_store(items: Option<&Path>) -> Result<ItemStore> {
    match items {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read items file: {}", path.display()))?;
            let items: Vec<Item> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse items file: {}", path.display()))?;
            Ok(ItemStore::with_items(items))
        }
        None => Ok(ItemStore::seeded()),
    }
}

fn print_items(store: &ItemStore) {
    println!(
        "{:<34} {:<6} {:<13} {:<28} LOCATION",
        "ID", "TYPE", "STATUS", "TITLE"
    );
    for item in store.items() {
        println!(
            "{:<34} {:<6} {:<13} {:<28} {}",
            item.id, item.disposition, item.status, item.title, item.location
        );
    }
    let stats = store.stats();
    println!();
    println!(
        "total: {}  lost: {}  found: {}  pending: {}  resolved: {}",
        stats.total,
        stats.total_lost,
        stats.total_found,
        stats.pending_cases,
        stats.resolved_cases
    );
}

fn print_suggestions(suggestions: &[MatchSuggestion]) {
    if suggestions.is_empty() {
        println!("No strong matches found.");
        return;
    }
    for s in suggestions {
        println!(
            "{:>5.1}%  lost {} <-> found {}",
            s.confidence * 100.0,
            s.lost_item_id,
            s.found_item_id
        );
        println!("        {}", s.reasoning);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let cfg = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Items { items } => {
            let store = load_store(items.as_deref())?;
            print_items(&store);
        }
        Commands::Prompt { id, items } => {
            let store = load_store(items.as_deref())?;
            let target = store
                .get(&id)
                .with_context(|| format!("item not found: {}", id))?;
            let pipeline = MatchPipeline::from_config(&cfg)?;
            match pipeline.prepare_prompt(target, &store.match_candidates()) {
                Some(prompt) => println!("{}", prompt),
                None => println!("No candidates of the opposite type; no prompt would be sent."),
            }
        }
        Commands::Match {
            id,
            items,
            remote,
            confirm,
        } => {
            let mut store = load_store(items.as_deref())?;
            let target = store
                .get(&id)
                .cloned()
                .with_context(|| format!("item not found: {}", id))?;
            let candidates = store.match_candidates();

            let suggestions = if remote {
                let client = MatchClient::new(&cfg.client)?;
                tracing::info!(endpoint = client.endpoint(), "requesting matches from server");
                client.find_smart_matches(Some(&target), &candidates).await
            } else {
                let pipeline = MatchPipeline::from_config(&cfg)?;
                pipeline.find_matches(&target, &candidates).await?
            };

            print_suggestions(&suggestions);

            if confirm {
                if let Some(top) = suggestions.first() {
                    let event = store.apply(Command::ConfirmMatch {
                        lost_item_id: top.lost_item_id.clone(),
                        found_item_id: top.found_item_id.clone(),
                    })?;
                    println!();
                    println!("{:?}", event);
                    print_items(&store);
                }
            }
        }
    }

    Ok(())
}
