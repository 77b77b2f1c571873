mod commands;
mod gateway;
mod logging;

use clap::{Parser, Subcommand};
use machma_channels::telegram::TelegramChannel;
use machma_core::config::{self, StoreConfig, TELEGRAM_TOKEN_ENV};
use machma_core::traits::Channel;
use machma_store::{Scope, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "machma",
    version,
    about = "machma — Telegram bot for a rep-counting fitness game"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start {
        /// Use a throwaway in-memory database instead of the configured one.
        #[arg(long)]
        ethereal_db: bool,
        /// Seed the database with demo users, exercises and reps.
        #[arg(long, requires = "ethereal_db")]
        dummy_data: bool,
        /// Log every SQL statement.
        #[arg(long)]
        sql_debug: bool,
    },
    /// Show configuration and database counts.
    Status,
    /// Print max, own and todo reps of a user.
    Report {
        /// Telegram user id.
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    let sql_debug = matches!(cli.command, Commands::Start { sql_debug: true, .. });
    let _log_guard = logging::init(&cfg.machma, sql_debug)?;

    match cli.command {
        Commands::Start {
            ethereal_db,
            dummy_data,
            ..
        } => {
            let store_config = if ethereal_db {
                StoreConfig::in_memory()
            } else {
                cfg.store.clone()
            };
            let store = Store::new(&store_config).await?;

            if dummy_data {
                store
                    .scoped(async |scope: &mut Scope| scope.seed_demo_data().await)
                    .await?;
                info!("seeded demo data");
            }

            // Build channels.
            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();

            if let Some(ref tg) = cfg.channel.telegram {
                if tg.enabled {
                    if tg.bot_token.is_empty() {
                        anyhow::bail!(
                            "Telegram is enabled but bot_token is empty. \
                             Set it in config.toml or the {TELEGRAM_TOKEN_ENV} env var."
                        );
                    }
                    let channel = TelegramChannel::new(tg.clone());
                    channels.insert("telegram".to_string(), Arc::new(channel));
                }
            }

            if channels.is_empty() {
                anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
            }

            println!("machma — Starting bot...");
            gateway::Gateway::new(channels, store).run().await?;
        }
        Commands::Status => {
            println!("machma — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Database: {}", cfg.store.db_path);
            println!();

            if let Some(ref tg) = cfg.channel.telegram {
                println!(
                    "  telegram: {}",
                    if tg.enabled && !tg.bot_token.is_empty() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                );
            } else {
                println!("  telegram: not configured");
            }

            let stats = Store::new(&cfg.store).await?.stats().await?;
            println!();
            println!("  users:     {}", stats.users);
            println!("  exercises: {}", stats.exercises);
            println!("  aliases:   {}", stats.aliases);
            println!("  rep rows:  {}", stats.rep_rows);
        }
        Commands::Report { user_id } => {
            let store = Store::new(&cfg.store).await?;
            let (max, own, todo) = store
                .scoped(async |scope: &mut Scope| {
                    let own = scope.get_user_reps(user_id).await?;
                    let todo = scope.get_user_todo_reps(user_id).await?;
                    let max = scope.get_max_reps().await?;
                    Ok::<_, machma_core::error::MachmaError>((max, own, todo))
                })
                .await?;

            let rows: Vec<Vec<commands::format::Cell>> = max
                .iter()
                .map(|(exercise, max_reps)| {
                    vec![
                        commands::format::Cell::text(exercise.as_str()),
                        commands::format::Cell::number(*max_reps),
                        commands::format::Cell::number(own.get(exercise).copied().unwrap_or(0)),
                        commands::format::Cell::number(todo.get(exercise).copied().unwrap_or(0)),
                    ]
                })
                .collect();
            println!(
                "{}",
                commands::format::table(&["Exercise", "Max", "Done", "Todo"], &rows)
            );
        }
    }

    Ok(())
}
