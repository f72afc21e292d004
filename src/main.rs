use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use golosura::cli::{Cli, Commands};
use golosura::core::{config, init_logger};
use golosura::storage::db::contest_stats;
use golosura::storage::{create_pool, get_connection, FsBlobStore};
use golosura::telegram::{create_bot, schema, setup_bot_commands, subscription, HandlerDeps, SessionStore};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up global panic handler to catch panics in the dispatcher
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env if present (before the config
    // statics are first touched)
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Migrate) => run_migrate(),
        Some(Commands::Stats) => run_stats(),
    }
}

/// Run the bot in long-polling mode
async fn run_bot() -> Result<()> {
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );
    let blob = Arc::new(FsBlobStore::new(config::PHOTOS_DIR.as_str())?);
    let sessions = Arc::new(SessionStore::new());

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    match subscription::bound_channel(&db_pool) {
        Ok(Some(channel)) => log::info!("Subscription-check channel: {}", channel.0),
        Ok(None) => log::warn!("No subscription-check channel bound yet"),
        Err(e) => log::error!("Failed to read channel binding: {}", e),
    }

    if config::admin::ADMIN_PASSWORD.is_empty() {
        log::warn!("ADMIN_PASSWORD not set - the admin panel is disabled");
    }

    let deps = HandlerDeps::new(db_pool, blob, sessions);

    log::info!("Starting dispatcher...");
    Dispatcher::builder(bot, schema(deps))
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    log::info!("Dispatcher shutdown gracefully");

    Ok(())
}

/// Apply migrations and exit (pool creation runs them)
fn run_migrate() -> Result<()> {
    create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    log::info!("Database schema is up to date: {}", *config::DATABASE_PATH);
    Ok(())
}

/// Print contest statistics to stdout and exit
#[allow(clippy::print_stdout)]
fn run_stats() -> Result<()> {
    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;
    let conn = get_connection(&pool)?;
    let stats = contest_stats(&conn)?;

    println!("Contestants: {}", stats.total_contestants);
    println!("Votes:       {}", stats.total_votes);
    for (category, count) in &stats.per_category {
        println!("  category {}: {} contestants", category.id(), count);
    }
    if !stats.top.is_empty() {
        println!("Top:");
        for (name, votes, category) in &stats.top {
            println!("  {} — {} votes (category {})", name, votes, category.id());
        }
    }
    Ok(())
}
