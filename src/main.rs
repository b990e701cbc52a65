//! Pumpswap Scout - new-pool data collector and trading bot
//!
//! # WARNING
//! - The trading bot trades with real money. Only use funds you can
//!   afford to lose.
//! - Most freshly listed pools go to zero (rug pulls, abandonment).

use anyhow::Result;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use tracing::{error, info};

// Use the library crate
use pumpswap_scout::collector::Collector;
use pumpswap_scout::config::Config;
use pumpswap_scout::gecko::GeckoClient;
use pumpswap_scout::storage::{DatasetStore, PositionStore};
use pumpswap_scout::trading::TradingBot;

/// Pumpswap Scout - pool data collector and trading bot
#[derive(Parser)]
#[command(name = "scout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the data collector (admission + checkpoint sampling)
    Collect,

    /// Run the trading bot
    Trade {
        /// Run in dry-run mode (no real trades)
        #[arg(long)]
        dry_run: bool,
    },

    /// Manually close one open position
    Sell {
        /// Pool address of the position
        pool: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show dataset and open-position summary
    Status,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pumpswap_scout=info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Collect => collect(&config).await,
        Commands::Trade { dry_run } => trade(&config, dry_run).await,
        Commands::Sell { pool, force } => sell(&config, &pool, force).await,
        Commands::Status => status(&config).await,
        Commands::Config => {
            println!("{}", config.masked_display());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Run the long-running data collector
async fn collect(config: &Config) -> Result<()> {
    info!("Starting pool data collector...");
    let client = GeckoClient::new(
        config.api.base_url.clone(),
        config.api.network.clone(),
        config.api.timeout_ms,
    );

    let mut collector = Collector::new(config, client)?;
    collector.run().await?;
    Ok(())
}

/// Run the trading bot
async fn trade(config: &Config, dry_run: bool) -> Result<()> {
    info!("Starting trading bot...");
    info!(
        "Buy amount: {} SOL, take profit: {}x, stop loss: {}x",
        config.trading.buy_amount_sol,
        config.trading.take_profit_multiple,
        config.trading.stop_loss_multiple
    );

    let client = GeckoClient::new(
        config.api.base_url.clone(),
        config.api.network.clone(),
        config.api.timeout_ms,
    );

    let mut bot = TradingBot::new(config, client, dry_run).await?;
    bot.run().await?;
    Ok(())
}

/// Manually close one position
async fn sell(config: &Config, pool: &str, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Sell position in {pool}?"))
            .default(false)
            .interact()?;
        if !confirmed {
            info!("Sell cancelled");
            return Ok(());
        }
    }

    let client = GeckoClient::new(
        config.api.base_url.clone(),
        config.api.network.clone(),
        config.api.timeout_ms,
    );

    let mut bot = TradingBot::new(config, client, false).await?;
    bot.sell_position(pool).await?;
    Ok(())
}

/// Print a summary of the dataset and open positions
async fn status(config: &Config) -> Result<()> {
    let registry = DatasetStore::new(&config.storage.dataset_path).load()?;
    let fully_sampled = registry.iter().filter(|r| r.is_fully_sampled()).count();
    println!(
        "Tracked pools: {} ({} fully sampled)",
        registry.len(),
        fully_sampled
    );

    let positions = PositionStore::new(&config.storage.positions_path)
        .load()
        .await?;
    println!("Open positions: {}", positions.len());
    for (pool, position) in &positions {
        println!(
            "  {} -> {} entry {} at {}",
            pool, position.token_mint, position.entry_price, position.entry_time
        );
    }

    Ok(())
}
