//! Trading bot: admission gate, classifier entry, buy/sell cycle
//!
//! Shares the collector's admission gate and discovery flow, but instead of
//! tracking checkpoints it scores the discovery snapshot with the
//! pre-trained classifier and runs a buy/sell cycle through Jupiter. Open
//! positions are monitored each pass with the same per-pool isolation the
//! sampler uses: one dead price feed never stalls the others.

use solana_client::rpc_client::RpcClient;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::admission::AdmissionFilter;
use crate::agent::BoostAgent;
use crate::collector::unix_now;
use crate::config::{Config, TradingConfig};
use crate::error::Result;
use crate::gecko::MarketData;
use crate::model::Classifier;
use crate::notify::TelegramNotifier;
use crate::registry::PoolRecord;
use crate::storage::{Position, PositionStore, TradeEntry, TradeLog};
use crate::trading::executor::SwapExecutor;
use crate::trading::jupiter::{JupiterClient, WSOL_MINT};
use crate::trading::wallet;

/// Why a position is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
}

/// Exit rule shared by the monitor loop and the manual sell path
pub fn check_exit(
    config: &TradingConfig,
    entry_price: f64,
    current_price: f64,
) -> Option<ExitReason> {
    if current_price >= config.take_profit_multiple * entry_price {
        Some(ExitReason::TakeProfit)
    } else if current_price <= config.stop_loss_multiple * entry_price {
        Some(ExitReason::StopLoss)
    } else {
        None
    }
}

/// The trading bot
pub struct TradingBot<M: MarketData> {
    source: M,
    filter: AdmissionFilter,
    classifier: Classifier,
    jupiter: JupiterClient,
    position_store: PositionStore,
    trade_log: TradeLog,
    notifier: Option<TelegramNotifier>,
    agent: Option<BoostAgent>,
    /// None in dry-run mode: no wallet, no RPC, no real swaps
    executor: Option<SwapExecutor>,
    rpc: Option<Arc<RpcClient>>,
    positions: HashMap<String, Position>,
    /// Addresses that already went through stage 1, never re-evaluated
    seen: HashSet<String>,
    trading: TradingConfig,
    monitor_delay: Duration,
    pass_delay: Duration,
}

impl<M: MarketData> TradingBot<M> {
    pub async fn new(config: &Config, source: M, dry_run: bool) -> Result<Self> {
        let classifier = Classifier::load(&config.storage.model_path)?;

        let position_store = PositionStore::new(&config.storage.positions_path);
        let positions = position_store.load().await?;

        let (executor, rpc) = if dry_run {
            warn!("Running in DRY-RUN mode - no real trades will be executed");
            (None, None)
        } else {
            let keypair = Arc::new(wallet::load_keypair()?);
            let rpc = Arc::new(RpcClient::new_with_timeout(
                config.rpc.endpoint.clone(),
                Duration::from_millis(config.rpc.timeout_ms),
            ));
            (
                Some(SwapExecutor::new(rpc.clone(), keypair)),
                Some(rpc),
            )
        };

        Ok(Self {
            source,
            filter: AdmissionFilter::new(config.admission.clone()),
            classifier,
            jupiter: JupiterClient::new(config.jupiter.clone()),
            position_store,
            trade_log: TradeLog::new(&config.storage.trade_log_path),
            notifier: TelegramNotifier::from_config(&config.telegram),
            agent: BoostAgent::from_config(&config.agent),
            executor,
            rpc,
            positions,
            seen: HashSet::new(),
            trading: config.trading.clone(),
            monitor_delay: Duration::from_secs(config.trading.monitor_delay_secs),
            pass_delay: Duration::from_secs(config.sampling.pass_delay_secs),
        })
    }

    pub fn open_positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Run forever. Terminates only on a fatal persistence failure.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Trading bot started with {} open positions",
            self.positions.len()
        );

        loop {
            self.run_pass(unix_now()).await?;
            tokio::time::sleep(self.pass_delay).await;
        }
    }

    /// One pass: evaluate the discovery listing, then monitor positions
    pub async fn run_pass(&mut self, now: f64) -> Result<()> {
        let listing = match self.source.new_pools().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Discovery listing fetch failed: {} (skipping pass)", e);
                Vec::new()
            }
        };

        for summary in &listing {
            let address = &summary.attributes.address;
            let already = self.seen.contains(address) || self.positions.contains_key(address);
            if !self.filter.stage_one(summary, already) {
                continue;
            }
            self.seen.insert(address.clone());

            let Some(record) = self.filter.evaluate(&self.source, summary, false, now).await
            else {
                continue;
            };

            if !self.classifier.predict(&record.snapshot) {
                info!("Classifier rejected {} ({})", record.name, record.address);
                continue;
            }

            let mint = summary.base_token_mint();
            if let Err(e) = self.buy(&record, &mint).await {
                if e.is_fatal() {
                    return Err(e);
                }
                error!("Buy failed for {}: {}", record.address, e);
            }
        }

        self.check_positions().await
    }

    /// Open a position in the pool's base token
    async fn buy(&mut self, record: &PoolRecord, mint: &str) -> Result<()> {
        let entry_price = record.snapshot.price_at_discovery;

        let tx_signature = match (&self.executor, &self.rpc) {
            (Some(executor), Some(rpc)) => {
                let balance = wallet::sol_balance(rpc, &executor.pubkey())?;
                if balance < self.trading.buy_amount_sol {
                    warn!(
                        "Skipping buy of {}: balance {balance} SOL below buy amount",
                        record.address
                    );
                    return Ok(());
                }

                let lamports = (self.trading.buy_amount_sol * 1e9) as u64;
                info!("SOL -> {} - Pool: {}", mint, record.address);
                let quote = self.jupiter.quote(WSOL_MINT, mint, lamports).await?;
                let tx = self
                    .jupiter
                    .swap_transaction(&executor.pubkey().to_string(), &quote)
                    .await?;
                executor.execute(&tx)?
            }
            _ => "dry-run".to_string(),
        };

        self.positions.insert(
            record.address.clone(),
            Position {
                token_mint: mint.to_string(),
                entry_price,
                tx_signature,
                entry_time: chrono::Utc::now(),
            },
        );
        self.position_store.save(&self.positions).await?;
        info!(
            "Opened position in {} at entry price {}",
            record.address, entry_price
        );

        self.announce(&record.address).await;
        Ok(())
    }

    /// Boost lookup + Telegram announcement, both best-effort
    async fn announce(&self, pool_address: &str) {
        let Some(agent) = &self.agent else { return };
        let boost = match agent.boosts(pool_address).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Boost agent failed for {}: {}", pool_address, e);
                return;
            }
        };
        if boost == 0 {
            return;
        }
        if let Some(notifier) = &self.notifier {
            let text = TelegramNotifier::entry_message(pool_address, boost);
            if let Err(e) = notifier.send(&text).await {
                warn!("Telegram announcement failed: {}", e);
            }
        }
    }

    /// Walk open positions and close any that hit an exit rule.
    ///
    /// Price fetch failures skip that position for the pass; the entry
    /// stays open and is re-checked next time.
    pub async fn check_positions(&mut self) -> Result<()> {
        let open: Vec<(String, Position)> = self
            .positions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (address, position) in open {
            tokio::time::sleep(self.monitor_delay).await;

            let price = match self.source.spot_price(&address).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(
                        "Price check failed for position {}: {} (will retry)",
                        address, e
                    );
                    continue;
                }
            };

            let Some(reason) = check_exit(&self.trading, position.entry_price, price) else {
                continue;
            };

            match reason {
                ExitReason::TakeProfit => info!(
                    "Take profit on {}: {} >= {}x entry",
                    address, price, self.trading.take_profit_multiple
                ),
                ExitReason::StopLoss => info!(
                    "Stop loss on {}: {} <= {}x entry",
                    address, price, self.trading.stop_loss_multiple
                ),
            }

            if let Err(e) = self.sell(&address, &position).await {
                if e.is_fatal() {
                    return Err(e);
                }
                error!("Sell failed for {}: {}", address, e);
            }
        }

        Ok(())
    }

    /// Close one position: swap the held tokens back to SOL and log it
    pub async fn sell(&mut self, pool_address: &str, position: &Position) -> Result<()> {
        let (tx_signature, sol_out) = match (&self.executor, &self.rpc) {
            (Some(executor), Some(rpc)) => {
                let balance =
                    wallet::token_balance(rpc, &executor.pubkey(), &position.token_mint)?;
                // pump.fun tokens use 6 decimals
                let amount = (balance * 1e6) as u64;
                if amount == 0 {
                    warn!(
                        "No tokens to sell for {} (position dropped)",
                        position.token_mint
                    );
                    ("no-balance".to_string(), None)
                } else {
                    info!("{} -> SOL - Pool: {}", position.token_mint, pool_address);
                    let quote = self
                        .jupiter
                        .quote(&position.token_mint, WSOL_MINT, amount)
                        .await?;
                    let sol_out = quote.out_amount_sol();
                    let tx = self
                        .jupiter
                        .swap_transaction(&executor.pubkey().to_string(), &quote)
                        .await?;
                    (executor.execute(&tx)?, Some(sol_out))
                }
            }
            _ => ("dry-run".to_string(), None),
        };

        self.trade_log.append(&TradeEntry {
            pool_address: pool_address.to_string(),
            token_mint: position.token_mint.clone(),
            timestamp: chrono::Utc::now(),
            tx_signature,
            sol_out,
        })?;

        self.positions.remove(pool_address);
        self.position_store.save(&self.positions).await?;
        info!("Closed position in {}", pool_address);
        Ok(())
    }

    /// Manual close, used by the `sell` subcommand
    pub async fn sell_position(&mut self, pool_address: &str) -> Result<()> {
        let position = self
            .positions
            .get(pool_address)
            .cloned()
            .ok_or_else(|| crate::error::Error::PositionNotFound(pool_address.to_string()))?;
        self.sell(pool_address, &position).await
    }
}
