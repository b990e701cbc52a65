//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub jupiter: JupiterConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Market-data API (GeckoTerminal) settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Network segment in the API path
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default = "default_api_timeout_ms")]
    pub timeout_ms: u64,
}

/// Two-stage admission gate thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionConfig {
    /// Reported liquidity must exceed this (USD)
    #[serde(default = "default_min_liquidity_usd")]
    pub min_liquidity_usd: f64,
    /// Locked liquidity percentage must exceed this
    #[serde(default = "default_min_locked_pct")]
    pub min_locked_pct: f64,
    /// Allow-listed venue identifiers
    #[serde(default = "default_venues")]
    pub venues: Vec<String>,
    /// Pause before the stage-2 detail fetch (API rate limit headroom)
    #[serde(default = "default_detail_delay_secs")]
    pub detail_delay_secs: u64,
    /// Pause before the token-info fetch
    #[serde(default = "default_info_delay_secs")]
    pub info_delay_secs: u64,
}

/// Pacing budget for the checkpoint sampler
#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Delay before each hour-granularity checkpoint fetch
    #[serde(default = "default_hourly_delay_secs")]
    pub hourly_delay_secs: u64,
    /// Delay before the 60-minute checkpoint fetch
    #[serde(default = "default_final_minute_delay_secs")]
    pub final_minute_delay_secs: u64,
    /// Delay between polling-driver passes
    #[serde(default = "default_pass_delay_secs")]
    pub pass_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    #[serde(default = "default_positions_path")]
    pub positions_path: String,
    #[serde(default = "default_trade_log_path")]
    pub trade_log_path: String,
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_rpc_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JupiterConfig {
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
    #[serde(default = "default_swap_url")]
    pub swap_url: String,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    #[serde(default = "default_max_priority_fee_lamports")]
    pub max_priority_fee_lamports: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_buy_amount_sol")]
    pub buy_amount_sol: f64,
    /// Sell when price reaches this multiple of entry
    #[serde(default = "default_take_profit_multiple")]
    pub take_profit_multiple: f64,
    /// Sell when price falls to this multiple of entry
    #[serde(default = "default_stop_loss_multiple")]
    pub stop_loss_multiple: f64,
    /// Pause before each per-position price check
    #[serde(default = "default_monitor_delay_secs")]
    pub monitor_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Bot token; falls back to TELEGRAM_BOT_TOKEN env var when empty
    #[serde(default)]
    pub bot_token: String,
    /// Channel name, e.g. "@mychannel"
    #[serde(default)]
    pub channel: String,
}

/// LLM boost-checking agent
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,
    #[serde(default = "default_agent_model")]
    pub model: String,
    /// API key; falls back to OPENAI_API_KEY env var when empty
    #[serde(default)]
    pub api_key: String,
}

// Default value functions
fn default_api_base_url() -> String {
    "https://api.geckoterminal.com/api/v2".into()
}

fn default_network() -> String {
    "solana".into()
}

fn default_api_timeout_ms() -> u64 {
    10000
}

fn default_min_liquidity_usd() -> f64 {
    9999.0
}

fn default_min_locked_pct() -> f64 {
    89.0
}

fn default_venues() -> Vec<String> {
    vec!["pumpswap".into()]
}

fn default_detail_delay_secs() -> u64 {
    12
}

fn default_info_delay_secs() -> u64 {
    1
}

fn default_hourly_delay_secs() -> u64 {
    5
}

fn default_final_minute_delay_secs() -> u64 {
    2
}

fn default_pass_delay_secs() -> u64 {
    2
}

fn default_dataset_path() -> String {
    "pools_data.csv".into()
}

fn default_positions_path() -> String {
    "active_positions.json".into()
}

fn default_trade_log_path() -> String {
    "positions_logs.csv".into()
}

fn default_model_path() -> String {
    "model/forest.json".into()
}

fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn default_rpc_timeout_ms() -> u64 {
    30000
}

fn default_quote_url() -> String {
    "https://lite-api.jup.ag/swap/v1/quote".into()
}

fn default_swap_url() -> String {
    "https://lite-api.jup.ag/swap/v1/swap".into()
}

fn default_slippage_bps() -> u32 {
    50
}

fn default_max_priority_fee_lamports() -> u64 {
    10_000_000
}

fn default_buy_amount_sol() -> f64 {
    0.01
}

fn default_take_profit_multiple() -> f64 {
    2.0
}

fn default_stop_loss_multiple() -> f64 {
    0.49
}

fn default_monitor_delay_secs() -> u64 {
    1
}

fn default_agent_base_url() -> String {
    "https://api.openai.com".into()
}

fn default_agent_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            network: default_network(),
            timeout_ms: default_api_timeout_ms(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            min_liquidity_usd: default_min_liquidity_usd(),
            min_locked_pct: default_min_locked_pct(),
            venues: default_venues(),
            detail_delay_secs: default_detail_delay_secs(),
            info_delay_secs: default_info_delay_secs(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            hourly_delay_secs: default_hourly_delay_secs(),
            final_minute_delay_secs: default_final_minute_delay_secs(),
            pass_delay_secs: default_pass_delay_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            positions_path: default_positions_path(),
            trade_log_path: default_trade_log_path(),
            model_path: default_model_path(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_ms: default_rpc_timeout_ms(),
        }
    }
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            quote_url: default_quote_url(),
            swap_url: default_swap_url(),
            slippage_bps: default_slippage_bps(),
            max_priority_fee_lamports: default_max_priority_fee_lamports(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            buy_amount_sol: default_buy_amount_sol(),
            take_profit_multiple: default_take_profit_multiple(),
            stop_loss_multiple: default_stop_loss_multiple(),
            monitor_delay_secs: default_monitor_delay_secs(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            channel: String::new(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_agent_base_url(),
            model: default_agent_model(),
            api_key: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SCOUT_)
            .add_source(
                config::Environment::with_prefix("SCOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.admission.min_liquidity_usd <= 0.0 {
            anyhow::bail!("min_liquidity_usd must be positive");
        }

        if !(0.0..=100.0).contains(&self.admission.min_locked_pct) {
            anyhow::bail!("min_locked_pct must be between 0 and 100");
        }

        if self.admission.venues.is_empty() {
            anyhow::bail!("at least one allow-listed venue is required");
        }

        if self.trading.buy_amount_sol <= 0.0 {
            anyhow::bail!("buy_amount_sol must be positive");
        }

        if self.trading.take_profit_multiple <= 1.0 {
            anyhow::bail!("take_profit_multiple must exceed 1.0");
        }

        if self.trading.stop_loss_multiple <= 0.0 || self.trading.stop_loss_multiple >= 1.0 {
            anyhow::bail!("stop_loss_multiple must be between 0 and 1");
        }

        if self.jupiter.slippage_bps > 10000 {
            anyhow::bail!("slippage_bps cannot exceed 10000 (100%)");
        }

        if self.telegram.enabled && self.telegram.channel.is_empty() {
            anyhow::bail!("telegram.channel is required when telegram is enabled");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  API:
    base_url: {}
    network: {}
  Admission:
    min_liquidity: {} USD
    min_locked: {}%
    venues: {:?}
  Sampling:
    hourly_delay: {}s
    final_minute_delay: {}s
  Storage:
    dataset: {}
    positions: {}
  Trading:
    buy_amount: {} SOL
    take_profit: {}x
    stop_loss: {}x
  Telegram:
    enabled: {}
    bot_token: {}
  Agent:
    enabled: {}
    model: {}
"#,
            self.api.base_url,
            self.api.network,
            self.admission.min_liquidity_usd,
            self.admission.min_locked_pct,
            self.admission.venues,
            self.sampling.hourly_delay_secs,
            self.sampling.final_minute_delay_secs,
            self.storage.dataset_path,
            self.storage.positions_path,
            self.trading.buy_amount_sol,
            self.trading.take_profit_multiple,
            self.trading.stop_loss_multiple,
            self.telegram.enabled,
            if self.telegram.bot_token.is_empty() {
                "(not set)"
            } else {
                "***"
            },
            self.agent.enabled,
            self.agent.model,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            admission: AdmissionConfig::default(),
            sampling: SamplingConfig::default(),
            storage: StorageConfig::default(),
            rpc: RpcConfig::default(),
            jupiter: JupiterConfig::default(),
            trading: TradingConfig::default(),
            telegram: TelegramConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}
