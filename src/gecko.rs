//! GeckoTerminal API client for pool discovery and price sampling
//!
//! All numeric attributes arrive as decimal strings (or are missing).
//! Parsing goes through [`parse_num`], which degrades failures to NaN so
//! threshold comparisons downstream fail closed instead of panicking.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Fields of a pool summary from the discovery listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSummaryAttributes {
    pub address: String,
    pub name: String,
    #[serde(rename = "reserve_in_usd")]
    pub reserve_in_usd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipData {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub data: RelationshipData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRelationships {
    pub dex: Relationship,
    #[serde(rename = "base_token")]
    pub base_token: Relationship,
}

/// One entry of the discovery listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSummary {
    pub attributes: PoolSummaryAttributes,
    pub relationships: PoolRelationships,
}

impl PoolSummary {
    /// Venue identifier, lowercased for allow-list comparison
    pub fn venue(&self) -> String {
        self.relationships.dex.data.id.to_lowercase()
    }

    /// Base token mint, with the network prefix stripped
    pub fn base_token_mint(&self) -> String {
        self.relationships
            .base_token
            .data
            .id
            .trim_start_matches("solana_")
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PoolListResponse {
    #[serde(default)]
    data: Vec<PoolSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeUsd {
    pub h24: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxnWindow {
    pub buys: Option<u64>,
    pub sells: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transactions {
    #[serde(default)]
    pub h24: TxnWindow,
}

/// Attributes of the per-pool detail endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolAttributes {
    #[serde(rename = "base_token_price_usd")]
    pub base_token_price_usd: Option<String>,
    #[serde(rename = "reserve_in_usd")]
    pub reserve_in_usd: Option<String>,
    #[serde(rename = "locked_liquidity_percentage")]
    pub locked_liquidity_percentage: Option<String>,
    #[serde(default)]
    pub volume_usd: VolumeUsd,
    #[serde(rename = "fdv_usd")]
    pub fdv_usd: Option<String>,
    #[serde(default)]
    pub transactions: Transactions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDetail {
    pub attributes: PoolAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PoolDetailResponse {
    data: Option<PoolDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionPercentage {
    pub top_10: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldersInfo {
    pub count: Option<u64>,
    #[serde(default)]
    pub distribution_percentage: DistributionPercentage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenInfoAttributes {
    #[serde(default)]
    pub holders: HoldersInfo,
    pub twitter_handle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub attributes: TokenInfoAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenInfoResponse {
    data: Option<TokenInfo>,
}

/// Parse an optional decimal-string field to f64, NaN on absence or garbage.
///
/// NaN fails every `>` threshold comparison, so a missing field can never
/// slip through an admission gate.
pub fn parse_num(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Spot-price source, the one seam the sampling scheduler depends on
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current base-token USD price of a pool
    async fn spot_price(&self, pool_address: &str) -> Result<f64>;
}

/// Full market-data surface used by discovery and admission
#[async_trait]
pub trait MarketData: PriceSource {
    /// Most-recent-first listing of newly created pools
    async fn new_pools(&self) -> Result<Vec<PoolSummary>>;

    /// Detail attributes for one pool
    async fn pool_detail(&self, pool_address: &str) -> Result<PoolAttributes>;

    /// Token-level info (holders, socials)
    async fn token_info(&self, token_address: &str) -> Result<TokenInfoAttributes>;
}

/// GeckoTerminal HTTP client
pub struct GeckoClient {
    client: reqwest::Client,
    base_url: String,
    network: String,
}

impl GeckoClient {
    pub fn new(base_url: String, network: String, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            base_url,
            network,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        resp.json::<T>().await.map_err(|e| Error::MalformedPayload {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl MarketData for GeckoClient {
    async fn new_pools(&self) -> Result<Vec<PoolSummary>> {
        let url = format!("{}/networks/{}/new_pools?page=1", self.base_url, self.network);
        let listing: PoolListResponse = self.get_json("new_pools", &url).await?;
        Ok(listing.data)
    }

    async fn pool_detail(&self, pool_address: &str) -> Result<PoolAttributes> {
        let url = format!(
            "{}/networks/{}/pools/{}",
            self.base_url, self.network, pool_address
        );
        let detail: PoolDetailResponse = self.get_json("pool_detail", &url).await?;
        detail
            .data
            .map(|d| d.attributes)
            .ok_or_else(|| Error::MalformedPayload {
                endpoint: "pool_detail".into(),
                detail: "empty data envelope".into(),
            })
    }

    async fn token_info(&self, token_address: &str) -> Result<TokenInfoAttributes> {
        let url = format!(
            "{}/networks/{}/tokens/{}/info",
            self.base_url, self.network, token_address
        );
        let info: TokenInfoResponse = self.get_json("token_info", &url).await?;
        info.data
            .map(|d| d.attributes)
            .ok_or_else(|| Error::MalformedPayload {
                endpoint: "token_info".into(),
                detail: "empty data envelope".into(),
            })
    }
}

#[async_trait]
impl PriceSource for GeckoClient {
    async fn spot_price(&self, pool_address: &str) -> Result<f64> {
        let attributes = self.pool_detail(pool_address).await?;
        attributes
            .base_token_price_usd
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| Error::MalformedPayload {
                endpoint: "pool_detail".into(),
                detail: format!("no usable base_token_price_usd for {pool_address}"),
            })
    }
}
