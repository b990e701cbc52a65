//! Two-stage admission gate for newly discovered pools
//!
//! Stage 1 only looks at fields embedded in the discovery listing, so a
//! rejected pool costs zero extra API calls. Stage 2 re-fetches the pool
//! and checks liquidity again together with the locked-liquidity floor.
//! Every parse failure degrades to NaN, which fails the `>` comparisons.

use std::time::Duration;
use tracing::{info, warn};

use crate::config::AdmissionConfig;
use crate::gecko::{parse_num, MarketData, PoolSummary};
use crate::registry::{DiscoverySnapshot, PoolRecord};

/// Evaluates discovery-listing entries against the liquidity/lock gate
pub struct AdmissionFilter {
    config: AdmissionConfig,
}

impl AdmissionFilter {
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }

    /// Stage 1: listing-embedded fields only. No API calls are made here.
    pub fn stage_one(&self, summary: &PoolSummary, already_tracked: bool) -> bool {
        if already_tracked {
            return false;
        }
        if !self.config.venues.contains(&summary.venue()) {
            return false;
        }
        let liquidity = parse_num(summary.attributes.reserve_in_usd.as_deref());
        liquidity > self.config.min_liquidity_usd
    }

    /// Stage 2: re-fetched liquidity and the locked-liquidity floor.
    /// NaN inputs (fetch or parse failure upstream) reject.
    pub fn stage_two(&self, liquidity: f64, locked_pct: f64) -> bool {
        liquidity > self.config.min_liquidity_usd && locked_pct > self.config.min_locked_pct
    }

    /// Run the full gate plus enrichment for one listed pool.
    ///
    /// Returns the fully enriched record when both stages pass, `None`
    /// otherwise. Enrichment failures degrade fields to NaN without
    /// rejecting the pool; only the gate itself rejects.
    pub async fn evaluate<M: MarketData>(
        &self,
        source: &M,
        summary: &PoolSummary,
        already_tracked: bool,
        now: f64,
    ) -> Option<PoolRecord> {
        let address = &summary.attributes.address;

        if !self.stage_one(summary, already_tracked) {
            return None;
        }

        // rate-limit headroom before the expensive detail fetch
        tokio::time::sleep(Duration::from_secs(self.config.detail_delay_secs)).await;

        let (liquidity, locked_pct, detail) = match source.pool_detail(address).await {
            Ok(detail) => {
                let liquidity = parse_num(detail.reserve_in_usd.as_deref());
                // a missing lock percentage means nothing is locked
                let locked_pct = match detail.locked_liquidity_percentage.as_deref() {
                    Some(raw) => raw.parse::<f64>().unwrap_or(f64::NAN),
                    None => 0.0,
                };
                (liquidity, locked_pct, Some(detail))
            }
            Err(e) => {
                warn!("Detail fetch failed for {}: {}", address, e);
                (f64::NAN, f64::NAN, None)
            }
        };

        if !self.stage_two(liquidity, locked_pct) {
            return None;
        }
        let detail = detail?;

        let volume = parse_num(detail.volume_usd.h24.as_deref());
        let market_cap = parse_num(detail.fdv_usd.as_deref());
        let price_at_discovery = parse_num(detail.base_token_price_usd.as_deref());
        let buys = detail.transactions.h24.buys.unwrap_or(0);
        let sells = detail.transactions.h24.sells.unwrap_or(0);
        let buy_sell_ratio = if buys > 0 {
            buys as f64 / (buys + sells) as f64
        } else {
            f64::NAN
        };
        let volume_to_marketcap_ratio = if volume > 0.0 && market_cap > 0.0 {
            volume / market_cap
        } else {
            f64::NAN
        };

        tokio::time::sleep(Duration::from_secs(self.config.info_delay_secs)).await;

        let (holders, top_10, twitter) = match source.token_info(&summary.base_token_mint()).await {
            Ok(info) => {
                let holders = info.holders.count.unwrap_or(0) as f64;
                let top_10 = info
                    .holders
                    .distribution_percentage
                    .top_10
                    .as_deref()
                    .map(|raw| raw.parse::<f64>().unwrap_or(f64::NAN))
                    .unwrap_or(0.0);
                let twitter = if info.twitter_handle.is_some() { 1.0 } else { 0.0 };
                (holders, top_10, twitter)
            }
            Err(e) => {
                warn!("Token info fetch failed for {}: {}", address, e);
                (f64::NAN, f64::NAN, f64::NAN)
            }
        };

        info!(
            "Admitted {} ({}): liquidity={:.0} locked={:.1}%",
            summary.attributes.name, address, liquidity, locked_pct
        );

        Some(PoolRecord::new(
            address.clone(),
            summary.attributes.name.clone(),
            DiscoverySnapshot {
                liquidity,
                volume,
                market_cap,
                holders,
                top_10,
                twitter,
                buy_sell_ratio,
                volume_to_marketcap_ratio,
                price_at_discovery,
            },
            now,
        ))
    }
}
