//! Polling driver for the data collector
//!
//! One pass: pull the discovery listing, run every listed pool through the
//! admission gate, merge admitted records, advance the sampling ladder over
//! the whole registry, flush the dataset if anything changed. A listing
//! fetch failure skips the pass; only persistence failures end the run.

use std::time::Duration;
use tracing::{info, warn};

use crate::admission::AdmissionFilter;
use crate::config::Config;
use crate::error::Result;
use crate::gecko::MarketData;
use crate::registry::PoolRegistry;
use crate::sampler::SamplingScheduler;
use crate::storage::DatasetStore;

/// Current unix time in fractional seconds
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// The long-running collector: registry, gate, scheduler and store
pub struct Collector<M: MarketData> {
    source: M,
    filter: AdmissionFilter,
    scheduler: SamplingScheduler,
    store: DatasetStore,
    registry: PoolRegistry,
    pass_delay: Duration,
}

impl<M: MarketData> Collector<M> {
    /// Build a collector, reloading any previously tracked pools
    pub fn new(config: &Config, source: M) -> Result<Self> {
        let store = DatasetStore::new(&config.storage.dataset_path);
        let registry = store.load()?;

        Ok(Self {
            source,
            filter: AdmissionFilter::new(config.admission.clone()),
            scheduler: SamplingScheduler::new(config.sampling.clone()),
            store,
            registry,
            pass_delay: Duration::from_secs(config.sampling.pass_delay_secs),
        })
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    /// Run forever. Terminates only on a fatal persistence failure.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Collector started with {} tracked pools",
            self.registry.len()
        );

        loop {
            self.run_pass(unix_now()).await?;
            info!("Waiting for new pools...");
            tokio::time::sleep(self.pass_delay).await;
        }
    }

    /// One full pass. Returns whether the dataset was flushed.
    pub async fn run_pass(&mut self, now: f64) -> Result<bool> {
        let mut changed = false;

        let listing = match self.source.new_pools().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Discovery listing fetch failed: {} (skipping pass)", e);
                Vec::new()
            }
        };

        for summary in &listing {
            let already_tracked = self.registry.contains(&summary.attributes.address);
            if let Some(record) = self
                .filter
                .evaluate(&self.source, summary, already_tracked, now)
                .await
            {
                changed |= self.registry.insert(record);
            }
        }

        changed |= self
            .scheduler
            .advance_all(&self.source, &mut self.registry, now)
            .await;

        if changed {
            self.store.flush(&self.registry)?;
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::gecko::{
        PoolAttributes, PoolSummary, PriceSource, TokenInfoAttributes,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Scripted market: a fixed listing, detail and price responses
    struct ScriptedMarket {
        listing: Mutex<Vec<PoolSummary>>,
        price: f64,
        listing_fails: bool,
    }

    impl ScriptedMarket {
        fn with_listing(listing: Vec<PoolSummary>) -> Self {
            Self {
                listing: Mutex::new(listing),
                price: 0.0005,
                listing_fails: false,
            }
        }
    }

    fn summary(address: &str) -> PoolSummary {
        serde_json::from_value(serde_json::json!({
            "attributes": {
                "address": address,
                "name": format!("{address} / SOL"),
                "reserve_in_usd": "15000"
            },
            "relationships": {
                "dex": { "data": { "id": "pumpswap" } },
                "base_token": { "data": { "id": format!("solana_{address}mint") } }
            }
        }))
        .unwrap()
    }

    #[async_trait]
    impl PriceSource for ScriptedMarket {
        async fn spot_price(&self, _pool_address: &str) -> Result<f64> {
            Ok(self.price)
        }
    }

    #[async_trait]
    impl MarketData for ScriptedMarket {
        async fn new_pools(&self) -> Result<Vec<PoolSummary>> {
            if self.listing_fails {
                return Err(Error::FetchStatus {
                    endpoint: "new_pools".into(),
                    status: 503,
                });
            }
            Ok(self.listing.lock().unwrap().clone())
        }

        async fn pool_detail(&self, _pool_address: &str) -> Result<PoolAttributes> {
            Ok(serde_json::from_value(serde_json::json!({
                "base_token_price_usd": "0.00042",
                "reserve_in_usd": "15500",
                "locked_liquidity_percentage": "92",
                "volume_usd": { "h24": "120000" },
                "fdv_usd": "90000",
                "transactions": { "h24": { "buys": 62, "sells": 38 } }
            }))
            .unwrap())
        }

        async fn token_info(&self, _token_address: &str) -> Result<TokenInfoAttributes> {
            Ok(serde_json::from_value(serde_json::json!({
                "holders": { "count": 250 },
                "twitter_handle": null
            }))
            .unwrap())
        }
    }

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.storage.dataset_path = dir.join("pools_data.csv").display().to_string();
        config.admission.detail_delay_secs = 0;
        config.admission.info_delay_secs = 0;
        config.sampling.hourly_delay_secs = 0;
        config.sampling.final_minute_delay_secs = 0;
        config
    }

    #[tokio::test]
    async fn test_pass_admits_and_flushes() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let market = ScriptedMarket::with_listing(vec![summary("PooLA")]);
        let mut collector = Collector::new(&config, market).unwrap();

        let changed = collector.run_pass(1000.0).await.unwrap();
        assert!(changed);
        assert!(collector.registry().contains("PooLA"));

        // the flushed dataset reloads to the same registry
        let reloaded = DatasetStore::new(&config.storage.dataset_path)
            .load()
            .unwrap();
        assert_eq!(&reloaded, collector.registry());
    }

    #[tokio::test]
    async fn test_rediscovery_is_a_noop_pass() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let market = ScriptedMarket::with_listing(vec![summary("PooLA")]);
        let mut collector = Collector::new(&config, market).unwrap();

        assert!(collector.run_pass(1000.0).await.unwrap());
        // same listing again, nothing due yet: no change, no flush
        assert!(!collector.run_pass(1000.0).await.unwrap());
        assert_eq!(collector.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_still_advances_sampling() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());

        let market = ScriptedMarket::with_listing(vec![summary("PooLA")]);
        let mut collector = Collector::new(&config, market).unwrap();
        collector.run_pass(1000.0).await.unwrap();

        // next pass: listing down, but the 10m checkpoint is due
        collector.source.listing_fails = true;
        let changed = collector.run_pass(1000.0 + 600.0).await.unwrap();
        assert!(changed);
        assert_eq!(
            collector.registry().get("PooLA").unwrap().samples[0],
            Some(0.0005)
        );
    }

    #[tokio::test]
    async fn test_restart_resumes_ladder_from_disk() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());

        {
            let market = ScriptedMarket::with_listing(vec![summary("PooLA")]);
            let mut collector = Collector::new(&config, market).unwrap();
            collector.run_pass(1000.0).await.unwrap();
            collector.run_pass(1000.0 + 600.0).await.unwrap();
        }

        // a fresh process picks up where the old one stopped
        let market = ScriptedMarket::with_listing(vec![]);
        let mut collector = Collector::new(&config, market).unwrap();
        assert_eq!(collector.registry().get("PooLA").unwrap().filled_count(), 1);

        collector.run_pass(1000.0 + 900.0).await.unwrap();
        let record = collector.registry().get("PooLA").unwrap();
        assert_eq!(record.samples[0], Some(0.0005));
        assert_eq!(record.samples[1], Some(0.0005));
        assert_eq!(record.filled_count(), 2);
    }
}
