//! Staggered checkpoint sampling
//!
//! Each tracked pool progresses independently through the 22-checkpoint
//! ladder. A pass walks every record (most recently discovered first) and
//! fills whichever slots have come due, one price fetch per slot. Slots
//! fill exactly once; a failed fetch leaves the slot empty and the pass
//! moves on, so a single bad pool or checkpoint never stalls the rest.

use std::time::Duration;
use tracing::{info, warn};

use crate::config::SamplingConfig;
use crate::gecko::PriceSource;
use crate::registry::{PacingClass, PoolRecord, PoolRegistry, CHECKPOINTS};

/// Drives checkpoint sampling over the registry
pub struct SamplingScheduler {
    config: SamplingConfig,
}

impl SamplingScheduler {
    pub fn new(config: SamplingConfig) -> Self {
        Self { config }
    }

    fn pacing_delay(&self, class: PacingClass) -> Duration {
        match class {
            PacingClass::Hourly => Duration::from_secs(self.config.hourly_delay_secs),
            PacingClass::FinalMinute => Duration::from_secs(self.config.final_minute_delay_secs),
            PacingClass::SubHour => Duration::ZERO,
        }
    }

    /// Fill every due, still-empty checkpoint of one record.
    ///
    /// Returns whether any slot was filled. Checkpoints are independent: a
    /// restart that slept through a due window still fills the slot here,
    /// arbitrarily late, and a fetch failure only skips that one slot.
    pub async fn advance<P: PriceSource>(
        &self,
        source: &P,
        record: &mut PoolRecord,
        now: f64,
    ) -> bool {
        let mut changed = false;

        for (index, checkpoint) in CHECKPOINTS.iter().enumerate() {
            if record.samples[index].is_some() || !record.is_due(index, now) {
                continue;
            }

            let delay = self.pacing_delay(checkpoint.pacing_class());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match source.spot_price(&record.address).await {
                Ok(price) => {
                    record.fill(index, price);
                    changed = true;
                    info!(
                        "{} ({}): {}={}",
                        record.name, record.address, checkpoint.name, price
                    );
                }
                Err(e) => {
                    warn!(
                        "Price fetch failed for {} at {}: {} (slot left empty for retry)",
                        record.address, checkpoint.name, e
                    );
                }
            }
        }

        changed
    }

    /// Run one sampling pass over the whole registry, most recently
    /// discovered pools first. Returns whether anything was filled.
    pub async fn advance_all<P: PriceSource>(
        &self,
        source: &P,
        registry: &mut PoolRegistry,
        now: f64,
    ) -> bool {
        let mut changed = false;

        for address in registry.addresses_recent_first() {
            let Some(record) = registry.get_mut(&address) else {
                continue;
            };
            changed |= self.advance(source, record, now).await;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::registry::record::test_snapshot;
    use crate::registry::CHECKPOINT_COUNT;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Price source returning a fixed price, with call counting and an
    /// optional set of addresses/checkpoint indices that fail
    struct StubPrices {
        price: f64,
        calls: AtomicUsize,
        failing_calls: Mutex<HashSet<usize>>,
    }

    impl StubPrices {
        fn new(price: f64) -> Self {
            Self {
                price,
                calls: AtomicUsize::new(0),
                failing_calls: Mutex::new(HashSet::new()),
            }
        }

        /// Make the n-th spot_price call (0-based) fail
        fn fail_call(self, n: usize) -> Self {
            self.failing_calls.lock().unwrap().insert(n);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for StubPrices {
        async fn spot_price(&self, _pool_address: &str) -> Result<f64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_calls.lock().unwrap().contains(&call) {
                return Err(Error::FetchStatus {
                    endpoint: "pool_detail".into(),
                    status: 500,
                });
            }
            Ok(self.price)
        }
    }

    fn scheduler() -> SamplingScheduler {
        SamplingScheduler::new(SamplingConfig {
            hourly_delay_secs: 0,
            final_minute_delay_secs: 0,
            pass_delay_secs: 0,
        })
    }

    fn record(address: &str, discovered_at: f64) -> PoolRecord {
        PoolRecord::new(
            address.into(),
            format!("{address} / SOL"),
            test_snapshot(),
            discovered_at,
        )
    }

    #[tokio::test]
    async fn test_nothing_due_before_first_offset() {
        let source = StubPrices::new(0.5);
        let mut rec = record("a", 1000.0);
        let changed = scheduler().advance(&source, &mut rec, 1000.0 + 599.0).await;
        assert!(!changed);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_due_checkpoint_fills_exactly_one() {
        let source = StubPrices::new(0.5);
        let mut rec = record("a", 1000.0);
        let changed = scheduler().advance(&source, &mut rec, 1000.0 + 650.0).await;
        assert!(changed);
        assert_eq!(source.call_count(), 1);
        assert_eq!(rec.samples[0], Some(0.5));
        assert!(rec.samples[1..].iter().all(|s| s.is_none()));
    }

    #[tokio::test]
    async fn test_advance_is_idempotent_without_elapsed_time() {
        let source = StubPrices::new(0.5);
        let mut rec = record("a", 1000.0);
        let now = 1000.0 + 650.0;
        scheduler().advance(&source, &mut rec, now).await;
        let after_first = rec.clone();
        let changed = scheduler().advance(&source, &mut rec, now).await;
        assert!(!changed);
        assert_eq!(rec, after_first);
        // the filled checkpoint was not refetched
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_restart_fills_skipped_checkpoints_late() {
        // a record that slept through everything up to 3h
        let source = StubPrices::new(0.25);
        let mut rec = record("a", 1000.0);
        let changed = scheduler()
            .advance(&source, &mut rec, 1000.0 + 10800.0)
            .await;
        assert!(changed);
        // 10m..=60m plus 2h and 3h are all due
        assert_eq!(rec.filled_count(), 13);
        assert_eq!(source.call_count(), 13);
        assert!(rec.samples[13..].iter().all(|s| s.is_none()));
    }

    #[tokio::test]
    async fn test_fetch_failure_isolated_per_checkpoint() {
        // three checkpoints due; the second fetch fails
        let source = StubPrices::new(0.5).fail_call(1);
        let mut rec = record("a", 1000.0);
        let changed = scheduler()
            .advance(&source, &mut rec, 1000.0 + 1200.0)
            .await;
        // the pass completed and still filled the other two
        assert!(changed);
        assert_eq!(rec.samples[0], Some(0.5));
        assert_eq!(rec.samples[1], None);
        assert_eq!(rec.samples[2], Some(0.5));
        // the failed slot is retried on the next pass
        let changed = scheduler()
            .advance(&source, &mut rec, 1000.0 + 1200.0)
            .await;
        assert!(changed);
        assert_eq!(rec.samples[1], Some(0.5));
    }

    #[tokio::test]
    async fn test_full_ladder_fills_all_slots() {
        let source = StubPrices::new(0.5);
        let mut rec = record("a", 1000.0);
        scheduler()
            .advance(&source, &mut rec, 1000.0 + 43200.0)
            .await;
        assert!(rec.is_fully_sampled());
        assert_eq!(source.call_count(), CHECKPOINT_COUNT);
    }

    #[tokio::test]
    async fn test_advance_all_visits_recent_first() {
        let source = StubPrices::new(0.5);
        let mut registry = PoolRegistry::new();
        registry.insert(record("old", 1000.0));
        registry.insert(record("new", 2000.0));

        // only "old" has a due checkpoint at this instant
        let changed = scheduler()
            .advance_all(&source, &mut registry, 1000.0 + 600.0)
            .await;
        assert!(changed);
        assert_eq!(registry.get("old").unwrap().filled_count(), 1);
        assert_eq!(registry.get("new").unwrap().filled_count(), 0);
    }

    #[tokio::test]
    async fn test_advance_all_failure_does_not_stop_other_pools() {
        // two pools each with one due checkpoint; first fetch fails
        let source = StubPrices::new(0.5).fail_call(0);
        let mut registry = PoolRegistry::new();
        registry.insert(record("a", 1000.0));
        registry.insert(record("b", 1000.0));

        let changed = scheduler()
            .advance_all(&source, &mut registry, 1000.0 + 600.0)
            .await;
        assert!(changed);
        let filled: usize = registry.iter().map(|r| r.filled_count()).sum();
        assert_eq!(filled, 1);
        assert_eq!(source.call_count(), 2);
    }
}
