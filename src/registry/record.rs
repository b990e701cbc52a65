//! Tracked pool record
//!
//! One record per admitted pool: the discovery-time snapshot plus the
//! sampling ladder. Checkpoint slots distinguish "not yet sampled" from a
//! zero price, so they are `Option<f64>`, never a sentinel value.

use super::checkpoint::{CHECKPOINTS, CHECKPOINT_COUNT};

/// Discovery-time attributes captured when a pool clears admission.
///
/// Parse failures during enrichment degrade individual fields to NaN; the
/// record is still created.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySnapshot {
    pub liquidity: f64,
    pub volume: f64,
    pub market_cap: f64,
    pub holders: f64,
    pub top_10: f64,
    /// 1.0 if the token has a known X/Twitter handle, else 0.0
    pub twitter: f64,
    pub buy_sell_ratio: f64,
    pub volume_to_marketcap_ratio: f64,
    pub price_at_discovery: f64,
}

/// One tracked pool: identity, snapshot, and the 22-slot sampling ladder
#[derive(Debug, Clone, PartialEq)]
pub struct PoolRecord {
    /// On-chain pool address, primary key
    pub address: String,
    pub name: String,
    pub snapshot: DiscoverySnapshot,
    /// Ladder slots, index-aligned with [`CHECKPOINTS`]
    pub samples: [Option<f64>; CHECKPOINT_COUNT],
    /// Unix seconds (fractional) anchoring every checkpoint due-time
    pub discovered_at: f64,
}

impl PoolRecord {
    /// Create a fresh record with every checkpoint slot empty
    pub fn new(
        address: String,
        name: String,
        snapshot: DiscoverySnapshot,
        discovered_at: f64,
    ) -> Self {
        Self {
            address,
            name,
            snapshot,
            samples: [None; CHECKPOINT_COUNT],
            discovered_at,
        }
    }

    /// Seconds elapsed since discovery at instant `now`
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.discovered_at
    }

    /// Whether the checkpoint at `index` is past its due-time at `now`
    pub fn is_due(&self, index: usize, now: f64) -> bool {
        self.elapsed(now) >= CHECKPOINTS[index].offset_secs as f64
    }

    /// Fill a slot. A filled checkpoint is never overwritten.
    pub fn fill(&mut self, index: usize, price: f64) {
        if self.samples[index].is_none() {
            self.samples[index] = Some(price);
        }
    }

    /// Number of filled slots
    pub fn filled_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_some()).count()
    }

    /// True once all 22 slots hold a sample
    pub fn is_fully_sampled(&self) -> bool {
        self.filled_count() == CHECKPOINT_COUNT
    }
}

/// Snapshot fixture shared by unit tests across the crate
#[cfg(test)]
pub(crate) fn test_snapshot() -> DiscoverySnapshot {
    DiscoverySnapshot {
        liquidity: 15500.0,
        volume: 120_000.0,
        market_cap: 90_000.0,
        holders: 250.0,
        top_10: 31.5,
        twitter: 1.0,
        buy_sell_ratio: 0.62,
        volume_to_marketcap_ratio: 1.33,
        price_at_discovery: 0.00042,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_unsampled() {
        let record = PoolRecord::new("pool1".into(), "WIF / SOL".into(), test_snapshot(), 1000.0);
        assert_eq!(record.filled_count(), 0);
        assert!(!record.is_fully_sampled());
        assert!(record.samples.iter().all(|s| s.is_none()));
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let record = PoolRecord::new("pool1".into(), "WIF / SOL".into(), test_snapshot(), 1000.0);
        // price_10m is due starting exactly at discovered_at + 600, not before
        assert!(!record.is_due(0, 1000.0 + 599.999));
        assert!(record.is_due(0, 1000.0 + 600.0));
        assert!(record.is_due(0, 1000.0 + 600.001));
    }

    #[test]
    fn test_fill_never_overwrites() {
        let mut record =
            PoolRecord::new("pool1".into(), "WIF / SOL".into(), test_snapshot(), 1000.0);
        record.fill(3, 0.5);
        record.fill(3, 9.9);
        assert_eq!(record.samples[3], Some(0.5));
    }

    #[test]
    fn test_zero_price_counts_as_filled() {
        let mut record =
            PoolRecord::new("pool1".into(), "WIF / SOL".into(), test_snapshot(), 1000.0);
        record.fill(0, 0.0);
        assert_eq!(record.samples[0], Some(0.0));
        assert_eq!(record.filled_count(), 1);
    }
}
