//! Pool registry
//!
//! In-memory mapping from pool address to its tracked record. The collector
//! only ever inserts; records live for the lifetime of the dataset.

pub mod checkpoint;
pub mod record;

pub use checkpoint::{Checkpoint, PacingClass, CHECKPOINTS, CHECKPOINT_COUNT};
pub use record::{DiscoverySnapshot, PoolRecord};

use std::collections::HashMap;

/// Registry of tracked pools, keyed by address
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PoolRegistry {
    records: HashMap<String, PoolRecord>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless the address is already tracked.
    ///
    /// Re-discovery of a registered address is a no-op; returns whether the
    /// record was inserted.
    pub fn insert(&mut self, record: PoolRecord) -> bool {
        if self.records.contains_key(&record.address) {
            return false;
        }
        self.records.insert(record.address.clone(), record);
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.records.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<&PoolRecord> {
        self.records.get(address)
    }

    pub fn get_mut(&mut self, address: &str) -> Option<&mut PoolRecord> {
        self.records.get_mut(address)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolRecord> {
        self.records.values()
    }

    /// Addresses ordered most recently discovered first (scheduler visiting
    /// order; address breaks ties for determinism)
    pub fn addresses_recent_first(&self) -> Vec<String> {
        let mut entries: Vec<(&String, f64)> = self
            .records
            .iter()
            .map(|(addr, rec)| (addr, rec.discovered_at))
            .collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        entries.into_iter().map(|(addr, _)| addr.clone()).collect()
    }

    /// Addresses ordered oldest first (dataset row order on flush)
    pub fn addresses_oldest_first(&self) -> Vec<String> {
        let mut addrs = self.addresses_recent_first();
        addrs.reverse();
        addrs
    }
}
