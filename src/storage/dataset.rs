//! Flat-file persistence for the pool registry
//!
//! One row per tracked pool, fixed 34-column layout consumed downstream by
//! the training pipeline, so column order is part of the contract. Empty
//! checkpoint slots serialize as empty cells - zero is a real price and
//! must survive a round trip as zero.
//!
//! Writes go to a temp file first and are renamed into place: a failed
//! flush leaves the previous dataset intact.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::registry::{DiscoverySnapshot, PoolRecord, PoolRegistry, CHECKPOINTS, CHECKPOINT_COUNT};

const IDENTITY_COLUMNS: [&str; 11] = [
    "name",
    "address",
    "liquidity",
    "volume",
    "market_cap",
    "holders",
    "top_10",
    "twitter",
    "buy_sell_ratio",
    "volume_to_marketcap_ratio",
    "price_at_discovery",
];

/// Total column count: identity + 22 checkpoints + discovered_at
pub const COLUMN_COUNT: usize = IDENTITY_COLUMNS.len() + CHECKPOINT_COUNT + 1;

/// Registry store backed by a single CSV file
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header() -> String {
        let mut columns: Vec<&str> = IDENTITY_COLUMNS.to_vec();
        columns.extend(CHECKPOINTS.iter().map(|c| c.name));
        columns.push("discovered_at");
        columns.join(",")
    }

    /// Write the entire registry, oldest discovery first
    pub fn flush(&self, registry: &PoolRegistry) -> Result<()> {
        let mut out = String::new();
        out.push_str(&Self::header());
        out.push('\n');

        for address in registry.addresses_oldest_first() {
            let record = registry
                .get(&address)
                .expect("address came from the registry");
            out.push_str(&encode_row(record));
            out.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &out)
            .map_err(|e| Error::Persistence(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Persistence(format!("rename {}: {}", self.path.display(), e)))?;

        debug!("Flushed {} records to {}", registry.len(), self.path.display());
        Ok(())
    }

    /// Load the registry back, reconstructing numeric cells and the
    /// empty-slot markers. A missing file is a fresh start.
    pub fn load(&self) -> Result<PoolRegistry> {
        if !self.path.exists() {
            return Ok(PoolRegistry::new());
        }

        let raw = fs::read_to_string(&self.path)
            .map_err(|e| Error::Persistence(format!("read {}: {}", self.path.display(), e)))?;

        let mut lines = raw.lines();
        match lines.next() {
            Some(header) if header == Self::header() => {}
            Some(other) => {
                return Err(Error::Persistence(format!(
                    "unexpected dataset header: {other}"
                )))
            }
            None => return Ok(PoolRegistry::new()),
        }

        let mut registry = PoolRegistry::new();
        for (line_no, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let record = decode_row(line)
                .map_err(|e| Error::Persistence(format!("row {}: {}", line_no + 2, e)))?;
            registry.insert(record);
        }

        info!(
            "Loaded {} tracked pools from {}",
            registry.len(),
            self.path.display()
        );
        Ok(registry)
    }
}

/// Format a numeric cell; the default f64 formatting round-trips exactly
fn num_cell(value: f64) -> String {
    value.to_string()
}

fn encode_row(record: &PoolRecord) -> String {
    let s = &record.snapshot;
    let mut cells: Vec<String> = vec![
        escape_cell(&record.name),
        escape_cell(&record.address),
        num_cell(s.liquidity),
        num_cell(s.volume),
        num_cell(s.market_cap),
        num_cell(s.holders),
        num_cell(s.top_10),
        num_cell(s.twitter),
        num_cell(s.buy_sell_ratio),
        num_cell(s.volume_to_marketcap_ratio),
        num_cell(s.price_at_discovery),
    ];
    for slot in &record.samples {
        cells.push(match slot {
            Some(price) => num_cell(*price),
            None => String::new(),
        });
    }
    cells.push(num_cell(record.discovered_at));
    cells.join(",")
}

fn decode_row(line: &str) -> std::result::Result<PoolRecord, String> {
    let cells = split_row(line);
    if cells.len() != COLUMN_COUNT {
        return Err(format!(
            "expected {} columns, found {}",
            COLUMN_COUNT,
            cells.len()
        ));
    }

    let num = |i: usize| -> std::result::Result<f64, String> {
        cells[i]
            .parse::<f64>()
            .map_err(|_| format!("bad numeric cell '{}' in column {}", cells[i], i))
    };

    let snapshot = DiscoverySnapshot {
        liquidity: num(2)?,
        volume: num(3)?,
        market_cap: num(4)?,
        holders: num(5)?,
        top_10: num(6)?,
        twitter: num(7)?,
        buy_sell_ratio: num(8)?,
        volume_to_marketcap_ratio: num(9)?,
        price_at_discovery: num(10)?,
    };

    let mut samples = [None; CHECKPOINT_COUNT];
    for (slot, cell) in samples.iter_mut().zip(&cells[11..11 + CHECKPOINT_COUNT]) {
        if !cell.is_empty() {
            *slot = Some(
                cell.parse::<f64>()
                    .map_err(|_| format!("bad checkpoint cell '{cell}'"))?,
            );
        }
    }

    let discovered_at = num(COLUMN_COUNT - 1)?;

    Ok(PoolRecord {
        name: cells[0].clone(),
        address: cells[1].clone(),
        snapshot,
        samples,
        discovered_at,
    })
}

/// Quote a cell when it contains a separator, quote or newline
fn escape_cell(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Split one row on commas, honoring quoted cells
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::with_capacity(COLUMN_COUNT);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::record::test_snapshot;
    use tempfile::tempdir;

    fn record(address: &str, name: &str, discovered_at: f64) -> PoolRecord {
        PoolRecord::new(address.into(), name.into(), test_snapshot(), discovered_at)
    }

    #[test]
    fn test_header_has_34_columns() {
        assert_eq!(COLUMN_COUNT, 34);
        assert_eq!(DatasetStore::header().split(',').count(), 34);
        assert!(DatasetStore::header().starts_with("name,address,liquidity"));
        assert!(DatasetStore::header().ends_with("price_12h,discovered_at"));
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("pools_data.csv"));

        let mut registry = PoolRegistry::new();
        let mut a = record("PooLA", "WIF / SOL", 1000.5);
        a.fill(0, 0.00051);
        a.fill(11, 0.0009);
        let mut b = record("PooLB", "BONK / SOL", 2000.25);
        // zero is a legitimate filled price, distinct from empty
        b.fill(0, 0.0);
        registry.insert(a);
        registry.insert(b);

        store.flush(&registry).unwrap();
        let reloaded = store.load().unwrap();

        assert_eq!(reloaded, registry);
        assert_eq!(reloaded.get("PooLB").unwrap().samples[0], Some(0.0));
        assert_eq!(reloaded.get("PooLB").unwrap().samples[1], None);
    }

    #[test]
    fn test_round_trip_quoted_name() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("pools_data.csv"));

        let mut registry = PoolRegistry::new();
        registry.insert(record("PooLA", "WEIRD, \"token\" / SOL", 1000.0));

        store.flush(&registry).unwrap();
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.get("PooLA").unwrap().name, "WEIRD, \"token\" / SOL");
    }

    #[test]
    fn test_nan_snapshot_fields_survive() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("pools_data.csv"));

        let mut rec = record("PooLA", "WIF / SOL", 1000.0);
        rec.snapshot.holders = f64::NAN;
        let mut registry = PoolRegistry::new();
        registry.insert(rec);

        store.flush(&registry).unwrap();
        let reloaded = store.load().unwrap();
        assert!(reloaded.get("PooLA").unwrap().snapshot.holders.is_nan());
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("nothing_here.csv"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_flush_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pools_data.csv");
        let store = DatasetStore::new(&path);
        let mut registry = PoolRegistry::new();
        registry.insert(record("PooLA", "WIF / SOL", 1000.0));

        store.flush(&registry).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_bad_header_is_a_persistence_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pools_data.csv");
        fs::write(&path, "totally,unrelated,header\n").unwrap();
        let store = DatasetStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Persistence(_))));
    }

    #[test]
    fn test_split_row_handles_quotes() {
        assert_eq!(
            split_row("a,\"b,c\",\"say \"\"hi\"\"\",d"),
            vec!["a", "b,c", "say \"hi\"", "d"]
        );
    }
}
