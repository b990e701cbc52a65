//! Append-only CSV log of executed sells

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const HEADER: &str = "pool,token,timestamp,tx,sol_out";

/// One closed-trade log entry
#[derive(Debug, Clone)]
pub struct TradeEntry {
    pub pool_address: String,
    pub token_mint: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub tx_signature: String,
    /// SOL received from the sell, when the quote reported it
    pub sol_out: Option<f64>,
}

/// Append-only trade log, header written on first use
pub struct TradeLog {
    path: PathBuf,
}

impl TradeLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, entry: &TradeEntry) -> Result<()> {
        let fresh = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Persistence(format!("open {}: {}", self.path.display(), e)))?;

        if fresh {
            writeln!(file, "{HEADER}")
                .map_err(|e| Error::Persistence(format!("write header: {e}")))?;
        }

        writeln!(
            file,
            "{},{},{},https://solscan.io/tx/{},{}",
            entry.pool_address,
            entry.token_mint,
            entry.timestamp.to_rfc3339(),
            entry.tx_signature,
            entry.sol_out.map(|v| v.to_string()).unwrap_or_default(),
        )
        .map_err(|e| Error::Persistence(format!("append trade: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(pool: &str) -> TradeEntry {
        TradeEntry {
            pool_address: pool.into(),
            token_mint: "MintA".into(),
            timestamp: chrono::Utc::now(),
            tx_signature: "5xSig".into(),
            sol_out: Some(0.0185),
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let log = TradeLog::new(dir.path().join("positions_logs.csv"));

        log.append(&entry("PooLA")).unwrap();
        log.append(&entry("PooLB")).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("positions_logs.csv")).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("PooLA,MintA,"));
        assert!(lines[1].contains("https://solscan.io/tx/5xSig"));
    }

    #[test]
    fn test_missing_sol_out_is_empty_cell() {
        let dir = tempdir().unwrap();
        let log = TradeLog::new(dir.path().join("positions_logs.csv"));

        let mut e = entry("PooLA");
        e.sol_out = None;
        log.append(&e).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("positions_logs.csv")).unwrap();
        assert!(raw.lines().nth(1).unwrap().ends_with(','));
    }
}
