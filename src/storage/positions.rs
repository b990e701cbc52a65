//! Open-position persistence
//!
//! A JSON document keyed by pool address, read and written wholesale on
//! every mutation. A position exists from buy to sell.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// One open position, created on buy and destroyed on sell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Mint of the token bought
    pub token_mint: String,
    /// Pool spot price at entry (USD)
    pub entry_price: f64,
    /// Signature of the entry transaction
    pub tx_signature: String,
    /// Entry timestamp
    pub entry_time: chrono::DateTime<chrono::Utc>,
}

/// Wholesale JSON store for open positions
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load all open positions; a missing file means none are open
    pub async fn load(&self) -> Result<HashMap<String, Position>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Persistence(format!("read {}: {}", self.path.display(), e)))?;

        let positions: HashMap<String, Position> = serde_json::from_str(&data)
            .map_err(|e| Error::Persistence(format!("parse {}: {}", self.path.display(), e)))?;

        info!(
            "Loaded {} open positions from {}",
            positions.len(),
            self.path.display()
        );
        Ok(positions)
    }

    /// Persist the full position set
    pub async fn save(&self, positions: &HashMap<String, Position>) -> Result<()> {
        let data = serde_json::to_string_pretty(positions)
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| Error::Persistence(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Persistence(format!("rename {}: {}", self.path.display(), e)))?;

        debug!("Saved {} positions to {}", positions.len(), self.path.display());
        Ok(())
    }
}
