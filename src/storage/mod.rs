//! Persistence layer: dataset CSV, open-position JSON, trade log

pub mod dataset;
pub mod positions;
pub mod trade_log;

pub use dataset::DatasetStore;
pub use positions::{Position, PositionStore};
pub use trade_log::{TradeEntry, TradeLog};
