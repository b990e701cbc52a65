//! Pre-trained classifier gating buys
//!
//! Inference over a random forest exported to JSON by the training
//! pipeline: an array of binary decision trees over the nine
//! discovery-snapshot features. Training and export stay outside this
//! crate; we only evaluate.

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::registry::DiscoverySnapshot;

/// Number of snapshot features the forest was trained on
pub const FEATURE_COUNT: usize = 9;

/// Snapshot fields in training order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
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

/// One node of a decision tree
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    /// Fraction of positive training samples at this leaf
    Leaf { vote: f64 },
}

impl TreeNode {
    /// Walk the tree. `x <= threshold` goes left; NaN fails the
    /// comparison and goes right, matching the training pipeline.
    fn evaluate(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            TreeNode::Leaf { vote } => *vote,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] <= *threshold {
                    left.evaluate(features)
                } else {
                    right.evaluate(features)
                }
            }
        }
    }

    fn max_feature_index(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split {
                feature,
                left,
                right,
                ..
            } => (*feature)
                .max(left.max_feature_index())
                .max(right.max_feature_index()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ForestFile {
    feature_names: Vec<String>,
    trees: Vec<TreeNode>,
}

/// Random-forest classifier over discovery snapshots
pub struct Classifier {
    trees: Vec<TreeNode>,
}

impl Classifier {
    /// Load a forest from its JSON export
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Model(format!("read {}: {}", path.display(), e)))?;
        let file: ForestFile = serde_json::from_str(&raw)
            .map_err(|e| Error::Model(format!("parse {}: {}", path.display(), e)))?;
        let classifier = Self::from_trees(file.trees)?;

        if file.feature_names != FEATURE_NAMES {
            return Err(Error::Model(format!(
                "forest was trained on {:?}, expected {:?}",
                file.feature_names, FEATURE_NAMES
            )));
        }

        info!(
            "Loaded classifier with {} trees from {}",
            classifier.trees.len(),
            path.display()
        );
        Ok(classifier)
    }

    fn from_trees(trees: Vec<TreeNode>) -> Result<Self> {
        if trees.is_empty() {
            return Err(Error::Model("forest has no trees".into()));
        }
        for tree in &trees {
            if tree.max_feature_index() >= FEATURE_COUNT {
                return Err(Error::Model(format!(
                    "tree references feature index {} out of {}",
                    tree.max_feature_index(),
                    FEATURE_COUNT
                )));
            }
        }
        Ok(Self { trees })
    }

    /// Mean leaf vote across the forest
    pub fn probability(&self, snapshot: &DiscoverySnapshot) -> f64 {
        let features = feature_vector(snapshot);
        let total: f64 = self.trees.iter().map(|t| t.evaluate(&features)).sum();
        total / self.trees.len() as f64
    }

    /// Majority-vote decision: should this pool be bought
    pub fn predict(&self, snapshot: &DiscoverySnapshot) -> bool {
        self.probability(snapshot) >= 0.5
    }
}

/// Snapshot fields in the order the forest was trained on
fn feature_vector(s: &DiscoverySnapshot) -> [f64; FEATURE_COUNT] {
    [
        s.liquidity,
        s.volume,
        s.market_cap,
        s.holders,
        s.top_10,
        s.twitter,
        s.buy_sell_ratio,
        s.volume_to_marketcap_ratio,
        s.price_at_discovery,
    ]
}
