//! Build configuration.

use serde::{Deserialize, Serialize};

/// How a node's triangle range is split in two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Midpoint of the longest axis of the triangle centers.
    #[default]
    Center,
    /// Mean of the triangle centers along the longest node axis.
    Average,
    /// Surface area heuristic over binned candidate planes.
    Sah,
}

impl std::str::FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "average" => Ok(Self::Average),
            "sah" => Ok(Self::Sah),
            other => Err(format!("unknown split strategy `{other}`")),
        }
    }
}

/// Parameters for BVH construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Split strategy.
    pub strategy: SplitStrategy,
    /// Maximum tree depth. Traversal recursion is bounded by this value.
    pub max_depth: u32,
    /// Ranges of at most this many triangles become leaves.
    pub max_leaf_tris: u32,
    /// Log a warning when `max_depth` cuts the build short.
    pub verbose: bool,
    /// Hold node buffers behind `Arc` so clones share them across threads.
    pub shared_buffers: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::Center,
            max_depth: 40,
            max_leaf_tris: 10,
            verbose: true,
            shared_buffers: false,
        }
    }
}

impl BuildOptions {
    /// Set the split strategy.
    pub fn with_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the maximum leaf size.
    pub fn with_max_leaf_tris(mut self, max_leaf_tris: u32) -> Self {
        self.max_leaf_tris = max_leaf_tris;
        self
    }

    /// Set the maximum depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Back node buffers with shared `Arc` storage.
    pub fn with_shared_buffers(mut self, shared: bool) -> Self {
        self.shared_buffers = shared;
        self
    }

    /// Normalize out-of-range values, warning about each change.
    pub fn validated(mut self) -> Self {
        if self.max_leaf_tris == 0 {
            log::warn!("max_leaf_tris of 0 is not usable, using 1");
            self.max_leaf_tris = 1;
        }
        self
    }
}
