//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{OrderError, Result};

/// Configuration shared by every ordering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Emit a progress notification every this many placements or queries.
    pub progress_interval: usize,
    /// Simple Greedy per-step candidate cap when the request gives none.
    pub max_comparisons: usize,
    /// Neighbor count for the MST similarity graph.
    pub knn: KnnConfig,
    /// Hashed-item count below which `auto` picks Simple Greedy.
    pub auto_threshold: usize,
    /// How hash strings in requests are decoded.
    pub hash_encoding: HashEncoding,
    /// Seed for Simple Greedy sampling. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Bound of the progress channel used by spawned jobs.
    pub progress_channel_capacity: usize,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            progress_interval: 50,
            max_comparisons: 1000,
            knn: KnnConfig::default(),
            auto_threshold: 64,
            hash_encoding: HashEncoding::default(),
            seed: None,
            progress_channel_capacity: 256,
        }
    }
}

impl OrderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(OrderError::InvalidParameter(
                "progress_interval must be greater than 0".to_string(),
            ));
        }
        if self.max_comparisons == 0 {
            return Err(OrderError::InvalidParameter(
                "max_comparisons must be greater than 0".to_string(),
            ));
        }
        if self.progress_channel_capacity == 0 {
            return Err(OrderError::InvalidParameter(
                "progress_channel_capacity must be greater than 0".to_string(),
            ));
        }
        self.knn.validate()
    }
}

/// Sizing of the k-nearest-neighbor graph.
///
/// `k = min(n - 1, max(min_neighbors, floor(sqrt(n) * sqrt_scale)))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnConfig {
    pub min_neighbors: usize,
    pub sqrt_scale: f64,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            min_neighbors: 20,
            sqrt_scale: 10.0,
        }
    }
}

impl KnnConfig {
    /// Neighbor count for a graph over `n` items.
    pub fn neighbors_for(&self, n: usize) -> usize {
        if n < 2 {
            return 0;
        }
        let scaled = ((n as f64).sqrt() * self.sqrt_scale).floor() as usize;
        self.min_neighbors.max(scaled).min(n - 1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_neighbors == 0 {
            return Err(OrderError::InvalidParameter(
                "knn.min_neighbors must be greater than 0".to_string(),
            ));
        }
        if !self.sqrt_scale.is_finite() || self.sqrt_scale < 0.0 {
            return Err(OrderError::InvalidParameter(format!(
                "knn.sqrt_scale must be finite and non-negative, got {}",
                self.sqrt_scale
            )));
        }
        Ok(())
    }
}

/// Decoding of hash strings, which also fixes the metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashEncoding {
    /// One symbol per character, compared with symbol-wise Hamming.
    #[default]
    Symbols,
    /// Packed hex, compared with bitwise Hamming.
    Hex,
}
