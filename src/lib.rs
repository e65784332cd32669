//! hashwalk: similarity ordering of perceptually hashed media.
//!
//! Given a collection of items, some carrying a fixed-length perceptual hash,
//! produce a traversal order that visits perceptually similar items
//! consecutively. Three interchangeable strategies trade cost for quality:
//!
//! - `ordering::simple`: randomized greedy, no index, bounded per-step cost
//! - `ordering::greedy`: nearest-neighbor chaining over a VP-tree
//! - `ordering::mst`: k-NN graph, Prim's MST, greedy tree walk
//!
//! Supporting pieces, leaves first:
//!
//! - `hash`: the [`PerceptualHash`] value type
//! - `distance`: Hamming metrics and the [`MetricSpace`] seam
//! - `queue`: binary min-heap of weighted edges for Prim's algorithm
//! - `classic::trees::vptree`: the vantage-point tree
//! - `engine`: message-driven entry point with progress and cancellation
//!
//! # Critical Nuances
//!
//! ## Greedy tours and tail jumps
//!
//! Nearest-neighbor chaining is locally optimal and globally myopic: it
//! drains a neighborhood, then has to jump far to whatever is left. On
//! clustered photo libraries this shows up as a long, incoherent tail. The
//! MST walk spends an extra k-NN pass to see the whole neighborhood structure
//! first, and keeps those jumps rare.
//!
//! ## Hamming space is coarse
//!
//! A 64-bit hash has only 65 possible distances, so ties are the norm, not
//! the exception. The VP-tree splits points sitting exactly on the median to
//! keep the tree balanced, and every strategy breaks ties by scan order so
//! equal inputs give equal outputs.
//!
//! ## Items without a usable hash
//!
//! Hashless items are never compared. They are appended after everything
//! else in input order. Hashes of a different length than their neighbors
//! are at infinite distance from them and end up appended after the ordered
//! chain.

pub mod classic;
pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod hash;
pub mod ordering;
pub mod progress;
pub mod queue;

// Re-exports
pub use classic::trees::{Neighbor, VpTree};
pub use config::{HashEncoding, KnnConfig, OrderConfig};
pub use distance::{BitHamming, Hamming, HashMetric, HashSpace, MetricSpace};
pub use engine::{Engine, EngineMessage, OrderJob, OrderRequest, OrderResponse, Ordered};
pub use error::{ErrorKind, OrderError, Result};
pub use hash::PerceptualHash;
pub use ordering::{OrderInput, OrderOutcome, OrderStats, RunContext, Strategy};
pub use progress::{CancelToken, NoProgress, Phase, Progress, ProgressSink};
pub use queue::{Edge, EdgeQueue};
