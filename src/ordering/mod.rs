//! Similarity ordering strategies.
//!
//! Each strategy turns a collection of items, some of which carry a
//! [`PerceptualHash`], into a traversal order that visits similar items
//! consecutively.
//!
//! | Strategy | Index | Per-step cost | Quality |
//! |----------|-------|---------------|---------|
//! | [`simple`] | none | O(cap) sampled scan | greedy, approximate when capped |
//! | [`greedy`] | VP-tree | O(log n) amortized | exact greedy nearest-neighbor chain |
//! | [`mst`] | VP-tree + k-NN graph | O(log n) + MST walk | avoids long "tail jumps" |
//!
//! All strategies share the same output contract:
//!
//! - The result is a permutation of the input positions.
//! - Hashed items come first: the placed chain, then any hashed items the
//!   strategy could not reach (e.g. hashes of a different length), in input
//!   order.
//! - Hashless items come last, in input order.
//!
//! Cancellation is checked before every outer-loop iteration; a cancelled
//! run returns [`OrderError::Cancelled`] and never a partial order.

pub mod greedy;
pub mod mst;
pub mod simple;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::distance::{HashMetric, HashSpace};
use crate::error::{OrderError, Result};
use crate::hash::PerceptualHash;
use crate::progress::{CancelToken, Phase, Progress, ProgressSink};

/// Strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Randomized sampled greedy, no index.
    Simple,
    /// VP-tree accelerated nearest-neighbor chaining.
    VpTree,
    /// k-NN graph, Prim's MST, greedy tree walk.
    Mst,
    /// `Simple` below a size threshold, `Mst` otherwise.
    Auto,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Simple => "simple",
            Strategy::VpTree => "vptree",
            Strategy::Mst => "mst",
            Strategy::Auto => "auto",
        }
    }

    /// Replace `Auto` with a concrete strategy for `hashed` items.
    pub fn resolve(self, hashed: usize, auto_threshold: usize) -> Strategy {
        match self {
            Strategy::Auto if hashed < auto_threshold => Strategy::Simple,
            Strategy::Auto => Strategy::Mst,
            other => other,
        }
    }

    /// Hashed items needed before the strategy can start.
    pub fn required_hashes(self) -> usize {
        match self {
            Strategy::Simple | Strategy::Auto => 1,
            Strategy::VpTree | Strategy::Mst => 2,
        }
    }
}

impl FromStr for Strategy {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(Strategy::Simple),
            "vptree" => Ok(Strategy::VpTree),
            "mst" => Ok(Strategy::Mst),
            "auto" => Ok(Strategy::Auto),
            other => Err(OrderError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Items to order, by position.
#[derive(Debug, Clone)]
pub struct OrderInput<'a> {
    /// One entry per item; `None` marks a hashless item.
    pub hashes: Vec<Option<&'a PerceptualHash>>,
    /// Position of the focused item, used as the start when it has a hash.
    pub focus: Option<usize>,
}

impl<'a> OrderInput<'a> {
    pub fn new(hashes: Vec<Option<&'a PerceptualHash>>, focus: Option<usize>) -> Self {
        Self { hashes, focus }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn hashed_count(&self) -> usize {
        self.hashes.iter().filter(|h| h.is_some()).count()
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub strategy: Strategy,
    pub hashed: usize,
    pub hashless: usize,
    /// Distance computations, index build included.
    pub comparisons: u64,
    /// MST walk steps that had to leave the tree for a global scan.
    pub fallback_jumps: usize,
    /// Hashed items appended unordered because no usable distance reached them.
    pub unplaced: usize,
    /// Edges in the spanning tree (MST strategy only).
    pub mst_edges: usize,
    /// Sum of distances between consecutive placed items.
    pub tour_length: f64,
    pub elapsed_ms: u64,
}

impl OrderStats {
    fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            hashed: 0,
            hashless: 0,
            comparisons: 0,
            fallback_jumps: 0,
            unplaced: 0,
            mst_edges: 0,
            tour_length: 0.0,
            elapsed_ms: 0,
        }
    }
}

/// Result of a successful run: a permutation of input positions.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub positions: Vec<usize>,
    pub stats: OrderStats,
}

/// Cancellation and progress plumbing for one run.
pub struct RunContext<'a> {
    cancel: &'a CancelToken,
    progress: &'a dyn ProgressSink,
    interval: usize,
}

impl<'a> RunContext<'a> {
    pub fn new(cancel: &'a CancelToken, progress: &'a dyn ProgressSink, interval: usize) -> Self {
        Self {
            cancel,
            progress,
            interval: interval.max(1),
        }
    }

    /// Fail with [`OrderError::Cancelled`] once the flag is set.
    #[inline]
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(OrderError::Cancelled);
        }
        Ok(())
    }

    /// Phase boundary notification.
    pub fn begin(&self, phase: Phase, total: usize) {
        tracing::debug!(phase = %phase, total, "order.phase");
        self.progress.report(Progress {
            phase,
            current: 0,
            total,
        });
    }

    /// Periodic notification, every `interval` steps and at completion.
    #[inline]
    pub fn tick(&self, phase: Phase, current: usize, total: usize) {
        if current % self.interval == 0 || current == total {
            self.progress.report(Progress {
                phase,
                current,
                total,
            });
        }
    }
}

/// Hashed items gathered into a metric space.
pub(crate) struct Prepared<'a, M> {
    pub(crate) space: HashSpace<'a, M>,
    /// Space position -> input position.
    hashed: Vec<usize>,
    /// Input positions without a hash.
    hashless: Vec<usize>,
    /// Space position of the first item.
    pub(crate) start: usize,
    pub(crate) stats: OrderStats,
}

impl<'a, M: HashMetric> Prepared<'a, M> {
    /// Split hashed from hashless items and choose the start.
    ///
    /// The start is the focused item when it has a hash, otherwise the first
    /// hashed item in input order.
    pub(crate) fn new(
        input: &OrderInput<'a>,
        metric: M,
        strategy: Strategy,
    ) -> Result<Self> {
        let mut hashed = Vec::new();
        let mut hashless = Vec::new();
        let mut points = Vec::new();
        let mut start = 0;

        for (position, hash) in input.hashes.iter().enumerate() {
            match hash {
                Some(h) => {
                    if input.focus == Some(position) {
                        start = hashed.len();
                    }
                    hashed.push(position);
                    points.push(*h);
                }
                None => hashless.push(position),
            }
        }

        let required = strategy.required_hashes();
        if hashed.len() < required {
            return Err(OrderError::NoUsableHashes {
                required,
                found: hashed.len(),
            });
        }

        let mut stats = OrderStats::new(strategy);
        stats.hashed = hashed.len();
        stats.hashless = hashless.len();

        Ok(Self {
            space: HashSpace::new(points, metric),
            hashed,
            hashless,
            start,
            stats,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.hashed.len()
    }

    /// Map the placed chain back to input positions and append everything
    /// the chain did not reach.
    pub(crate) fn finish(mut self, chain: Vec<usize>) -> OrderOutcome {
        let mut seen = vec![false; self.hashed.len()];
        let mut positions = Vec::with_capacity(self.hashed.len() + self.hashless.len());

        for p in chain {
            seen[p] = true;
            positions.push(self.hashed[p]);
        }
        for (p, &input_pos) in self.hashed.iter().enumerate() {
            if !seen[p] {
                positions.push(input_pos);
                self.stats.unplaced += 1;
            }
        }
        positions.extend_from_slice(&self.hashless);

        self.stats.comparisons = self.space.comparisons();
        OrderOutcome {
            positions,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::progress::NoProgress;

    pub(crate) fn hashes(symbols: &[&str]) -> Vec<PerceptualHash> {
        symbols
            .iter()
            .map(|s| PerceptualHash::from_symbols(s).unwrap())
            .collect()
    }

    pub(crate) fn input(hashes: &[PerceptualHash], focus: Option<usize>) -> OrderInput<'_> {
        OrderInput::new(hashes.iter().map(Some).collect(), focus)
    }

    pub(crate) fn is_permutation(positions: &[usize], n: usize) -> bool {
        let mut seen = vec![false; n];
        positions.len() == n
            && positions
                .iter()
                .all(|&p| p < n && !std::mem::replace(&mut seen[p], true))
    }

    pub(crate) fn with_ctx<T>(cancelled: bool, f: impl FnOnce(&RunContext<'_>) -> T) -> T {
        let token = CancelToken::new();
        if cancelled {
            token.cancel();
        }
        let ctx = RunContext::new(&token, &NoProgress, 50);
        f(&ctx)
    }
}
