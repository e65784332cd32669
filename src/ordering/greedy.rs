//! Greedy nearest-neighbor chaining over a VP-tree.
//!
//! Same walk as [`simple`](super::simple) with no sampling: every step
//! asks the tree for the exact nearest unplaced item, so the chain is the
//! true greedy tour at O(log n) amortized per step.

use super::{OrderInput, OrderOutcome, Prepared, RunContext, Strategy};
use crate::classic::trees::VpTree;
use crate::distance::HashMetric;
use crate::error::Result;
use crate::progress::Phase;

pub fn order_vptree<M: HashMetric>(
    input: &OrderInput<'_>,
    metric: M,
    ctx: &RunContext<'_>,
) -> Result<OrderOutcome> {
    ctx.checkpoint()?;
    let mut prepared = Prepared::new(input, metric, Strategy::VpTree)?;
    let n = prepared.len();
    let start = prepared.start;

    ctx.begin(Phase::IndexBuild, n);
    let chain = {
        let tree = VpTree::build(&prepared.space, (0..n).collect());

        let mut placed = vec![false; n];
        placed[start] = true;
        let mut chain = Vec::with_capacity(n);
        chain.push(start);
        let mut current = start;
        let mut tour_length = 0.0;

        ctx.begin(Phase::Traversal, n);
        while chain.len() < n {
            ctx.checkpoint()?;

            let Some(next) = tree.nearest(current, |p| placed[p]) else {
                tracing::debug!(
                    placed = chain.len(),
                    total = n,
                    "tree exhausted before all items were placed"
                );
                break;
            };

            placed[next.point] = true;
            chain.push(next.point);
            tour_length += f64::from(next.distance);
            current = next.point;
            ctx.tick(Phase::Traversal, chain.len(), n);
        }

        prepared.stats.tour_length = tour_length;
        chain
    };

    Ok(prepared.finish(chain))
}
