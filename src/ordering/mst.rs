//! Minimum-spanning-tree ordering.
//!
//! Pure greedy chaining paints itself into corners: once the neighborhood of
//! the current item is used up, the next hop can be a long "tail jump". This
//! strategy works in three phases instead:
//!
//! 1. **k-NN graph**: for every item, its k nearest neighbors from a VP-tree,
//!    `k = min(n - 1, max(20, floor(sqrt(n) * 10)))` by default.
//! 2. **Prim's MST**: grow a spanning tree from the start item, always taking
//!    the globally cheapest frontier edge from an [`EdgeQueue`].
//! 3. **Tree walk**: move to the closest unvisited tree neighbor of the current
//!    item. At a dead end (leaf, or exhausted subtree) jump to the globally
//!    nearest unvisited item by linear scan.
//!
//! ## Disconnected graphs
//!
//! If the k-NN graph is not connected, Prim's algorithm stops when its queue
//! empties and the tree spans only the start's component. The walk's global
//! fallback picks up the remaining components, so the order still covers
//! every comparable item.

use super::{OrderInput, OrderOutcome, Prepared, RunContext, Strategy};
use crate::classic::trees::{Neighbor, VpTree};
use crate::config::KnnConfig;
use crate::distance::{HashMetric, MetricSpace};
use crate::error::Result;
use crate::progress::Phase;
use crate::queue::{Edge, EdgeQueue};

/// Directed k-nearest-neighbor lists, one per position.
///
/// Symmetric in intent only: `a` may list `b` without `b` listing `a`.
#[derive(Debug, Clone, Default)]
pub struct SimilarityGraph {
    adjacency: Vec<Vec<Neighbor>>,
}

impl SimilarityGraph {
    pub fn from_adjacency(adjacency: Vec<Vec<Neighbor>>) -> Self {
        Self { adjacency }
    }

    /// Query the `k` nearest neighbors of every indexed point.
    pub fn build<S: MetricSpace>(
        tree: &VpTree<'_, S>,
        k: usize,
        ctx: &RunContext<'_>,
    ) -> Result<Self> {
        let n = tree.len();
        let mut adjacency = Vec::with_capacity(n);
        for p in 0..n {
            ctx.checkpoint()?;
            adjacency.push(tree.k_nearest(p, k, |q| q == p));
            ctx.tick(Phase::GraphBuild, p + 1, n);
        }
        Ok(Self { adjacency })
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn neighbors(&self, point: usize) -> &[Neighbor] {
        &self.adjacency[point]
    }
}

/// Spanning tree (or, on a disconnected graph, the start's component).
#[derive(Debug, Clone)]
pub struct SpanningTree {
    adjacency: Vec<Vec<usize>>,
    visited: usize,
    edges: usize,
}

impl SpanningTree {
    /// Prim's algorithm from `start`.
    ///
    /// Edges to already-visited points are discarded as they surface. Stops
    /// when every point is visited or the frontier queue runs dry.
    pub fn prim(graph: &SimilarityGraph, start: usize, ctx: &RunContext<'_>) -> Result<Self> {
        let n = graph.len();
        let mut adjacency = vec![Vec::new(); n];
        if n == 0 {
            return Ok(Self {
                adjacency,
                visited: 0,
                edges: 0,
            });
        }

        let mut visited = vec![false; n];
        let mut queue = EdgeQueue::with_capacity(graph.neighbors(start).len());
        let mut visited_count = 1;
        let mut edges = 0;

        let push_frontier = |queue: &mut EdgeQueue, visited: &[bool], from: usize| {
            for nb in graph.neighbors(from) {
                if !visited[nb.point] {
                    queue.push(Edge {
                        from,
                        to: nb.point,
                        distance: nb.distance,
                    });
                }
            }
        };

        visited[start] = true;
        push_frontier(&mut queue, &visited, start);

        while visited_count < n {
            ctx.checkpoint()?;
            let Some(edge) = queue.pop() else {
                break;
            };
            if visited[edge.to] {
                continue;
            }

            visited[edge.to] = true;
            visited_count += 1;
            adjacency[edge.from].push(edge.to);
            adjacency[edge.to].push(edge.from);
            edges += 1;

            push_frontier(&mut queue, &visited, edge.to);
            ctx.tick(Phase::MstBuild, visited_count, n);
        }

        Ok(Self {
            adjacency,
            visited: visited_count,
            edges,
        })
    }

    /// Points reached by the tree, start included.
    pub fn visited_count(&self) -> usize {
        self.visited
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    pub fn neighbors(&self, point: usize) -> &[usize] {
        &self.adjacency[point]
    }

    pub fn spans(&self, n: usize) -> bool {
        self.visited == n
    }
}

/// Order `input` by walking a minimum spanning tree of its k-NN graph.
pub fn order_mst<M: HashMetric>(
    input: &OrderInput<'_>,
    metric: M,
    knn: &KnnConfig,
    ctx: &RunContext<'_>,
) -> Result<OrderOutcome> {
    ctx.checkpoint()?;
    let mut prepared = Prepared::new(input, metric, Strategy::Mst)?;
    let n = prepared.len();
    let start = prepared.start;
    let k = knn.neighbors_for(n);

    ctx.begin(Phase::IndexBuild, n);
    let tree = VpTree::build(&prepared.space, (0..n).collect());

    ctx.begin(Phase::GraphBuild, n);
    let graph = SimilarityGraph::build(&tree, k, ctx)?;
    drop(tree);

    ctx.begin(Phase::MstBuild, n);
    let spanning = SpanningTree::prim(&graph, start, ctx)?;
    if !spanning.spans(n) {
        tracing::warn!(
            k,
            reached = spanning.visited_count(),
            total = n,
            "k-NN graph is disconnected; remaining items will be reached by fallback scan"
        );
    }
    prepared.stats.mst_edges = spanning.edge_count();

    ctx.begin(Phase::Traversal, n);
    let walk = walk(&prepared.space, &spanning, start, ctx)?;
    prepared.stats.fallback_jumps = walk.fallback_jumps;
    prepared.stats.tour_length = walk.tour_length;

    Ok(prepared.finish(walk.chain))
}

struct Walk {
    chain: Vec<usize>,
    fallback_jumps: usize,
    tour_length: f64,
}

/// Greedy walk over the spanning tree with a global nearest fallback.
fn walk<S: MetricSpace>(
    space: &S,
    spanning: &SpanningTree,
    start: usize,
    ctx: &RunContext<'_>,
) -> Result<Walk> {
    let n = space.len();
    let mut visited = vec![false; n];
    visited[start] = true;
    let mut chain = Vec::with_capacity(n);
    chain.push(start);
    let mut current = start;
    let mut fallback_jumps = 0;
    let mut tour_length = 0.0;

    let closest = |current: usize, candidates: &mut dyn Iterator<Item = usize>| {
        let mut best: Option<(usize, f32)> = None;
        for p in candidates {
            let d = space.distance(current, p);
            if d < best.map_or(f32::INFINITY, |(_, bd)| bd) {
                best = Some((p, d));
            }
        }
        best
    };

    while chain.len() < n {
        ctx.checkpoint()?;

        let mut next = closest(
            current,
            &mut spanning.neighbors(current).iter().copied().filter(|&p| !visited[p]),
        );
        if next.is_none() {
            next = closest(current, &mut (0..n).filter(|&p| !visited[p]));
            if next.is_some() {
                fallback_jumps += 1;
            }
        }

        let Some((p, d)) = next else {
            tracing::debug!(
                placed = chain.len(),
                total = n,
                "no comparable item left; appending rest unordered"
            );
            break;
        };

        visited[p] = true;
        chain.push(p);
        tour_length += f64::from(d);
        current = p;
        ctx.tick(Phase::Traversal, chain.len(), n);
    }

    Ok(Walk {
        chain,
        fallback_jumps,
        tour_length,
    })
}
