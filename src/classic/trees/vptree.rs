//! Vantage-Point Tree implementation.
//!
//! Metric-space index that partitions points by their distance to a chosen
//! pivot (the vantage point). Unlike K-D or Ball trees it needs nothing but
//! a distance function, which makes it the natural index for Hamming space.
//!
//! **Technical Name**: VP-tree (Yianilos, 1993)
//!
//! Algorithm:
//! - The first point of a partition becomes its vantage point (deterministic,
//!   so the same input always yields the same tree)
//! - Radius = exact median of distances from the vantage point to the rest,
//!   found by quickselect (`select_nth_unstable_by`)
//! - `inside` holds points strictly closer than the radius, `outside` points
//!   strictly farther; points exactly at the radius go to whichever side is
//!   currently smaller, which keeps the tree balanced on heavy ties
//! - Built with an explicit work stack and stored in an arena, so depth is
//!   never bounded by the call stack
//!
//! Search:
//! - Visit the side of the partition containing the query first
//! - Visit the other side only if `|d(q, vp) - radius| <= best`, the
//!   triangle-inequality lower bound on anything it could contain
//! - Excluded points are skipped as candidates but their subtrees are still
//!   searched
//!
//! # References
//!
//! - Yianilos (1993): "Data structures and algorithms for nearest neighbor
//!   search in general metric spaces"

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::distance::MetricSpace;

type NodeId = u32;

/// VP-tree node. Children are arena indices.
#[derive(Debug, Clone)]
struct VpNode {
    point: usize,
    radius: f32,
    inside: Option<NodeId>,
    outside: Option<NodeId>,
}

/// A search result: a point position and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub point: usize,
    pub distance: f32,
}

/// Max-heap adapter: the farthest kept neighbor sits on top.
#[derive(Debug, Clone, Copy)]
struct Farthest(Neighbor);

impl PartialEq for Farthest {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Farthest {}

impl Ord for Farthest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then(self.0.point.cmp(&other.0.point))
    }
}

impl PartialOrd for Farthest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Where a freshly built node gets attached.
enum Slot {
    Root,
    Inside(NodeId),
    Outside(NodeId),
}

/// Immutable VP-tree over a subset of the positions of a [`MetricSpace`].
pub struct VpTree<'s, S> {
    space: &'s S,
    nodes: Vec<VpNode>,
    root: Option<NodeId>,
}

impl<'s, S: MetricSpace> VpTree<'s, S> {
    /// Build a tree over `points` (positions in `space`).
    ///
    /// An empty point list yields an empty tree; every query against it
    /// returns no result.
    pub fn build(space: &'s S, points: Vec<usize>) -> Self {
        let mut nodes: Vec<VpNode> = Vec::with_capacity(points.len());
        let mut root = None;

        let mut work: Vec<(Vec<usize>, Slot)> = Vec::new();
        if !points.is_empty() {
            work.push((points, Slot::Root));
        }

        let mut scratch: Vec<f32> = Vec::new();

        while let Some((mut partition, slot)) = work.pop() {
            let vantage = partition.swap_remove(0);

            let distances: Vec<(usize, f32)> = partition
                .iter()
                .map(|&p| (p, space.distance(vantage, p)))
                .collect();

            let radius = if distances.is_empty() {
                0.0
            } else {
                scratch.clear();
                scratch.extend(distances.iter().map(|&(_, d)| d));
                let mid = scratch.len() / 2;
                let (_, median, _) = scratch.select_nth_unstable_by(mid, f32::total_cmp);
                *median
            };

            let mut inside = Vec::with_capacity(distances.len() / 2 + 1);
            let mut outside = Vec::with_capacity(distances.len() / 2 + 1);
            let mut ties = Vec::new();
            for (p, d) in distances {
                match d.total_cmp(&radius) {
                    Ordering::Less => inside.push(p),
                    Ordering::Greater => outside.push(p),
                    Ordering::Equal => ties.push(p),
                }
            }
            for p in ties {
                if inside.len() < outside.len() {
                    inside.push(p);
                } else {
                    outside.push(p);
                }
            }

            let id = nodes.len() as NodeId;
            nodes.push(VpNode {
                point: vantage,
                radius,
                inside: None,
                outside: None,
            });
            match slot {
                Slot::Root => root = Some(id),
                Slot::Inside(parent) => nodes[parent as usize].inside = Some(id),
                Slot::Outside(parent) => nodes[parent as usize].outside = Some(id),
            }

            if !outside.is_empty() {
                work.push((outside, Slot::Outside(id)));
            }
            if !inside.is_empty() {
                work.push((inside, Slot::Inside(id)));
            }
        }

        Self { space, nodes, root }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree (0 when empty, 1 for a single leaf).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = &self.nodes[id as usize];
            stack.extend(node.inside.map(|c| (c, level + 1)));
            stack.extend(node.outside.map(|c| (c, level + 1)));
        }
        deepest
    }

    /// Closest indexed point to `query` for which `exclude` is false.
    ///
    /// Points at infinite distance are never returned. `None` means the tree
    /// is empty or every reachable point is excluded or incomparable.
    pub fn nearest<F>(&self, query: usize, exclude: F) -> Option<Neighbor>
    where
        F: Fn(usize) -> bool,
    {
        let mut best: Option<Neighbor> = None;
        let mut best_dist = f32::INFINITY;

        let mut stack: Vec<(NodeId, f32)> = self.root.map(|r| (r, 0.0)).into_iter().collect();
        while let Some((id, gap)) = stack.pop() {
            if gap > best_dist {
                continue;
            }
            let node = &self.nodes[id as usize];
            let d = self.space.distance(query, node.point);

            if d < best_dist && !exclude(node.point) {
                best_dist = d;
                best = Some(Neighbor {
                    point: node.point,
                    distance: d,
                });
            }

            self.push_children(node, d, &mut stack);
        }

        best
    }

    /// Up to `k` closest points to `query` for which `exclude` is false,
    /// ordered best-first.
    ///
    /// Returns exactly `min(k, available)` results, where available counts
    /// non-excluded points at finite distance.
    pub fn k_nearest<F>(&self, query: usize, k: usize, exclude: F) -> Vec<Neighbor>
    where
        F: Fn(usize) -> bool,
    {
        let k = k.min(self.len());
        if k == 0 {
            return Vec::new();
        }

        let mut kept: BinaryHeap<Farthest> = BinaryHeap::with_capacity(k.saturating_add(1));
        // Distance of the worst kept result once k are held.
        let threshold = |kept: &BinaryHeap<Farthest>| {
            if kept.len() < k {
                f32::INFINITY
            } else {
                kept.peek().map_or(f32::INFINITY, |f| f.0.distance)
            }
        };

        let mut stack: Vec<(NodeId, f32)> = self.root.map(|r| (r, 0.0)).into_iter().collect();
        while let Some((id, gap)) = stack.pop() {
            if gap > threshold(&kept) {
                continue;
            }
            let node = &self.nodes[id as usize];
            let d = self.space.distance(query, node.point);

            if d.is_finite() && d < threshold(&kept) && !exclude(node.point) {
                kept.push(Farthest(Neighbor {
                    point: node.point,
                    distance: d,
                }));
                if kept.len() > k {
                    kept.pop();
                }
            }

            self.push_children(node, d, &mut stack);
        }

        // into_sorted_vec is ascending under Farthest's ordering: best-first.
        kept.into_sorted_vec().into_iter().map(|f| f.0).collect()
    }

    /// Schedule both children: the far side first (so it is visited last)
    /// tagged with its pruning gap, then the near side unconditionally.
    fn push_children(&self, node: &VpNode, d: f32, stack: &mut Vec<(NodeId, f32)>) {
        // Without finite distances there is no triangle-inequality bound.
        let gap = if d.is_finite() && node.radius.is_finite() {
            (d - node.radius).abs()
        } else {
            0.0
        };

        let (near, far) = if d < node.radius {
            (node.inside, node.outside)
        } else {
            (node.outside, node.inside)
        };

        if let Some(far) = far {
            stack.push((far, gap));
        }
        if let Some(near) = near {
            stack.push((near, 0.0));
        }
    }
}
