//! Binary min-heap of weighted edges, used by Prim's algorithm.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Weighted edge between two positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub distance: f32,
}

/// Heap entry. `seq` breaks distance ties in insertion order.
#[derive(Debug, Clone, Copy)]
struct Queued {
    edge: Edge,
    seq: u64,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the smallest distance (then the
        // oldest entry) surfaces first. total_cmp keeps NaN from poisoning it.
        self.edge
            .distance
            .total_cmp(&other.edge.distance)
            .then(self.seq.cmp(&other.seq))
            .reverse()
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-priority queue of [`Edge`]s keyed by distance.
#[derive(Debug, Default)]
pub struct EdgeQueue {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl EdgeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// O(log n).
    pub fn push(&mut self, edge: Edge) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Queued { edge, seq });
    }

    /// Remove the cheapest edge, or `None` when empty. O(log n).
    pub fn pop(&mut self) -> Option<Edge> {
        self.heap.pop().map(|q| q.edge)
    }

    pub fn peek(&self) -> Option<&Edge> {
        self.heap.peek().map(|q| &q.edge)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: usize, to: usize, distance: f32) -> Edge {
        Edge { from, to, distance }
    }

    #[test]
    fn pops_in_ascending_distance() {
        let mut q = EdgeQueue::new();
        for (i, d) in [5.0, 1.0, 3.0, 0.0, 4.0, 2.0].into_iter().enumerate() {
            q.push(edge(0, i, d));
        }
        assert_eq!(q.len(), 6);

        let order: Vec<f32> = std::iter::from_fn(|| q.pop()).map(|e| e.distance).collect();
        assert_eq!(order, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(q.is_empty());
    }

    #[test]
    fn empty_pop_is_none() {
        let mut q = EdgeQueue::new();
        assert!(q.pop().is_none());
        assert!(q.peek().is_none());
    }

    #[test]
    fn equal_distances_pop_in_insertion_order() {
        let mut q = EdgeQueue::with_capacity(4);
        q.push(edge(0, 1, 2.0));
        q.push(edge(0, 2, 1.0));
        q.push(edge(0, 3, 2.0));
        q.push(edge(0, 4, 1.0));

        let order: Vec<usize> = std::iter::from_fn(|| q.pop()).map(|e| e.to).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }

    #[test]
    fn infinite_distances_sort_last() {
        let mut q = EdgeQueue::new();
        q.push(edge(0, 1, f32::INFINITY));
        q.push(edge(0, 2, 7.0));
        assert_eq!(q.pop().map(|e| e.to), Some(2));
        assert_eq!(q.pop().map(|e| e.to), Some(1));
    }
}
