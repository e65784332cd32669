//! Tree-based metric indexes.

pub mod vptree;

pub use vptree::{Neighbor, VpTree};
