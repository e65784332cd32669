//! Classic metric-space indexes.

pub mod trees;
