//! Edge case tests for hashwalk.
//!
//! Tests unusual inputs and boundary conditions that could cause failures.

use hashwalk::engine::{order, OrderRequest};
use hashwalk::ordering::mst::{SimilarityGraph, SpanningTree};
use hashwalk::{
    CancelToken, Hamming, HashSpace, Neighbor, NoProgress, OrderConfig, OrderError,
    PerceptualHash, RunContext, Strategy, VpTree,
};
use std::collections::HashMap;

fn request(strategy: &str, entries: &[(&str, Option<&str>)], focus: Option<usize>) -> OrderRequest {
    OrderRequest {
        strategy: strategy.to_string(),
        items: entries.iter().map(|(k, _)| k.to_string()).collect(),
        hashes: entries
            .iter()
            .filter_map(|(k, h)| h.map(|h| (k.to_string(), h.to_string())))
            .collect::<HashMap<_, _>>(),
        focus_index: focus,
        max_comparisons: None,
    }
}

const STRATEGIES: [&str; 3] = ["simple", "vptree", "mst"];

// =============================================================================
// Collection size edge cases
// =============================================================================

#[test]
fn empty_collection_has_no_usable_hashes() {
    for strategy in STRATEGIES {
        let err = order(&request(strategy, &[], None), &OrderConfig::default()).unwrap_err();
        assert!(
            matches!(err, OrderError::NoUsableHashes { found: 0, .. }),
            "{strategy}: {err:?}"
        );
    }
}

#[test]
fn all_hashless_has_no_usable_hashes() {
    let entries = [("a", None), ("b", None)];
    for strategy in STRATEGIES {
        let err =
            order(&request(strategy, &entries, Some(0)), &OrderConfig::default()).unwrap_err();
        assert!(matches!(err, OrderError::NoUsableHashes { found: 0, .. }));
    }
}

#[test]
fn single_hashed_item_only_works_for_simple() {
    let entries = [("a", Some("0101")), ("b", None)];

    let ordered = order(&request("simple", &entries, None), &OrderConfig::default()).unwrap();
    assert_eq!(ordered.keys, vec!["a", "b"]);

    for strategy in ["vptree", "mst"] {
        let err = order(&request(strategy, &entries, None), &OrderConfig::default()).unwrap_err();
        assert_eq!(
            err,
            OrderError::NoUsableHashes {
                required: 2,
                found: 1
            }
        );
    }
}

#[test]
fn two_items() {
    let entries = [("a", Some("00")), ("b", Some("11"))];
    for strategy in STRATEGIES {
        let ordered =
            order(&request(strategy, &entries, Some(1)), &OrderConfig::default()).unwrap();
        assert_eq!(ordered.keys, vec!["b", "a"], "{strategy}");
    }
}

// =============================================================================
// Hash content edge cases
// =============================================================================

#[test]
fn identical_hashes() {
    let entries: Vec<(String, Option<&str>)> =
        (0..50).map(|i| (format!("dup-{i}"), Some("10101010"))).collect();
    let borrowed: Vec<(&str, Option<&str>)> =
        entries.iter().map(|(k, h)| (k.as_str(), *h)).collect();

    for strategy in STRATEGIES {
        let ordered =
            order(&request(strategy, &borrowed, Some(10)), &OrderConfig::default()).unwrap();
        assert_eq!(ordered.keys.len(), 50);
        assert_eq!(ordered.keys[0], "dup-10");
        assert_eq!(ordered.stats.tour_length, 0.0);
        assert_eq!(ordered.stats.unplaced, 0);
    }
}

#[test]
fn mixed_hash_lengths_keep_every_item() {
    let entries = [
        ("a", Some("0000")),
        ("b", Some("000")),
        ("c", Some("0001")),
        ("d", None),
        ("e", Some("001")),
        ("f", Some("0011")),
    ];
    for strategy in STRATEGIES {
        let ordered =
            order(&request(strategy, &entries, Some(0)), &OrderConfig::default()).unwrap();
        assert_eq!(ordered.keys.len(), 6, "{strategy}");
        assert_eq!(&ordered.keys[..3], &["a", "c", "f"], "{strategy}");
        // Short hashes are unreachable from the 4-symbol start.
        assert_eq!(&ordered.keys[3..], &["b", "e", "d"], "{strategy}");
        assert_eq!(ordered.stats.unplaced, 2);
    }
}

#[test]
fn duplicate_keys_are_separate_entries() {
    let entries = [("a", Some("00")), ("a", Some("00")), ("b", Some("11"))];
    let ordered = order(&request("vptree", &entries, Some(2)), &OrderConfig::default()).unwrap();
    assert_eq!(ordered.keys, vec!["b", "a", "a"]);
}

// =============================================================================
// Index and MST boundaries
// =============================================================================

#[test]
fn single_item_tree() {
    let hs = [PerceptualHash::from_symbols("0110").unwrap()];
    let space = HashSpace::new(hs.iter().collect(), Hamming);
    let tree = VpTree::build(&space, vec![0]);

    assert_eq!(tree.nearest(0, |_| false).map(|n| n.point), Some(0));
    assert!(tree.nearest(0, |p| p == 0).is_none());
}

#[test]
fn mst_over_complete_graph_has_n_minus_one_edges() {
    let n = 25;
    let graph = SimilarityGraph::from_adjacency(
        (0..n)
            .map(|a: usize| {
                (0..n)
                    .filter(|&b| b != a)
                    .map(|b| Neighbor {
                        point: b,
                        distance: ((a * 7 + b * 3) % 11) as f32,
                    })
                    .collect()
            })
            .collect(),
    );
    let token = CancelToken::new();
    let ctx = RunContext::new(&token, &NoProgress, 10);
    let tree = SpanningTree::prim(&graph, 3, &ctx).unwrap();

    assert_eq!(tree.visited_count(), n);
    assert_eq!(tree.edge_count(), n - 1);
    let degree_sum: usize = (0..n).map(|p| tree.neighbors(p).len()).sum();
    assert_eq!(degree_sum, 2 * (n - 1));
}

#[test]
fn small_knn_floor_leaves_graph_disconnected_but_complete_output() {
    // Two far-apart clusters with k = 1 cannot be joined by the k-NN graph.
    let mut entries: Vec<(String, String)> = Vec::new();
    for i in 0..8u32 {
        entries.push((format!("lo-{i}"), format!("00000000{:03b}", i)));
        entries.push((format!("hi-{i}"), format!("11111111{:03b}", i)));
    }
    let req = OrderRequest {
        strategy: "mst".to_string(),
        items: entries.iter().map(|(k, _)| k.clone()).collect(),
        hashes: entries.into_iter().collect(),
        focus_index: Some(0),
        max_comparisons: None,
    };
    let config = OrderConfig {
        knn: hashwalk::KnnConfig {
            min_neighbors: 1,
            sqrt_scale: 0.0,
        },
        ..Default::default()
    };

    let ordered = order(&req, &config).unwrap();
    assert_eq!(ordered.keys.len(), 16);
    assert!(ordered.stats.mst_edges < 15);
    assert!(ordered.stats.fallback_jumps >= 1);
    assert_eq!(ordered.stats.strategy, Strategy::Mst);
}
