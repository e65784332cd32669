//! Randomized greedy ordering without an index.
//!
//! From the current item, scan the remaining items (or a uniform random
//! sample of at most `max_comparisons` of them) and move to the closest.
//! Per-step cost is bounded by the cap, which trades optimality for
//! predictable latency on large collections.
//!
//! When a step finds no candidate at finite distance, the remaining items are
//! appended in input order and the run ends.

use rand::seq::index;
use rand::Rng;

use super::{OrderInput, OrderOutcome, Prepared, RunContext, Strategy};
use crate::distance::{HashMetric, MetricSpace};
use crate::error::{OrderError, Result};
use crate::progress::Phase;

/// Order `input` greedily, sampling at most `max_comparisons` candidates
/// per step.
pub fn order_simple<M, R>(
    input: &OrderInput<'_>,
    metric: M,
    max_comparisons: usize,
    rng: &mut R,
    ctx: &RunContext<'_>,
) -> Result<OrderOutcome>
where
    M: HashMetric,
    R: Rng + ?Sized,
{
    ctx.checkpoint()?;
    if max_comparisons == 0 {
        return Err(OrderError::InvalidParameter(
            "max_comparisons must be greater than 0".to_string(),
        ));
    }

    let mut prepared = Prepared::new(input, metric, Strategy::Simple)?;
    let n = prepared.len();
    let start = prepared.start;

    let mut remaining: Vec<usize> = (0..n).filter(|&p| p != start).collect();
    let mut chain = Vec::with_capacity(n);
    chain.push(start);
    let mut current = start;

    ctx.begin(Phase::Ordering, n);
    while !remaining.is_empty() {
        ctx.checkpoint()?;

        let space = &prepared.space;
        let closer = |best: Option<(usize, f32)>, slot: usize| {
            let d = space.distance(current, remaining[slot]);
            match best {
                Some((_, bd)) if bd <= d => best,
                _ if d.is_finite() => Some((slot, d)),
                _ => best,
            }
        };

        let best = if remaining.len() > max_comparisons {
            index::sample(rng, remaining.len(), max_comparisons)
                .into_iter()
                .fold(None, closer)
        } else {
            (0..remaining.len()).fold(None, closer)
        };

        let Some((slot, d)) = best else {
            tracing::debug!(
                remaining = remaining.len(),
                "no comparable candidate; appending rest unordered"
            );
            break;
        };

        current = remaining.swap_remove(slot);
        chain.push(current);
        prepared.stats.tour_length += f64::from(d);
        ctx.tick(Phase::Ordering, chain.len(), n);
    }

    Ok(prepared.finish(chain))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::distance::Hamming;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run(symbols: &[&str], focus: Option<usize>, cap: usize) -> Result<OrderOutcome> {
        let hs = hashes(symbols);
        let mut rng = StdRng::seed_from_u64(7);
        with_ctx(false, |ctx| {
            order_simple(&input(&hs, focus), Hamming, cap, &mut rng, ctx)
        })
    }

    #[test]
    fn four_item_example() {
        let outcome = run(&["0000", "0001", "1111", "1110"], Some(0), usize::MAX).unwrap();
        assert_eq!(outcome.positions, vec![0, 1, 3, 2]);
        // 1 + 2 + 1
        assert_eq!(outcome.stats.tour_length, 4.0);
    }

    #[test]
    fn single_item() {
        let outcome = run(&["0101"], Some(0), 10).unwrap();
        assert_eq!(outcome.positions, vec![0]);
    }

    #[test]
    fn no_hashes_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let input = OrderInput::new(vec![None, None], Some(0));
        let err = with_ctx(false, |ctx| {
            order_simple(&input, Hamming, 10, &mut rng, ctx)
        });
        assert_eq!(
            err.err(),
            Some(OrderError::NoUsableHashes {
                required: 1,
                found: 0
            })
        );
    }

    #[test]
    fn capped_sampling_still_covers_everything() {
        let symbols: Vec<String> = (0..300u32).map(|i| format!("{:012b}", i * 13 % 4096)).collect();
        let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
        let outcome = run(&refs, Some(5), 8).unwrap();
        assert_eq!(outcome.positions[0], 5);
        assert!(is_permutation(&outcome.positions, 300));
    }

    #[test]
    fn same_seed_same_order() {
        let symbols: Vec<String> = (0..120u32).map(|i| format!("{:010b}", i * 7 % 1024)).collect();
        let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
        let a = run(&refs, None, 5).unwrap();
        let b = run(&refs, None, 5).unwrap();
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn incomparable_rest_is_appended_in_input_order() {
        // Lengths differ from the start item, so nothing is reachable.
        let outcome = run(&["00", "111", "000", "0"], Some(0), 100).unwrap();
        assert_eq!(outcome.positions, vec![0, 1, 2, 3]);
        assert_eq!(outcome.stats.unplaced, 3);
    }

    #[test]
    fn cancelled_before_start() {
        let hs = hashes(&["0"]);
        let mut rng = StdRng::seed_from_u64(0);
        let result = with_ctx(true, |ctx| {
            order_simple(&input(&hs, Some(0)), Hamming, 10, &mut rng, ctx)
        });
        assert_eq!(result.err(), Some(OrderError::Cancelled));
    }

    #[test]
    fn zero_cap_rejected() {
        assert!(matches!(
            run(&["0", "1"], None, 0),
            Err(OrderError::InvalidParameter(_))
        ));
    }
}
