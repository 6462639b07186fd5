//! Frontier selection over the union of all candidates of a step.
//!
//! Both selectors return candidate indices; the engine maps them back to states.

use std::cmp::Ordering;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Indices of the `k` highest values, best first. Ties keep generation order.
pub fn greedy(values: &[f64], k: usize) -> Vec<usize> {
    let mut ids: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable, so equal scores keep ascending index order
    ids.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
    });
    ids.truncate(k);
    ids
}

/// Draws `min(k, len)` distinct indices with probability proportional to value.
///
/// Negative and NaN values weigh 0. When every remaining weight is 0 the draw is uniform.
pub fn sample<R: Rng + ?Sized>(values: &[f64], k: usize, rng: &mut R) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..values.len()).collect();
    let mut picked = Vec::with_capacity(k.min(values.len()));
    while picked.len() < k && !remaining.is_empty() {
        let weights: Vec<f64> = remaining
            .iter()
            .map(|&i| {
                let v = values[i];
                if v.is_finite() && v > 0.0 {
                    v
                } else {
                    0.0
                }
            })
            .collect();
        let pos = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..remaining.len()),
        };
        picked.push(remaining.remove(pos));
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// **Scenario**: greedy returns the k best, best first, ties in original order.
    #[test]
    fn greedy_picks_top_k_with_stable_ties() {
        let values = [1.0, 20.0, 1.0, 0.001, 20.0];
        assert_eq!(greedy(&values, 3), vec![1, 4, 0]);
        assert_eq!(greedy(&values, 10), vec![1, 4, 0, 2, 3]);
        assert!(greedy(&values, 0).is_empty());
        assert!(greedy(&[], 2).is_empty());
    }

    /// **Scenario**: re-selecting the selected states with the same k returns them unchanged.
    #[test]
    fn greedy_is_idempotent() {
        let values = [0.5, 3.0, 3.0, 2.0, 0.1, 9.0];
        let first = greedy(&values, 3);
        let selected_values: Vec<f64> = first.iter().map(|&i| values[i]).collect();
        let again = greedy(&selected_values, 3);
        let again_mapped: Vec<usize> = again.iter().map(|&j| first[j]).collect();
        assert_eq!(again_mapped, first);
    }

    /// **Scenario**: sampling never repeats an index and caps at the number of candidates.
    #[test]
    fn sample_is_without_replacement() {
        let mut rng = StdRng::seed_from_u64(42);
        let values = [1.0, 2.0, 3.0];
        for _ in 0..50 {
            let mut got = sample(&values, 5, &mut rng);
            assert_eq!(got.len(), 3);
            got.sort_unstable();
            assert_eq!(got, vec![0, 1, 2]);
        }
    }

    /// **Scenario**: zero-weight candidates are only drawn once positive ones are exhausted.
    #[test]
    fn sample_prefers_positive_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let values = [0.0, 5.0, 0.0, 1.0];
        for _ in 0..50 {
            let mut got = sample(&values, 2, &mut rng);
            got.sort_unstable();
            assert_eq!(got, vec![1, 3]);
        }
    }

    /// **Scenario**: all-zero scores fall back to a uniform draw instead of failing.
    #[test]
    fn sample_all_zero_is_uniform_fallback() {
        let mut rng = StdRng::seed_from_u64(1);
        let got = sample(&[0.0, 0.0, 0.0], 2, &mut rng);
        assert_eq!(got.len(), 2);
        assert_ne!(got[0], got[1]);
    }

    /// **Scenario**: the same seed gives the same draw.
    #[test]
    fn sample_is_deterministic_for_seed() {
        let values = [1.0, 4.0, 2.0, 8.0, 0.5];
        let a = sample(&values, 3, &mut StdRng::seed_from_u64(99));
        let b = sample(&values, 3, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
