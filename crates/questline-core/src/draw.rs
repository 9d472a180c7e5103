//! Weighted random selection over candidate pools.
//!
//! One implementation serves three call sites: event pools at a location,
//! reward pools on an event result, and monster pools on a battle event.
//! The engine is stateless beyond the random source the caller passes in,
//! which keeps every draw reproducible under a seeded generator.

use rand::Rng;

use crate::error::DrawError;

/// A draw candidate paired with its relative weight.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Weighted<T> {
    /// The candidate value.
    pub value: T,
    /// Relative draw weight. Must be non-negative; zero-weight candidates
    /// can never win but are legal during authoring.
    pub weight: f64,
}

impl<T> Weighted<T> {
    /// Pair a candidate with its weight.
    pub const fn new(value: T, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// Pick the index of one candidate by cumulative-weight selection.
///
/// Sums all weights, draws a uniform value in `[0, sum)`, then walks the
/// sequence accumulating weight and returns the first index whose
/// cumulative weight exceeds the draw. Float residue on the final
/// accumulation step falls through to the last positively-weighted
/// candidate.
///
/// # Errors
///
/// Returns [`DrawError::InvalidWeight`] if any weight is negative (checked
/// before summing, never clamped), or [`DrawError::NoCandidates`] if the
/// pool is empty or its weights sum to zero.
pub fn choose_index<T, R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[Weighted<T>],
) -> Result<usize, DrawError> {
    if let Some(bad) = candidates.iter().find(|c| c.weight < 0.0) {
        return Err(DrawError::InvalidWeight(bad.weight));
    }

    let total: f64 = candidates.iter().map(|c| c.weight).sum();
    if !(total > 0.0) {
        return Err(DrawError::NoCandidates);
    }

    let roll = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        if candidate.weight > 0.0 {
            last_positive = Some(idx);
        }
        cumulative += candidate.weight;
        if roll < cumulative {
            return Ok(idx);
        }
    }

    // Unreachable unless float accumulation left the roll in the final
    // residue; the last winnable candidate takes it.
    last_positive.ok_or(DrawError::NoCandidates)
}

/// Pick one candidate by cumulative-weight selection.
///
/// See [`choose_index`] for the algorithm and failure cases.
///
/// # Errors
///
/// Returns [`DrawError::InvalidWeight`] or [`DrawError::NoCandidates`] as
/// [`choose_index`] does.
pub fn choose<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &'a [Weighted<T>],
) -> Result<&'a T, DrawError> {
    let idx = choose_index(rng, candidates)?;
    candidates.get(idx).map(|c| &c.value).ok_or(DrawError::NoCandidates)
}

/// Rescale weights so they sum to 1.0.
///
/// Returns `None` when the sum is not positive or any weight is negative;
/// callers treat that as the documented no-op case (an empty or all-zero
/// pool is a valid transient state during authoring, not an error).
pub fn normalized(weights: &[f64]) -> Option<Vec<f64>> {
    if weights.iter().any(|w| *w < 0.0) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    Some(weights.iter().map(|w| w / total).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn empty_pool_yields_no_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool: Vec<Weighted<u8>> = Vec::new();
        assert_eq!(choose(&mut rng, &pool), Err(DrawError::NoCandidates));
    }

    #[test]
    fn all_zero_weights_yield_no_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = vec![Weighted::new('a', 0.0), Weighted::new('b', 0.0)];
        assert_eq!(choose(&mut rng, &pool), Err(DrawError::NoCandidates));
    }

    #[test]
    fn negative_weight_is_rejected_not_clamped() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool = vec![Weighted::new('a', -1.0)];
        assert_eq!(choose(&mut rng, &pool), Err(DrawError::InvalidWeight(-1.0)));
    }

    #[test]
    fn negative_weight_beats_no_candidates_check() {
        // A pool that is both zero-sum and negative reports the caller
        // error, since validation happens before summing.
        let mut rng = StdRng::seed_from_u64(1);
        let pool = vec![Weighted::new('a', 1.0), Weighted::new('b', -1.0)];
        assert_eq!(choose(&mut rng, &pool), Err(DrawError::InvalidWeight(-1.0)));
    }

    #[test]
    fn single_candidate_always_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = vec![Weighted::new("only", 0.25)];
        for _ in 0..100 {
            assert_eq!(choose(&mut rng, &pool).unwrap(), &"only");
        }
    }

    #[test]
    fn zero_weight_candidate_never_wins() {
        let mut rng = StdRng::seed_from_u64(11);
        let pool = vec![
            Weighted::new('a', 0.0),
            Weighted::new('b', 1.0),
            Weighted::new('c', 0.0),
        ];
        for _ in 0..1000 {
            assert_eq!(choose(&mut rng, &pool).unwrap(), &'b');
        }
    }

    #[test]
    fn ratio_one_to_three_converges() {
        // With weights 1:3, b should win roughly 75% of 10,000 draws.
        let mut rng = StdRng::seed_from_u64(42);
        let pool = vec![Weighted::new('a', 1.0), Weighted::new('b', 3.0)];

        let mut b_wins: u32 = 0;
        for _ in 0..10_000 {
            if choose(&mut rng, &pool).unwrap() == &'b' {
                b_wins = b_wins.saturating_add(1);
            }
        }

        // ~4 sigma tolerance around the 7500 expectation.
        assert!((7300..=7700).contains(&b_wins), "b won {b_wins} of 10000");
    }

    #[test]
    fn choose_index_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = vec![
            Weighted::new(0_u8, 0.2),
            Weighted::new(1_u8, 0.3),
            Weighted::new(2_u8, 0.5),
        ];
        for _ in 0..1000 {
            let idx = choose_index(&mut rng, &pool).unwrap();
            assert!(idx < pool.len());
        }
    }

    #[test]
    fn normalized_sums_to_one() {
        let scaled = normalized(&[2.0, 6.0]).unwrap();
        let sum: f64 = scaled.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((scaled[0] - 0.25).abs() < 1e-9);
        assert!((scaled[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn normalized_declines_zero_sum_and_negatives() {
        assert_eq!(normalized(&[]), None);
        assert_eq!(normalized(&[0.0, 0.0]), None);
        assert_eq!(normalized(&[1.0, -0.5]), None);
    }
}
