//! Similarity scoring and ranking.
//!
//! Exhaustive scan: every candidate is scored against the query, scores are
//! rounded to 4 decimals, thresholded, sorted best first, and capped.
//!
//! # Algorithm
//!
//! `cosine(a, b) = Σ aᵢbᵢ / (‖a‖ · ‖b‖)`, accumulated in `f64`.
//!
//! Degenerate inputs (empty vectors, length mismatch, zero or non-finite
//! magnitude) score 0 instead of failing.

/// Cosine similarity of two vectors, in `[-1, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return 0.0;
    }

    let score = dot / magnitude;
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Round a score to 4 decimal places.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Cut-offs applied by [`rank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Maximum results.
    pub limit: usize,

    /// Minimum rounded score (inclusive).
    pub threshold: f64,
}

/// A candidate with its rounded similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    /// The candidate.
    pub item: T,

    /// Rounded cosine similarity.
    pub score: f64,
}

/// Score, filter, sort, and cap `candidates` against `query`.
///
/// Ties keep their relative candidate order, so the output is a pure
/// function of the inputs.
pub fn rank<T, F>(query: &[f32], candidates: Vec<T>, options: RankOptions, vector_of: F) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> &[f32],
{
    let mut ranked: Vec<Ranked<T>> = candidates
        .into_iter()
        .filter_map(|item| {
            let score = round_score(cosine_similarity(query, vector_of(&item)));
            (score >= options.threshold).then_some(Ranked { item, score })
        })
        .collect();

    // Stable sort: equal scores keep candidate order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(options.limit);
    ranked
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(ranked: &[Ranked<(&'static str, Vec<f32>)>]) -> Vec<&'static str> {
        ranked.iter().map(|r| r.item.0).collect()
    }

    fn options(limit: usize, threshold: f64) -> RankOptions {
        RankOptions { limit, threshold }
    }

    // ------------------------------------------------------------------------
    // Cosine tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_cosine_identical() {
        let v = [0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.123_456), 0.1235);
        assert_eq!(round_score(0.999_96), 1.0);
        assert_eq!(round_score(-0.000_04), -0.0);
    }

    // ------------------------------------------------------------------------
    // Ranking tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_rank_orders_descending() {
        let candidates = vec![
            ("far", vec![0.0, 1.0]),
            ("near", vec![1.0, 0.1]),
            ("mid", vec![1.0, 1.0]),
        ];
        let ranked = rank(&[1.0, 0.0], candidates, options(10, 0.0), |c| c.1.as_slice());
        assert_eq!(ids(&ranked), vec!["near", "mid", "far"]);
        assert_eq!(ranked[1].score, 0.7071);
    }

    #[test]
    fn test_rank_threshold_inclusive() {
        let candidates = vec![("exact", vec![1.0, 1.0]), ("below", vec![0.0, 1.0])];
        let ranked = rank(&[1.0, 0.0], candidates, options(10, 0.7071), |c| c.1.as_slice());
        assert_eq!(ids(&ranked), vec!["exact"]);
    }

    #[test]
    fn test_rank_ties_keep_candidate_order() {
        let candidates = vec![
            ("b", vec![1.0, 0.0]),
            ("a", vec![2.0, 0.0]),
            ("c", vec![3.0, 0.0]),
        ];
        let ranked = rank(&[1.0, 0.0], candidates, options(2, 0.0), |c| c.1.as_slice());
        assert_eq!(ids(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_rank_empty_and_zero_limit() {
        let empty: Vec<(&'static str, Vec<f32>)> = vec![];
        assert!(rank(&[1.0], empty, options(10, 0.0), |c| c.1.as_slice()).is_empty());

        let candidates = vec![("a", vec![1.0])];
        assert!(rank(&[1.0], candidates, options(0, 0.0), |c| c.1.as_slice()).is_empty());
    }

    #[test]
    fn test_rank_mismatched_dimensions_score_zero() {
        let candidates = vec![("short", vec![1.0]), ("ok", vec![1.0, 0.0])];
        let ranked = rank(&[1.0, 0.0], candidates, options(10, 0.0), |c| c.1.as_slice());
        assert_eq!(ids(&ranked), vec!["ok", "short"]);
        assert_eq!(ranked[1].score, 0.0);
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    fn vector(len: usize) -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-100.0f32..100.0, len)
    }

    proptest! {
        #[test]
        fn prop_cosine_symmetric((a, b) in (1usize..32).prop_flat_map(|n| (vector(n), vector(n)))) {
            prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        }

        #[test]
        fn prop_cosine_bounded((a, b) in (1usize..32).prop_flat_map(|n| (vector(n), vector(n)))) {
            let score = cosine_similarity(&a, &b);
            prop_assert!((-1.0..=1.0).contains(&score));
        }

        #[test]
        fn prop_self_similarity_is_one(a in vector(16)) {
            prop_assume!(a.iter().any(|x| x.abs() > 1e-3));
            prop_assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_rank_respects_limit_threshold_and_order(
            query in vector(8),
            candidates in prop::collection::vec(vector(8), 0..40),
            limit in 0usize..20,
            threshold in -1.0f64..1.0,
        ) {
            let indexed: Vec<(usize, Vec<f32>)> = candidates.into_iter().enumerate().collect();
            let ranked = rank(&query, indexed.clone(), options(limit, threshold), |c| c.1.as_slice());

            prop_assert!(ranked.len() <= limit);
            for r in &ranked {
                prop_assert!(r.score >= threshold);
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].item.0 < pair[1].item.0);
                }
            }

            let again = rank(&query, indexed, options(limit, threshold), |c| c.1.as_slice());
            prop_assert_eq!(ranked, again);
        }
    }
}
