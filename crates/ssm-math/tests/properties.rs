//! Property-based tests for ssm-math numerical functions.
//!
//! Uses proptest to verify order-statistic properties across many random inputs.

use proptest::prelude::*;
use ssm_math::{correlation, quantile, quantile_sorted, sort_sample, Moments};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// quantile properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Quantiles are non-decreasing in p.
    #[test]
    fn quantile_monotone_in_p(
        mut values in prop::collection::vec(-1e6..1e6f64, 1..200),
        p1 in 0.0..=1.0f64,
        p2 in 0.0..=1.0f64,
    ) {
        sort_sample(&mut values);
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        let q_lo = quantile_sorted(&values, lo);
        let q_hi = quantile_sorted(&values, hi);
        prop_assert!(q_lo <= q_hi, "q({})={} > q({})={}", lo, q_lo, hi, q_hi);
    }

    /// Quantiles stay within the sample range.
    #[test]
    fn quantile_within_range(
        values in prop::collection::vec(-1e6..1e6f64, 1..200),
        p in 0.0..=1.0f64,
    ) {
        let q = quantile(&values, p);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(q >= min && q <= max, "q={} outside [{}, {}]", q, min, max);
    }

    /// The extremes are the minimum and maximum.
    #[test]
    fn quantile_extremes(values in prop::collection::vec(-1e6..1e6f64, 1..200)) {
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(quantile(&values, 0.0), min);
        prop_assert_eq!(quantile(&values, 1.0), max);
    }

    /// Quantiles do not depend on input order.
    #[test]
    fn quantile_permutation_invariant(
        values in prop::collection::vec(-1e3..1e3f64, 1..100),
        p in 0.0..=1.0f64,
    ) {
        let mut reversed = values.clone();
        reversed.reverse();
        prop_assert_eq!(quantile(&values, p), quantile(&reversed, p));
    }

    /// Shifting every draw shifts every quantile.
    #[test]
    fn quantile_shift_equivariant(
        values in prop::collection::vec(-1e3..1e3f64, 2..100),
        shift in -1e3..1e3f64,
        p in 0.0..=1.0f64,
    ) {
        let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
        let q = quantile(&values, p);
        let q_shifted = quantile(&shifted, p);
        prop_assert!(approx_eq(q + shift, q_shifted, TOL), "{} + {} != {}", q, shift, q_shifted);
    }
}

// ============================================================================
// moment properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Variance is never negative.
    #[test]
    fn variance_non_negative(values in prop::collection::vec(-1e4..1e4f64, 2..200)) {
        let m = Moments::of(&values);
        prop_assert!(m.variance >= -TOL, "variance {} < 0", m.variance);
    }

    /// Welford mean agrees with the naive mean.
    #[test]
    fn welford_matches_naive_mean(values in prop::collection::vec(-1e4..1e4f64, 1..200)) {
        let naive = values.iter().sum::<f64>() / values.len() as f64;
        prop_assert!(approx_eq(Moments::of(&values).mean, naive, 1e-8));
    }

    /// Correlation is bounded and symmetric.
    #[test]
    fn correlation_bounded_symmetric(
        pairs in prop::collection::vec((-1e3..1e3f64, -1e3..1e3f64), 3..100),
    ) {
        let a: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let b: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let r_ab = correlation(&a, &b);
        let r_ba = correlation(&b, &a);
        if r_ab.is_finite() {
            prop_assert!((-1.0..=1.0).contains(&r_ab));
            prop_assert!(approx_eq(r_ab, r_ba, TOL));
        }
    }
}
