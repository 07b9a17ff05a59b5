//! Empirical quantiles by linear interpolation of order statistics.
//!
//! The estimator is the "type 7" definition (Hyndman & Fan, 1996): for a
//! sorted sample `x[1..=n]` and probability `p`, the 1-based position is
//! `h = 1 + p (n - 1)` and the quantile interpolates linearly between
//! `x[floor(h)]` and `x[ceil(h)]`.
//!
//! ```text
//! [1, 2, 3, 4, 5], p = 0.025  ->  h = 1.1  ->  1.1
//! [1, 2, 3, 4, 5], p = 0.5    ->  h = 3.0  ->  3.0
//! [1, 2, 3, 4, 5], p = 0.975  ->  h = 4.9  ->  4.9
//! ```
//!
//! Results are clamped to the bracketing order statistics, so the quantile
//! function is non-decreasing in `p` even under floating point rounding.

/// Whether `p` is a usable probability (finite and within `[0, 1]`).
pub fn is_probability(p: f64) -> bool {
    p.is_finite() && (0.0..=1.0).contains(&p)
}

/// Sort a sample in place using IEEE total ordering (NaN sorts last).
pub fn sort_sample(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Type-7 quantile of an already sorted sample.
///
/// Returns NaN for an empty sample or an invalid probability. A sample of one
/// value returns that value for every `p`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() || !is_probability(p) {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let h = p * (sorted.len() - 1) as f64;
    let lo = (h.floor() as usize).min(sorted.len() - 1);
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - lo as f64;

    let x_lo = sorted[lo];
    let x_hi = sorted[hi];
    if frac <= 0.0 || x_lo == x_hi {
        return x_lo;
    }
    if !x_lo.is_finite() || !x_hi.is_finite() {
        // Interpolating towards an infinite order statistic is undefined;
        // snap to the nearer one.
        return if frac < 0.5 { x_lo } else { x_hi };
    }

    (x_lo + frac * (x_hi - x_lo)).clamp(x_lo, x_hi)
}

/// Type-7 quantile of an unsorted sample (sorts a copy).
pub fn quantile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sort_sample(&mut sorted);
    quantile_sorted(&sorted, p)
}

/// Several quantiles of an already sorted sample, in the order requested.
pub fn quantiles_sorted(sorted: &[f64], probs: &[f64]) -> Vec<f64> {
    probs.iter().map(|&p| quantile_sorted(sorted, p)).collect()
}

/// Median of an unsorted sample.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn type7_reference_values() {
        let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx_eq(quantile_sorted(&sample, 0.5), 3.0, 1e-12));
        assert!(approx_eq(quantile_sorted(&sample, 0.025), 1.1, 1e-12));
        assert!(approx_eq(quantile_sorted(&sample, 0.975), 4.9, 1e-12));
        assert_eq!(quantile_sorted(&sample, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sample, 1.0), 5.0);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let sample = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert!(approx_eq(quantile(&sample, 0.25), 2.0, 1e-12));
        assert!(approx_eq(median(&sample), 3.0, 1e-12));
    }

    #[test]
    fn even_length_median_interpolates() {
        assert!(approx_eq(median(&[1.0, 2.0, 3.0, 10.0]), 2.5, 1e-12));
    }

    #[test]
    fn single_value_is_returned_for_any_probability() {
        for p in [0.0, 0.025, 0.5, 0.975, 1.0] {
            assert_eq!(quantile_sorted(&[7.5], p), 7.5);
        }
    }

    #[test]
    fn empty_or_invalid_probability_is_nan() {
        assert!(quantile_sorted(&[], 0.5).is_nan());
        assert!(quantile_sorted(&[1.0, 2.0], -0.1).is_nan());
        assert!(quantile_sorted(&[1.0, 2.0], 1.5).is_nan());
        assert!(quantile_sorted(&[1.0, 2.0], f64::NAN).is_nan());
    }

    #[test]
    fn infinite_order_statistics_snap() {
        let sorted = [1.0, f64::INFINITY];
        assert_eq!(quantile_sorted(&sorted, 0.2), 1.0);
        assert_eq!(quantile_sorted(&sorted, 0.8), f64::INFINITY);
    }

    #[test]
    fn sort_sample_puts_nan_last() {
        let mut values = [3.0, f64::NAN, -1.0, 2.0];
        sort_sample(&mut values);
        assert_eq!(&values[..3], &[-1.0, 2.0, 3.0]);
        assert!(values[3].is_nan());
    }

    #[test]
    fn quantiles_sorted_preserves_request_order() {
        let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
        let qs = quantiles_sorted(&sample, &[0.975, 0.5, 0.025]);
        assert!(approx_eq(qs[0], 4.9, 1e-12));
        assert!(approx_eq(qs[1], 3.0, 1e-12));
        assert!(approx_eq(qs[2], 1.1, 1e-12));
    }
}
