//! Property-based tests for credible bands and held-out comparison.

use proptest::prelude::*;
use ssm_core::data::{HeldOutMask, HeldOutTruth, TruthPoint};
use ssm_core::summary::{
    align_to_time, compare_bands, credible_band, extract_group, CredibleBand, SummaryError,
    Transform,
};
use ssm_core::PosteriorSamples;

const TOL: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOL.max(TOL * a.abs().max(b.abs()))
}

fn draws(n_cols: usize, n_draws: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-50.0..50.0f64, n_draws), n_cols)
}

fn truth_at(band: &CredibleBand, positions: &[usize], outlier: Option<usize>) -> HeldOutTruth {
    HeldOutTruth::from_points(
        positions
            .iter()
            .map(|&p| TruthPoint {
                position: p,
                time: format!("w{p}"),
                value: Some(if outlier == Some(p) {
                    band.upper[p] + 1_000.0
                } else {
                    band.median[p]
                }),
            })
            .collect(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Group columns come back ordered by index whatever the file order.
    #[test]
    fn group_is_ordered_and_complete(
        order in Just((1..=12usize).collect::<Vec<_>>()).prop_shuffle(),
        n_draws in 1usize..20,
    ) {
        let mut names: Vec<String> = order.iter().map(|i| format!("x[{i}]")).collect();
        names.push("tau_x[1]".to_string());
        names.push("x_ic".to_string());
        let columns: Vec<Vec<f64>> = names
            .iter()
            .enumerate()
            .map(|(j, _)| vec![j as f64; n_draws])
            .collect();
        let samples = PosteriorSamples::from_columns(names, columns).unwrap();

        let group = extract_group(&samples, "x").unwrap();
        prop_assert_eq!(group.len(), 12);
        prop_assert!(group.indices().windows(2).all(|w| w[0] < w[1]));
        let expected: Vec<usize> = (1..=12).collect();
        prop_assert_eq!(group.indices(), expected.as_slice());
        // x[i] was written at file position order.position(i).
        for (k, column) in group.columns().iter().enumerate() {
            let file_pos = order.iter().position(|&i| i == k + 1).unwrap();
            prop_assert_eq!(column[0], file_pos as f64);
        }
    }

    /// lower <= median <= upper everywhere, for any valid probabilities.
    #[test]
    fn band_is_ordered(
        columns in draws(6, 30),
        lower in 0.0..0.5f64,
        upper in 0.5..=1.0f64,
    ) {
        let band = credible_band(&columns, (lower, upper), Transform::Identity).unwrap();
        for p in band.points() {
            prop_assert!(p.lower <= p.median && p.median <= p.upper);
        }
    }

    /// Quantiles of transformed draws equal transformed quantiles when every
    /// probability lands on an order statistic.
    #[test]
    fn increasing_transform_commutes(
        k in 1usize..4,
        seed_columns in draws(4, 121),
    ) {
        let n = 40 * k + 1;
        let columns: Vec<Vec<f64>> = seed_columns.iter().map(|c| c[..n].to_vec()).collect();
        let probs = (0.025, 0.975);
        let identity = credible_band(&columns, probs, Transform::Identity).unwrap();

        let cube = Transform::Custom("cube", |x| x * x * x);
        for transform in [Transform::Exp, cube] {
            let band = credible_band(&columns, probs, transform).unwrap();
            for i in 0..band.len() {
                prop_assert!(approx_eq(band.lower[i], transform.apply(identity.lower[i])));
                prop_assert!(approx_eq(band.median[i], transform.apply(identity.median[i])));
                prop_assert!(approx_eq(band.upper[i], transform.apply(identity.upper[i])));
            }
        }
    }

    /// A single draw collapses the band to that draw, transformed.
    #[test]
    fn single_draw_collapses(v in -5.0..5.0f64) {
        let band = credible_band(&[vec![v]], (0.1, 0.9), Transform::Exp).unwrap();
        prop_assert_eq!(band.lower[0], v.exp());
        prop_assert_eq!(band.median[0], v.exp());
        prop_assert_eq!(band.upper[0], v.exp());
    }

    /// Observed at the median covers everything; one far-off value costs 1/k.
    #[test]
    fn coverage_drops_by_one_over_k(
        columns in draws(10, 25),
        k in 1usize..=10,
        outlier_slot in 0usize..10,
    ) {
        let band = credible_band(&columns, (0.05, 0.95), Transform::Identity).unwrap();
        let positions: Vec<usize> = (10 - k..10).collect();
        let mask = HeldOutMask::new(positions.clone());

        let clean = compare_bands(&band, &truth_at(&band, &positions, None), &mask).unwrap();
        prop_assert_eq!(clean.n_points, k);
        prop_assert_eq!(clean.coverage, 1.0);

        let outlier = positions[outlier_slot % k];
        let dirty = compare_bands(&band, &truth_at(&band, &positions, Some(outlier)), &mask).unwrap();
        prop_assert!(approx_eq(dirty.coverage, 1.0 - 1.0 / k as f64));
    }

    /// Any length difference between band and time index is rejected.
    #[test]
    fn time_index_length_must_match(len in 1usize..30, delta in 1usize..5, longer in any::<bool>()) {
        let band = credible_band(&vec![vec![0.0, 1.0]; len], (0.025, 0.975), Transform::Identity).unwrap();
        let labels_len = if longer { len + delta } else { len.saturating_sub(delta) };
        prop_assume!(labels_len != len);
        let labels: Vec<String> = (0..labels_len).map(|i| format!("t{i}")).collect();
        let err = align_to_time(&band, &labels).unwrap_err();
        let is_mismatch = matches!(err, SummaryError::LengthMismatch { .. });
        prop_assert!(is_mismatch);
    }
}

#[test]
fn type7_quantiles_of_one_to_five() {
    let band = credible_band(&[vec![5.0, 3.0, 1.0, 4.0, 2.0]], (0.025, 0.975), Transform::Identity)
        .unwrap();
    assert!(approx_eq(band.lower[0], 1.1));
    assert_eq!(band.median[0], 3.0);
    assert!(approx_eq(band.upper[0], 4.9));
}

#[test]
fn exp_band_over_five_states() {
    let names: Vec<String> = (1..=5).map(|i| format!("x[{i}]")).collect();
    let columns: Vec<Vec<f64>> = (0..5)
        .map(|j| (0..1000).map(|d| (j as f64) + (d as f64 / 1000.0) - 0.5).collect())
        .collect();
    let samples = PosteriorSamples::from_columns(names, columns).unwrap();

    let group = extract_group(&samples, "x").unwrap();
    let band = credible_band(group.columns(), (0.025, 0.975), Transform::Exp).unwrap();
    assert_eq!(band.lower.len(), 5);
    assert_eq!(band.median.len(), 5);
    assert_eq!(band.upper.len(), 5);
    assert!(band
        .lower
        .iter()
        .chain(&band.median)
        .chain(&band.upper)
        .all(|v| *v > 0.0));
    assert!(band.median.windows(2).all(|w| w[0] < w[1]));
}
