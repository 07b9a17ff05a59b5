//! Convergence diagnostics: split R-hat and effective sample size.
//!
//! Both statistics split every chain in half first, so a chain that drifts
//! shows up as disagreement between its own halves. They are only computed
//! with at least two chains and four draws per chain; otherwise the report is
//! marked disabled and carries no verdict.

use serde::Serialize;
use ssm_config::DiagnosticThresholds;
use std::fmt;

use crate::samples::PosteriorSamples;

pub const MIN_CHAINS: usize = 2;
pub const MIN_DRAWS_PER_CHAIN: usize = 4;

/// Overall verdict for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Ok,
    Warn,
    Fail,
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityStatus::Ok => write!(f, "ok"),
            QualityStatus::Warn => write!(f, "warn"),
            QualityStatus::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDiagnostics {
    pub name: String,
    pub r_hat: f64,
    pub ess: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    pub enabled: bool,
    pub n_chains: usize,
    pub draws_per_chain: usize,
    pub status: QualityStatus,
    /// Largest finite R-hat, NaN if none.
    pub max_r_hat: f64,
    /// Smallest finite ESS, NaN if none.
    pub min_ess: f64,
    pub warnings: Vec<String>,
    pub failures: Vec<String>,
    pub params: Vec<ParamDiagnostics>,
}

impl DiagnosticsReport {
    /// Parameters sorted worst first by R-hat.
    pub fn worst(&self, n: usize) -> Vec<&ParamDiagnostics> {
        let mut sorted: Vec<&ParamDiagnostics> = self.params.iter().collect();
        sorted.sort_by(|a, b| b.r_hat.total_cmp(&a.r_hat));
        sorted.truncate(n);
        sorted
    }
}

/// Diagnose every column of a sample matrix.
pub fn diagnose(samples: &PosteriorSamples, thresholds: &DiagnosticThresholds) -> DiagnosticsReport {
    let n_chains = samples.n_chains();
    let draws_per_chain = samples.draws_per_chain().into_iter().min().unwrap_or(0);
    let enabled = n_chains >= MIN_CHAINS && draws_per_chain >= MIN_DRAWS_PER_CHAIN;

    if !enabled {
        return DiagnosticsReport {
            enabled,
            n_chains,
            draws_per_chain,
            status: QualityStatus::Ok,
            max_r_hat: f64::NAN,
            min_ess: f64::NAN,
            warnings: vec![format!(
                "diagnostics disabled: need {MIN_CHAINS} chains with {MIN_DRAWS_PER_CHAIN} draws each"
            )],
            failures: Vec::new(),
            params: Vec::new(),
        };
    }

    let params: Vec<ParamDiagnostics> = samples
        .names()
        .iter()
        .enumerate()
        .map(|(pos, name)| {
            let chains = samples.chains_of(pos);
            ParamDiagnostics {
                name: name.clone(),
                r_hat: split_r_hat(&chains),
                ess: effective_sample_size(&chains),
            }
        })
        .collect();

    let max_r_hat = params
        .iter()
        .map(|p| p.r_hat)
        .filter(|v| v.is_finite())
        .fold(f64::NAN, f64::max);
    let min_ess = params
        .iter()
        .map(|p| p.ess)
        .filter(|v| v.is_finite())
        .fold(f64::NAN, f64::min);

    let mut warnings = Vec::new();
    let mut failures = Vec::new();
    for p in &params {
        if p.r_hat > thresholds.max_rhat_fail {
            failures.push(format!("{}: r_hat {:.3} > {}", p.name, p.r_hat, thresholds.max_rhat_fail));
        } else if p.r_hat > thresholds.max_rhat_warn {
            warnings.push(format!("{}: r_hat {:.3} > {}", p.name, p.r_hat, thresholds.max_rhat_warn));
        }
        if p.ess < thresholds.min_ess_fail {
            failures.push(format!("{}: ess {:.0} < {}", p.name, p.ess, thresholds.min_ess_fail));
        } else if p.ess < thresholds.min_ess_warn {
            warnings.push(format!("{}: ess {:.0} < {}", p.name, p.ess, thresholds.min_ess_warn));
        }
    }

    let status = if !failures.is_empty() {
        QualityStatus::Fail
    } else if !warnings.is_empty() {
        QualityStatus::Warn
    } else {
        QualityStatus::Ok
    };

    tracing::debug!(
        n_params = params.len(),
        max_r_hat,
        min_ess,
        status = %status,
        "diagnostics computed"
    );

    DiagnosticsReport {
        enabled,
        n_chains,
        draws_per_chain,
        status,
        max_r_hat,
        min_ess,
        warnings,
        failures,
        params,
    }
}

/// Each chain split in half, trimmed to a common length. `None` if any chain
/// has fewer than four draws.
fn split_halves<'a>(chains: &[&'a [f64]]) -> Option<Vec<&'a [f64]>> {
    if chains.is_empty() {
        return None;
    }
    let mut halves = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        if chain.len() < MIN_DRAWS_PER_CHAIN {
            return None;
        }
        let mid = chain.len() / 2;
        halves.push(&chain[..mid]);
        halves.push(&chain[mid..]);
    }
    let len = halves.iter().map(|h| h.len()).min().unwrap_or(0);
    Some(halves.into_iter().map(|h| &h[..len]).collect())
}

/// Between-chain variance `B`, mean within-chain variance `W` and the pooled
/// estimate `var+ = (n-1)/n W + B/n`.
fn variance_components(halves: &[&[f64]]) -> (f64, f64, f64) {
    let m = halves.len() as f64;
    let n = halves[0].len() as f64;
    let moments: Vec<ssm_math::Moments> = halves.iter().map(|h| ssm_math::Moments::of(h)).collect();
    let grand = moments.iter().map(|s| s.mean).sum::<f64>() / m;
    let b = moments.iter().map(|s| (s.mean - grand).powi(2)).sum::<f64>() * n / (m - 1.0);
    let w = moments.iter().map(|s| s.variance).sum::<f64>() / m;
    (b, w, (n - 1.0) / n * w + b / n)
}

/// Split potential scale reduction factor. NaN when undefined (too few
/// draws, or zero within-chain variance).
pub fn split_r_hat(chains: &[&[f64]]) -> f64 {
    let Some(halves) = split_halves(chains) else {
        return f64::NAN;
    };
    let (_, w, var_plus) = variance_components(&halves);
    if w.is_nan() || w <= 1e-30 {
        return f64::NAN;
    }
    (var_plus / w).sqrt()
}

/// Effective sample size from variogram autocorrelations summed with Geyer's
/// initial monotone sequence. Clamped to `[1, total draws]`.
pub fn effective_sample_size(chains: &[&[f64]]) -> f64 {
    let Some(halves) = split_halves(chains) else {
        return f64::NAN;
    };
    let n = halves[0].len();
    let total = (halves.len() * n) as f64;
    let (_, _, var_plus) = variance_components(&halves);
    if !var_plus.is_finite() || var_plus < 1e-30 {
        return total;
    }

    // rho_t = 1 - V_t / (2 var+), V_t the mean squared lag-t difference.
    let rho = |lag: usize| -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for h in &halves {
            for i in 0..n - lag {
                let d = h[i] - h[i + lag];
                sum += d * d;
                count += 1;
            }
        }
        (1.0 - sum / count as f64 / (2.0 * var_plus)).clamp(-1.0, 1.0)
    };

    // Pairs (rho_0 + rho_1), (rho_2 + rho_3), ... while positive, made
    // non-increasing.
    let mut pair_sums: Vec<f64> = Vec::new();
    let mut lag = 0;
    while lag + 1 < n {
        let first = if lag == 0 { 1.0 } else { rho(lag) };
        let pair = first + rho(lag + 1);
        if pair < 0.0 {
            break;
        }
        let pair = pair_sums.last().map_or(pair, |&prev: &f64| pair.min(prev));
        pair_sums.push(pair);
        lag += 2;
    }

    let tau = -1.0 + 2.0 * pair_sums.iter().sum::<f64>();
    if !tau.is_finite() || tau <= 0.0 {
        return total;
    }
    (total / tau).clamp(1.0, total)
}
