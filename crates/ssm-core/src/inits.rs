//! Per-chain initial values from a bootstrap of the observed series.
//!
//! Each chain resamples the observed (log) values with replacement and starts
//! at `tau_add = 1/var(diff(y*))` and `tau_obs = 5/var(y*)`. The random source
//! is an explicitly seeded [`StdRng`], so the same seed gives the same values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use ssm_math::{diff, variance};

use crate::data::{DataError, RDump};

/// Sampler random number generators cycled across chains.
pub const RNG_NAMES: [&str; 4] = [
    "base::Wichmann-Hill",
    "base::Marsaglia-Multicarry",
    "base::Super-Duper",
    "base::Mersenne-Twister",
];

const MIN_OBSERVED: usize = 3;
const MAX_ATTEMPTS: usize = 100;

/// Starting values for one chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainInits {
    /// 1-based chain number.
    pub chain: u32,
    pub tau_add: f64,
    pub tau_obs: f64,
    pub rng_name: &'static str,
    pub rng_seed: u32,
}

impl ChainInits {
    pub fn to_rdump(&self) -> String {
        RDump::new()
            .scalar("tau_add", self.tau_add)
            .scalar("tau_obs", self.tau_obs)
            .string(".RNG.name", self.rng_name)
            .integer(".RNG.seed", u64::from(self.rng_seed))
            .finish()
    }
}

/// One set of initial values per chain.
///
/// Resamples that come out constant (zero variance) are redrawn.
pub fn bootstrap_inits(
    observed: &[f64],
    n_chains: u32,
    seed: u64,
) -> Result<Vec<ChainInits>, DataError> {
    if observed.len() < MIN_OBSERVED {
        return Err(DataError::TooFewObservations {
            needed: MIN_OBSERVED,
            found: observed.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut resample = vec![0.0; observed.len()];
    let mut inits = Vec::with_capacity(n_chains as usize);

    for chain in 1..=n_chains {
        let (tau_add, tau_obs) = (0..MAX_ATTEMPTS)
            .find_map(|_| {
                for slot in resample.iter_mut() {
                    *slot = observed[rng.random_range(0..observed.len())];
                }
                let var_diff = variance(&diff(&resample));
                let var_level = variance(&resample);
                (var_diff > 0.0 && var_level > 0.0).then(|| (1.0 / var_diff, 5.0 / var_level))
            })
            .ok_or(DataError::DegenerateBootstrap {
                attempts: MAX_ATTEMPTS,
            })?;

        inits.push(ChainInits {
            chain,
            tau_add,
            tau_obs,
            rng_name: RNG_NAMES[(chain as usize - 1) % RNG_NAMES.len()],
            rng_seed: rng.random_range(1..=i32::MAX as u32),
        });
    }

    tracing::debug!(
        n_chains,
        seed,
        n_observed = observed.len(),
        "bootstrap initial values drawn"
    );
    Ok(inits)
}
