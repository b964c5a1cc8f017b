//! Correlated annual return sampling
//!
//! Every trial owns its RNG, seeded from BLAKE3(seed, trial index). A trial's
//! returns therefore depend only on the seed and its index, never on which
//! thread runs it or in what order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::assumptions::ReturnModel;
use crate::error::Result;
use crate::projection::apply_recovery_uplift;
use crate::scenario::{AssetReturns, ValidatedScenario};

/// Derive the 32-byte ChaCha seed for one trial
pub fn trial_seed(seed: u64, trial_index: u64) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(&trial_index.to_le_bytes());
    *hasher.finalize().as_bytes()
}

pub fn trial_rng(seed: u64, trial_index: u64) -> ChaCha8Rng {
    ChaCha8Rng::from_seed(trial_seed(seed, trial_index))
}

/// Sampled returns indexed by trial, then year
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    paths: Vec<Vec<AssetReturns>>,
}

impl ReturnMatrix {
    pub fn trial_count(&self) -> usize {
        self.paths.len()
    }

    pub fn years(&self) -> usize {
        self.paths.first().map(Vec::len).unwrap_or(0)
    }

    pub fn trial(&self, index: usize) -> &[AssetReturns] {
        &self.paths[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[AssetReturns]> {
        self.paths.iter().map(Vec::as_slice)
    }
}

/// Draws correlated per-asset-class returns around the scenario's means
#[derive(Debug, Clone)]
pub struct ReturnSampler {
    model: ReturnModel,
    cholesky: [[f64; 4]; 4],
}

impl ReturnSampler {
    /// Fails with `InvalidAssumptions` if the correlation matrix is unusable
    pub fn new(model: &ReturnModel) -> Result<Self> {
        let cholesky = model.cholesky()?;
        Ok(Self {
            model: model.clone(),
            cholesky,
        })
    }

    pub fn model(&self) -> &ReturnModel {
        &self.model
    }

    /// Sample `trial_count` paths covering the scenario's projection years
    pub fn sample(
        &self,
        scenario: &ValidatedScenario,
        trial_count: usize,
        seed: u64,
    ) -> ReturnMatrix {
        let paths = (0..trial_count)
            .into_par_iter()
            .map(|t| self.sample_trial(scenario, seed, t as u64))
            .collect();
        ReturnMatrix { paths }
    }

    /// One trial's return path, with any market-shock recovery compounded in
    pub fn sample_trial(
        &self,
        scenario: &ValidatedScenario,
        seed: u64,
        trial_index: u64,
    ) -> Vec<AssetReturns> {
        let means = scenario.mean_returns();
        let years = scenario.params().projection_years as usize;
        let mut rng = trial_rng(seed, trial_index);

        let mut path: Vec<AssetReturns> =
            (0..years).map(|_| self.draw_year(&means, &mut rng)).collect();
        apply_recovery_uplift(scenario.params(), &mut path);
        path
    }

    fn draw_year<R: Rng>(&self, means: &AssetReturns, rng: &mut R) -> AssetReturns {
        let z: [f64; 4] = [
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
        ];

        let mean = means.as_array();
        let mut out = [0.0; 4];
        for i in 0..4 {
            let correlated: f64 = (0..=i).map(|k| self.cholesky[i][k] * z[k]).sum();
            out[i] = self
                .model
                .distribution
                .transform(mean[i], self.model.volatilities[i], correlated);
        }
        AssetReturns::from_array(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{ReturnDistribution, MIN_ANNUAL_RETURN};
    use crate::projection::expected_return_path;
    use crate::scenario::{validate, MarketShock, ScenarioParameters};
    use crate::simulation::stats::{mean, std_dev};
    use approx::assert_abs_diff_eq;

    fn scenario() -> ValidatedScenario {
        validate(&ScenarioParameters::example()).unwrap()
    }

    #[test]
    fn test_same_seed_same_paths() {
        let sampler = ReturnSampler::new(&ReturnModel::default()).unwrap();
        let a = sampler.sample(&scenario(), 50, 42);
        let b = sampler.sample(&scenario(), 50, 42);
        assert_eq!(a, b);
        assert_eq!(a.trial_count(), 50);
        assert_eq!(a.years(), 45);
    }

    #[test]
    fn test_trial_independent_of_batch() {
        let sampler = ReturnSampler::new(&ReturnModel::default()).unwrap();
        let matrix = sampler.sample(&scenario(), 20, 7);
        let single = sampler.sample_trial(&scenario(), 7, 13);
        assert_eq!(matrix.trial(13), single.as_slice());
    }

    #[test]
    fn test_different_seeds_differ() {
        let sampler = ReturnSampler::new(&ReturnModel::default()).unwrap();
        let a = sampler.sample_trial(&scenario(), 1, 0);
        let b = sampler.sample_trial(&scenario(), 2, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_volatility_returns_means() {
        let sampler = ReturnSampler::new(&ReturnModel::zero_volatility()).unwrap();
        let s = scenario();
        for year in sampler.sample_trial(&s, 99, 3) {
            assert_eq!(year, s.mean_returns());
        }
    }

    #[test]
    fn test_recovery_window_matches_expected_path() {
        let mut params = ScenarioParameters::example();
        params.market_shock = Some(MarketShock { decline_percent: 30.0, recovery_years: Some(5) });
        let shocked = validate(&params).unwrap();

        let flat = ReturnSampler::new(&ReturnModel::zero_volatility()).unwrap();
        assert_eq!(flat.sample_trial(&shocked, 4, 0), expected_return_path(&params));

        // Same draws as the unshocked scenario, uplifted in years 1..=5 only
        let sampler = ReturnSampler::new(&ReturnModel::default()).unwrap();
        let plain = sampler.sample_trial(&scenario(), 4, 0);
        let uplifted = sampler.sample_trial(&shocked, 4, 0);
        let (_, uplift) = params.market_shock.unwrap().recovery_uplift().unwrap();

        assert_eq!(uplifted[0], plain[0]);
        for y in 1..=5 {
            assert_eq!(uplifted[y], plain[y].with_uplift(uplift));
        }
        assert_eq!(uplifted[6..], plain[6..]);
    }

    #[test]
    fn test_sample_moments() {
        let sampler = ReturnSampler::new(&ReturnModel::default()).unwrap();
        let matrix = sampler.sample(&scenario(), 400, 2024);

        let equity: Vec<f64> = matrix.iter().flatten().map(|r| r.equity).collect();
        let alt: Vec<f64> = matrix.iter().flatten().map(|r| r.alternative).collect();

        // 18,000 draws: standard error on the mean is ~0.0012
        assert_abs_diff_eq!(mean(&equity), 0.05, epsilon = 0.01);
        assert_abs_diff_eq!(std_dev(&equity), 0.16, epsilon = 0.01);

        let me = mean(&equity);
        let ma = mean(&alt);
        let cov: f64 = equity
            .iter()
            .zip(&alt)
            .map(|(e, a)| (e - me) * (a - ma))
            .sum::<f64>()
            / equity.len() as f64;
        let corr = cov / (std_dev(&equity) * std_dev(&alt));
        assert_abs_diff_eq!(corr, 0.70, epsilon = 0.05);
    }

    #[test]
    fn test_returns_never_below_total_loss() {
        let model = ReturnModel {
            volatilities: [0.9, 0.9, 0.9, 0.9],
            ..ReturnModel::default()
        };
        let sampler = ReturnSampler::new(&model).unwrap();
        for path in sampler.sample(&scenario(), 100, 5).iter() {
            assert!(path.iter().all(|r| r.min() >= MIN_ANNUAL_RETURN));
        }

        let lognormal = ReturnSampler::new(&model.with_distribution(ReturnDistribution::LogNormal))
            .unwrap();
        for path in lognormal.sample(&scenario(), 100, 5).iter() {
            assert!(path.iter().all(|r| r.min() > MIN_ANNUAL_RETURN));
        }
    }

    #[test]
    fn test_invalid_model_rejected() {
        let mut model = ReturnModel::default();
        model.volatilities[1] = -0.1;
        assert!(ReturnSampler::new(&model).is_err());
    }
}
