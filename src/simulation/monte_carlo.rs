//! Monte Carlo simulation over sampled market-return paths
//!
//! Each trial samples a full return path and runs it through the deterministic
//! projector. Only aggregate statistics survive a run. Trials are collected in
//! index order, so a parallel run reproduces a sequential one exactly.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::sampler::ReturnSampler;
use super::stats::{mean, percentile, sort_ascending};
use crate::assumptions::ReturnModel;
use crate::error::{EngineError, Result};
use crate::projection::{ProjectionEngine, ReturnPath};
use crate::scenario::ValidatedScenario;

/// Fewest trials accepted for a survival estimate
pub const MIN_TRIALS: usize = 100;

pub const DEFAULT_TRIALS: usize = 1000;

/// Configuration for Monte Carlo runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Trial count used by `simulate_default`
    pub default_trials: usize,

    /// Run trials on the rayon pool
    pub parallel: bool,

    /// Trials per batch; cancellation is checked between batches
    pub batch_size: usize,

    /// Keep per-year percentile bands (fan chart)
    pub collect_yearly_bands: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            default_trials: DEFAULT_TRIALS,
            parallel: true,
            batch_size: 250,
            collect_yearly_bands: false,
        }
    }
}

/// 10th/25th/50th/75th/90th percentiles of a set of asset values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl PercentileBands {
    /// Bands of an ascending-sorted slice
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p10: percentile(sorted, 10.0),
            p25: percentile(sorted, 25.0),
            p50: percentile(sorted, 50.0),
            p75: percentile(sorted, 75.0),
            p90: percentile(sorted, 90.0),
        }
    }
}

/// Percentile bands of closing assets for one projection year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearBand {
    pub year: u32,
    pub age: u32,
    pub bands: PercentileBands,
}

/// Aggregate outcome of a Monte Carlo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub trial_count: usize,
    pub seed: u64,

    /// Percent of trials whose assets last to life expectancy (0-100)
    pub survival_probability: f64,

    /// Bands over final-year assets
    pub percentile_bands: PercentileBands,
    pub mean_final_assets: f64,
    pub median_final_assets: f64,

    /// Mean of per-trial depletion timing (1.0 = never depleted early)
    pub mean_depletion_timing: f64,
    pub earliest_depletion_year: Option<u32>,

    pub yearly_bands: Option<Vec<YearBand>>,
}

struct TrialOutcome {
    survived: bool,
    final_assets: f64,
    depletion_timing: f64,
    depletion_year: Option<u32>,
    closing_path: Option<Vec<f64>>,
}

/// Runs trials for a validated scenario
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator {
    sampler: ReturnSampler,
    engine: ProjectionEngine,
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(model: &ReturnModel, engine: ProjectionEngine, config: MonteCarloConfig) -> Result<Self> {
        Ok(Self {
            sampler: ReturnSampler::new(model)?,
            engine,
            config,
        })
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    pub fn simulate(
        &self,
        scenario: &ValidatedScenario,
        trial_count: usize,
        seed: u64,
    ) -> Result<MonteCarloResult> {
        self.run(scenario, trial_count, seed, None)
    }

    /// Simulate with the configured default trial count
    pub fn simulate_default(&self, scenario: &ValidatedScenario, seed: u64) -> Result<MonteCarloResult> {
        self.run(scenario, self.config.default_trials, seed, None)
    }

    /// Simulate, stopping with `Cancelled` if `cancel` is set between batches
    pub fn simulate_cancellable(
        &self,
        scenario: &ValidatedScenario,
        trial_count: usize,
        seed: u64,
        cancel: &AtomicBool,
    ) -> Result<MonteCarloResult> {
        self.run(scenario, trial_count, seed, Some(cancel))
    }

    fn run(
        &self,
        scenario: &ValidatedScenario,
        trial_count: usize,
        seed: u64,
        cancel: Option<&AtomicBool>,
    ) -> Result<MonteCarloResult> {
        if trial_count < MIN_TRIALS {
            return Err(EngineError::InsufficientTrials {
                requested: trial_count,
                minimum: MIN_TRIALS,
            });
        }

        let batch_size = self.config.batch_size.max(1);
        let mut outcomes = Vec::with_capacity(trial_count);
        let mut start = 0;

        while start < trial_count {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(EngineError::Cancelled { completed_trials: start });
            }

            let end = (start + batch_size).min(trial_count);
            let batch: Vec<TrialOutcome> = if self.config.parallel {
                (start..end)
                    .into_par_iter()
                    .map(|t| self.run_trial(scenario, seed, t as u64))
                    .collect::<Result<_>>()?
            } else {
                (start..end)
                    .map(|t| self.run_trial(scenario, seed, t as u64))
                    .collect::<Result<_>>()?
            };
            outcomes.extend(batch);
            start = end;
        }

        let result = self.aggregate(scenario, outcomes, seed);
        debug!(
            "Monte Carlo: {} trials, seed {}, survival {:.1}%",
            result.trial_count, seed, result.survival_probability
        );
        Ok(result)
    }

    fn run_trial(&self, scenario: &ValidatedScenario, seed: u64, trial_index: u64) -> Result<TrialOutcome> {
        let path = self.sampler.sample_trial(scenario, seed, trial_index);
        let projection = self.engine.project(scenario, &ReturnPath::PerYear(&path))?;

        Ok(TrialOutcome {
            survived: projection.survived(),
            final_assets: projection.final_assets(),
            depletion_timing: projection.depletion_timing(),
            depletion_year: projection.depletion_year,
            closing_path: self
                .config
                .collect_yearly_bands
                .then(|| projection.closing_path()),
        })
    }

    fn aggregate(&self, scenario: &ValidatedScenario, outcomes: Vec<TrialOutcome>, seed: u64) -> MonteCarloResult {
        let n = outcomes.len();
        let survivors = outcomes.iter().filter(|o| o.survived).count();

        let mut finals: Vec<f64> = outcomes.iter().map(|o| o.final_assets).collect();
        let mean_final_assets = mean(&finals);
        sort_ascending(&mut finals);
        let percentile_bands = PercentileBands::from_sorted(&finals);

        let timings: Vec<f64> = outcomes.iter().map(|o| o.depletion_timing).collect();
        let earliest_depletion_year = outcomes.iter().filter_map(|o| o.depletion_year).min();

        let yearly_bands = self.config.collect_yearly_bands.then(|| {
            let years = scenario.params().projection_years as usize;
            let client_age = scenario.params().client_age;
            (0..years)
                .map(|y| {
                    let mut column: Vec<f64> = outcomes
                        .iter()
                        .filter_map(|o| o.closing_path.as_ref().and_then(|p| p.get(y).copied()))
                        .collect();
                    sort_ascending(&mut column);
                    YearBand {
                        year: y as u32,
                        age: client_age + y as u32,
                        bands: PercentileBands::from_sorted(&column),
                    }
                })
                .collect()
        });

        MonteCarloResult {
            trial_count: n,
            seed,
            survival_probability: 100.0 * survivors as f64 / n as f64,
            percentile_bands,
            mean_final_assets,
            median_final_assets: percentile_bands.p50,
            mean_depletion_timing: mean(&timings),
            earliest_depletion_year,
            yearly_bands,
        }
    }
}
