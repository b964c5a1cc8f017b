//! Randomized market-return trials

pub mod sampler;
pub mod stats;
mod monte_carlo;

pub use sampler::{ReturnMatrix, ReturnSampler};
pub use monte_carlo::{
    MonteCarloConfig, MonteCarloResult, MonteCarloSimulator, PercentileBands, YearBand,
    DEFAULT_TRIALS, MIN_TRIALS,
};
