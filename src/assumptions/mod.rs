//! Planning assumptions: capital-market model and resilience scoring weights

mod returns;
pub mod loader;

pub use returns::{
    ReturnDistribution, ReturnModel, DEFAULT_CORRELATIONS, DEFAULT_VOLATILITIES, MIN_ANNUAL_RETURN,
};
pub use loader::LoadedAssumptions;

use std::path::Path;

use crate::stress::ResilienceWeights;

/// Container for all engine assumptions
#[derive(Debug, Clone, PartialEq)]
pub struct Assumptions {
    pub returns: ReturnModel,
    pub resilience: ResilienceWeights,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_planning()
    }
}

impl Assumptions {
    /// In-memory defaults documented on `ReturnModel` and `ResilienceWeights`
    pub fn default_planning() -> Self {
        Self {
            returns: ReturnModel::default_capital_market(),
            resilience: ResilienceWeights::default(),
        }
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_csv_path(Path::new(loader::DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let loaded = LoadedAssumptions::load_from(path)?;

        let returns = ReturnModel {
            volatilities: loaded.volatilities,
            correlations: loaded.correlations,
            distribution: ReturnDistribution::default(),
        };
        // Unusable matrices fail here, before any simulation
        returns.cholesky()?;

        Ok(Self {
            returns,
            resilience: ResilienceWeights::from_loaded(&loaded)?,
        })
    }
}
