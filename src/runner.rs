//! Scenario runner for efficient batch evaluation
//!
//! Pre-loads assumptions once, then validates, projects, simulates and
//! stress-tests any number of client scenarios without re-reading CSV files.

use rayon::prelude::*;

use crate::assumptions::Assumptions;
use crate::error::Result;
use crate::projection::{ProjectionConfig, ProjectionEngine, ProjectionResult};
use crate::scenario::{validate, ScenarioParameters, ScenarioRecord, ValidatedScenario};
use crate::simulation::{MonteCarloConfig, MonteCarloResult, MonteCarloSimulator};
use crate::stress::{ScenarioOutcome, ShockDefinition, StressTestReport, StressTester};

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
///
/// let outcome = runner.evaluate(&ScenarioParameters::example(), 1000, 42)?;
/// println!("survival {:.1}%", outcome.monte_carlo.survival_probability);
///
/// let report = runner.stress_test(&params, &ShockDefinition::standard_set(), 1000, 42)?;
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_assumptions: Assumptions,
    projection: ProjectionConfig,
    monte_carlo: MonteCarloConfig,
}

impl ScenarioRunner {
    /// Create runner with default in-memory assumptions
    pub fn new() -> Self {
        Self::with_assumptions(Assumptions::default_planning())
    }

    /// Create runner by loading assumptions from CSV files
    pub fn from_csv() -> std::result::Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::with_assumptions(Assumptions::from_csv()?))
    }

    /// Create runner from specific assumptions directory
    pub fn from_csv_path(
        path: &std::path::Path,
    ) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::with_assumptions(Assumptions::from_csv_path(path)?))
    }

    /// Create runner with pre-built assumptions
    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self {
            base_assumptions: assumptions,
            projection: ProjectionConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
        }
    }

    pub fn with_projection_config(mut self, config: ProjectionConfig) -> Self {
        self.projection = config;
        self
    }

    pub fn with_monte_carlo_config(mut self, config: MonteCarloConfig) -> Self {
        self.monte_carlo = config;
        self
    }

    pub fn validate(&self, params: &ScenarioParameters) -> Result<ValidatedScenario> {
        validate(params)
    }

    /// Deterministic projection along the expected-return path
    pub fn project(&self, params: &ScenarioParameters) -> Result<ProjectionResult> {
        let scenario = validate(params)?;
        self.engine().project_expected(&scenario)
    }

    pub fn simulate(
        &self,
        params: &ScenarioParameters,
        trial_count: usize,
        seed: u64,
    ) -> Result<MonteCarloResult> {
        let scenario = validate(params)?;
        self.simulator()?.simulate(&scenario, trial_count, seed)
    }

    /// Expected path and Monte Carlo distribution for one scenario
    pub fn evaluate(
        &self,
        params: &ScenarioParameters,
        trial_count: usize,
        seed: u64,
    ) -> Result<ScenarioOutcome> {
        let scenario = validate(params)?;
        self.stress_tester()?.run_scenario(&scenario, trial_count, seed)
    }

    pub fn stress_test(
        &self,
        params: &ScenarioParameters,
        definitions: &[ShockDefinition],
        trial_count: usize,
        seed: u64,
    ) -> Result<StressTestReport> {
        self.stress_tester()?.run(params, definitions, trial_count, seed)
    }

    /// Evaluate many clients in parallel; one result per record, in input order
    pub fn run_batch(
        &self,
        records: &[ScenarioRecord],
        trial_count: usize,
        seed: u64,
    ) -> Result<Vec<Result<ScenarioOutcome>>> {
        let tester = self.stress_tester()?;
        Ok(records
            .par_iter()
            .map(|r| {
                let scenario = validate(&r.params)?;
                tester.run_scenario(&scenario, trial_count, seed)
            })
            .collect())
    }

    /// Get reference to base assumptions for inspection/modification
    pub fn assumptions(&self) -> &Assumptions {
        &self.base_assumptions
    }

    /// Get mutable reference to base assumptions for customization
    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.base_assumptions
    }

    fn engine(&self) -> ProjectionEngine {
        ProjectionEngine::new(self.projection.clone())
    }

    fn simulator(&self) -> Result<MonteCarloSimulator> {
        MonteCarloSimulator::new(&self.base_assumptions.returns, self.engine(), self.monte_carlo.clone())
    }

    fn stress_tester(&self) -> Result<StressTester> {
        StressTester::new(&self.base_assumptions, self.projection.clone(), self.monte_carlo.clone())
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
