//! Stress testing: shocked scenario variants scored against the baseline

mod generator;
mod scorer;
mod shocks;
mod types;

pub use generator::{StressScenario, StressScenarioGenerator};
pub use scorer::{recovery_time, ResilienceAssessment, ResilienceScorer, ResilienceWeights, ScoreComponents};
pub use shocks::{Shock, ShockDefinition};
pub use types::{ImpactAnalysis, ScenarioOutcome, StressTestResult};

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::error::Result;
use crate::projection::{ProjectionConfig, ProjectionEngine};
use crate::scenario::{validate, ScenarioParameters, ValidatedScenario};
use crate::simulation::{MonteCarloConfig, MonteCarloSimulator};

/// Baseline plus every stressed scenario, scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestReport {
    pub baseline: ScenarioOutcome,
    /// Baseline scored against itself (wealth component 1 by construction)
    pub baseline_assessment: ResilienceAssessment,
    pub scenarios: Vec<StressScenario>,
    pub results: Vec<StressTestResult>,
}

/// Runs a baseline and its stress variants through the projector and simulator
#[derive(Debug, Clone)]
pub struct StressTester {
    engine: ProjectionEngine,
    simulator: MonteCarloSimulator,
    generator: StressScenarioGenerator,
    scorer: ResilienceScorer,
}

impl StressTester {
    pub fn new(
        assumptions: &Assumptions,
        projection: ProjectionConfig,
        monte_carlo: MonteCarloConfig,
    ) -> Result<Self> {
        let engine = ProjectionEngine::new(projection);
        Ok(Self {
            simulator: MonteCarloSimulator::new(&assumptions.returns, engine.clone(), monte_carlo)?,
            engine,
            generator: StressScenarioGenerator::new(),
            scorer: ResilienceScorer::new(assumptions.resilience)?,
        })
    }

    /// Expected path and Monte Carlo distribution, computed side by side
    pub fn run_scenario(
        &self,
        scenario: &ValidatedScenario,
        trial_count: usize,
        seed: u64,
    ) -> Result<ScenarioOutcome> {
        let (projection, monte_carlo) = rayon::join(
            || self.engine.project_expected(scenario),
            || self.simulator.simulate(scenario, trial_count, seed),
        );
        Ok(ScenarioOutcome {
            projection: projection?,
            monte_carlo: monte_carlo?,
        })
    }

    /// Stress a baseline with each definition. Every scenario uses the same
    /// seed, so trial i sees the same market path everywhere.
    pub fn run(
        &self,
        baseline: &ScenarioParameters,
        definitions: &[ShockDefinition],
        trial_count: usize,
        seed: u64,
    ) -> Result<StressTestReport> {
        let validated = validate(baseline)?;
        let scenarios = self.generator.generate(baseline, definitions)?;
        let stressed: Vec<ValidatedScenario> = scenarios
            .iter()
            .map(|s| validate(&s.parameters))
            .collect::<Result<_>>()?;

        let baseline_outcome = self.run_scenario(&validated, trial_count, seed)?;
        let baseline_assessment = self.scorer.score(&baseline_outcome, &baseline_outcome);

        let outcomes: Vec<ScenarioOutcome> = stressed
            .par_iter()
            .map(|s| self.run_scenario(s, trial_count, seed))
            .collect::<Result<_>>()?;

        let mut scenarios = scenarios;
        let mut results = Vec::with_capacity(scenarios.len());
        for (scenario, outcome) in scenarios.iter_mut().zip(outcomes) {
            let assessment = self.scorer.score(&baseline_outcome, &outcome);
            info!(
                "{}: survival {:.1}%, resilience {:.1}, recovery {:?}",
                scenario.name,
                assessment.survival_probability,
                assessment.resilience_score,
                assessment.recovery_time_years
            );
            results.push(StressTestResult::new(&scenario.name, scenario.impact, &assessment));
            scenario.outcome = Some(outcome);
        }

        Ok(StressTestReport {
            baseline: baseline_outcome,
            baseline_assessment,
            scenarios,
            results,
        })
    }
}
