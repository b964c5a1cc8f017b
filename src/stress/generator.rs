//! Builds stressed scenario variants from a baseline

use log::debug;
use serde::{Deserialize, Serialize};

use super::shocks::{Shock, ShockDefinition};
use super::types::{ImpactAnalysis, ScenarioOutcome};
use crate::error::Result;
use crate::scenario::ScenarioParameters;

/// A baseline variant with one or more shocks applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    pub name: String,
    pub description: String,
    pub shocks: Vec<Shock>,
    /// Stressed copy of the baseline parameters
    pub parameters: ScenarioParameters,
    pub impact: ImpactAnalysis,
    /// Filled in once the scenario has been run
    pub outcome: Option<ScenarioOutcome>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StressScenarioGenerator;

impl StressScenarioGenerator {
    pub fn new() -> Self {
        Self
    }

    /// One stressed copy per definition; the baseline is left untouched.
    /// Every definition is checked before any scenario is built.
    pub fn generate(
        &self,
        baseline: &ScenarioParameters,
        definitions: &[ShockDefinition],
    ) -> Result<Vec<StressScenario>> {
        definitions.iter().try_for_each(ShockDefinition::validate)?;

        let scenarios: Vec<StressScenario> = definitions
            .iter()
            .map(|def| {
                let mut parameters = baseline.clone();
                for shock in &def.shocks {
                    shock.apply(&mut parameters);
                }
                StressScenario {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    shocks: def.shocks.clone(),
                    parameters,
                    impact: def.impact(),
                    outcome: None,
                }
            })
            .collect();

        debug!("Generated {} stress scenarios", scenarios.len());
        Ok(scenarios)
    }
}
