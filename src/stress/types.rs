//! Stress-test output records

use serde::{Deserialize, Serialize};

use super::scorer::ResilienceAssessment;
use crate::projection::ProjectionResult;
use crate::simulation::MonteCarloResult;

/// Deterministic expected path and Monte Carlo distribution for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub projection: ProjectionResult,
    pub monte_carlo: MonteCarloResult,
}

/// Compounded size of the shocks in a stress scenario, in percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    pub portfolio_decline_percent: f64,
    pub income_reduction_percent: f64,
    pub expense_increase_percent: f64,
}

/// Per-scenario result handed back to the calling application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressTestResult {
    pub scenario_name: String,
    pub impact_analysis: ImpactAnalysis,
    pub survival_probability: f64,
    pub resilience_score: f64,
    pub shortfall_risk: f64,
    /// Year the stressed expected path rejoins the baseline after falling
    /// behind it. Null when it never rejoins within the horizon, and also
    /// when the shock never pushes it below the baseline.
    pub recovery_time_years: Option<u32>,
}

impl StressTestResult {
    pub fn new(
        scenario_name: impl Into<String>,
        impact_analysis: ImpactAnalysis,
        assessment: &ResilienceAssessment,
    ) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            impact_analysis,
            survival_probability: assessment.survival_probability,
            resilience_score: assessment.resilience_score,
            shortfall_risk: assessment.shortfall_risk,
            recovery_time_years: assessment.recovery_time_years,
        }
    }
}
