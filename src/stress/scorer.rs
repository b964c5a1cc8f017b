//! Resilience scoring of a stressed outcome against the baseline
//!
//! The score folds three components into a 0-100 number:
//! - survival: stressed survival probability as a fraction
//! - wealth: stressed median final assets relative to the baseline median,
//!   capped at 1 (1 when the baseline median is zero)
//! - depletion timing: mean per-trial fraction of the horizon reached before
//!   depletion (1 for trials that never deplete early)

use std::error::Error;

use serde::{Deserialize, Serialize};

use super::types::ScenarioOutcome;
use crate::assumptions::LoadedAssumptions;
use crate::error::{EngineError, Result};
use crate::projection::ProjectionResult;

/// Relative tolerance when comparing stressed and baseline asset levels
const RECOVERY_TOLERANCE: f64 = 1e-9;

/// Component weights; normalized by their sum when scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResilienceWeights {
    pub survival: f64,
    pub wealth: f64,
    pub depletion_timing: f64,
}

impl Default for ResilienceWeights {
    fn default() -> Self {
        Self {
            survival: 0.60,
            wealth: 0.25,
            depletion_timing: 0.15,
        }
    }
}

impl ResilienceWeights {
    pub fn total(&self) -> f64 {
        self.survival + self.wealth + self.depletion_timing
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.survival, self.wealth, self.depletion_timing];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) || self.total() <= 0.0 {
            return Err(EngineError::InvalidAssumptions(format!(
                "resilience weights must be non-negative with a positive sum, got {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Read the survival, wealth and depletion_timing rows of resilience_weights.csv
    pub fn from_loaded(loaded: &LoadedAssumptions) -> std::result::Result<Self, Box<dyn Error>> {
        let get = |key: &str| -> std::result::Result<f64, Box<dyn Error>> {
            loaded
                .resilience_weights
                .get(key)
                .copied()
                .ok_or_else(|| format!("Missing resilience weight: {}", key).into())
        };

        let weights = Self {
            survival: get("survival")?,
            wealth: get("wealth")?,
            depletion_timing: get("depletion_timing")?,
        };
        weights.validate()?;
        Ok(weights)
    }
}

/// Score components, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub survival: f64,
    pub wealth: f64,
    pub depletion_timing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceAssessment {
    pub survival_probability: f64,
    pub resilience_score: f64,
    pub shortfall_risk: f64,
    /// See [`recovery_time`]; `None` if the path never dips or never recovers
    pub recovery_time_years: Option<u32>,
    pub components: ScoreComponents,
}

#[derive(Debug, Clone)]
pub struct ResilienceScorer {
    weights: ResilienceWeights,
}

impl Default for ResilienceScorer {
    fn default() -> Self {
        Self {
            weights: ResilienceWeights::default(),
        }
    }
}

impl ResilienceScorer {
    pub fn new(weights: ResilienceWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ResilienceWeights {
        &self.weights
    }

    pub fn score(&self, baseline: &ScenarioOutcome, stressed: &ScenarioOutcome) -> ResilienceAssessment {
        let survival_probability = stressed.monte_carlo.survival_probability.clamp(0.0, 100.0);

        let baseline_median = baseline.monte_carlo.median_final_assets;
        let wealth = if baseline_median <= 0.0 {
            1.0
        } else {
            (stressed.monte_carlo.median_final_assets / baseline_median).clamp(0.0, 1.0)
        };

        let components = ScoreComponents {
            survival: survival_probability / 100.0,
            wealth,
            depletion_timing: stressed.monte_carlo.mean_depletion_timing.clamp(0.0, 1.0),
        };

        let w = &self.weights;
        let weighted = w.survival * components.survival
            + w.wealth * components.wealth
            + w.depletion_timing * components.depletion_timing;
        let resilience_score = (100.0 * weighted / w.total()).clamp(0.0, 100.0);

        ResilienceAssessment {
            survival_probability,
            resilience_score,
            shortfall_risk: 100.0 - survival_probability,
            recovery_time_years: recovery_time(&baseline.projection, &stressed.projection),
            components,
        }
    }
}

/// First year in which the stressed path, having fallen behind the baseline,
/// is back at (or above) it with assets remaining.
///
/// `None` both when the stressed path never catches up and when it never falls
/// behind in the first place (a shock that leaves the path untouched has
/// nothing to recover from).
pub fn recovery_time(baseline: &ProjectionResult, stressed: &ProjectionResult) -> Option<u32> {
    let mut behind = false;
    for (b, s) in baseline.years.iter().zip(&stressed.years) {
        let tolerance = RECOVERY_TOLERANCE * b.closing_assets.max(1.0);
        if s.closing_assets < b.closing_assets - tolerance {
            behind = true;
        } else if behind && s.closing_assets > 0.0 {
            return Some(s.year);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::YearProjection;
    use crate::simulation::{MonteCarloResult, PercentileBands};
    use approx::assert_relative_eq;

    fn row(year: u32, closing: f64) -> YearProjection {
        YearProjection {
            year,
            age: 45 + year,
            retired: false,
            opening_assets: 0.0,
            shock_loss: 0.0,
            blended_return: 0.0,
            investment_growth: 0.0,
            employment_income: 0.0,
            state_pension_income: 0.0,
            income: 0.0,
            expenses: 0.0,
            net_cashflow: 0.0,
            withdrawal: 0.0,
            shortfall: 0.0,
            closing_assets: closing,
            closing_equity: 0.0,
            closing_bond: 0.0,
            closing_cash: closing,
            closing_alternative: 0.0,
            withdrawal_rate: None,
            sustainability_ratio: None,
            depleted: false,
        }
    }

    fn path(closings: &[f64]) -> ProjectionResult {
        let mut result = ProjectionResult::new(closings.len() as u32);
        for (y, c) in closings.iter().enumerate() {
            result.add_year(row(y as u32, *c));
        }
        result
    }

    fn outcome(closings: &[f64], survival: f64, median: f64, timing: f64) -> ScenarioOutcome {
        ScenarioOutcome {
            projection: path(closings),
            monte_carlo: MonteCarloResult {
                trial_count: 100,
                seed: 0,
                survival_probability: survival,
                percentile_bands: PercentileBands {
                    p50: median,
                    ..PercentileBands::default()
                },
                mean_final_assets: median,
                median_final_assets: median,
                mean_depletion_timing: timing,
                earliest_depletion_year: None,
                yearly_bands: None,
            },
        }
    }

    #[test]
    fn test_baseline_against_itself_scores_its_survival_mix() {
        let baseline = outcome(&[100.0, 110.0], 80.0, 500.0, 0.9);
        let assessment = ResilienceScorer::default().score(&baseline, &baseline);

        // 0.6 * 0.8 + 0.25 * 1 + 0.15 * 0.9
        assert_relative_eq!(assessment.resilience_score, 86.5, epsilon = 1e-9);
        assert_relative_eq!(assessment.shortfall_risk, 20.0);
        assert_eq!(assessment.recovery_time_years, None);
    }

    #[test]
    fn test_wealth_component_capped_and_zero_baseline() {
        let baseline = outcome(&[1.0], 50.0, 100.0, 1.0);
        let richer = outcome(&[1.0], 50.0, 300.0, 1.0);
        let assessment = ResilienceScorer::default().score(&baseline, &richer);
        assert_eq!(assessment.components.wealth, 1.0);

        let broke = outcome(&[0.0], 0.0, 0.0, 0.0);
        let assessment = ResilienceScorer::default().score(&broke, &broke);
        assert_eq!(assessment.components.wealth, 1.0);
        assert_relative_eq!(assessment.resilience_score, 25.0, epsilon = 1e-9);
        assert_eq!(assessment.recovery_time_years, None);
    }

    #[test]
    fn test_weights_normalized_by_sum() {
        let scorer = ResilienceScorer::new(ResilienceWeights {
            survival: 2.0,
            wealth: 0.0,
            depletion_timing: 0.0,
        })
        .unwrap();
        let o = outcome(&[1.0], 40.0, 1.0, 1.0);
        assert_relative_eq!(scorer.score(&o, &o).resilience_score, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let zero = ResilienceWeights {
            survival: 0.0,
            wealth: 0.0,
            depletion_timing: 0.0,
        };
        assert!(ResilienceScorer::new(zero).is_err());

        let negative = ResilienceWeights {
            wealth: -0.1,
            ..ResilienceWeights::default()
        };
        assert!(ResilienceScorer::new(negative).is_err());
    }

    #[test]
    fn test_recovery_time_first_crossing() {
        let baseline = path(&[100.0, 110.0, 120.0, 130.0]);
        let stressed = path(&[70.0, 95.0, 120.0, 140.0]);
        assert_eq!(recovery_time(&baseline, &stressed), Some(2));

        let never = path(&[70.0, 80.0, 90.0, 100.0]);
        assert_eq!(recovery_time(&baseline, &never), None);

        // Shorter stressed path only compared over the common years
        let short = path(&[70.0]);
        assert_eq!(recovery_time(&baseline, &short), None);
    }

    #[test]
    fn test_recovery_time_needs_a_gap_first() {
        let baseline = path(&[100.0, 110.0, 120.0, 130.0]);

        // Untouched or better from the start: nothing to recover from
        assert_eq!(recovery_time(&baseline, &baseline), None);
        let ahead = path(&[100.0, 115.0, 125.0, 135.0]);
        assert_eq!(recovery_time(&baseline, &ahead), None);

        // Level at first, dented later, then back
        let late_dip = path(&[100.0, 90.0, 121.0, 130.0]);
        assert_eq!(recovery_time(&baseline, &late_dip), Some(2));
    }
}
