//! Core projection engine for annual retirement cashflow projections

use serde::{Deserialize, Serialize};

use super::cashflows::{ProjectionResult, YearProjection};
use super::state::ProjectionState;
use crate::error::{EngineError, Result};
use crate::scenario::{AssetClass, AssetReturns, ScenarioParameters, ValidatedScenario};

/// Whether the scenario's returns are real or nominal
///
/// With real returns, income and expenses stay flat in today's money. With
/// nominal returns they grow with inflation: (1 + inflation)^year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnBasis {
    #[default]
    Real,
    Nominal,
}

/// Configuration for a projection run
#[derive(Debug, Clone, Default)]
pub struct ProjectionConfig {
    pub return_basis: ReturnBasis,
}

/// Returns applied year by year
#[derive(Debug, Clone, Copy)]
pub enum ReturnPath<'a> {
    /// Same returns every year
    Fixed(AssetReturns),
    /// One entry per projection year; must cover the whole projection
    PerYear(&'a [AssetReturns]),
}

impl ReturnPath<'_> {
    fn for_year(&self, year: u32) -> AssetReturns {
        match self {
            ReturnPath::Fixed(r) => *r,
            ReturnPath::PerYear(path) => path[year as usize],
        }
    }

    fn check_covers(&self, years: u32) -> Result<()> {
        if let ReturnPath::PerYear(path) = self {
            if path.len() < years as usize {
                return Err(EngineError::ReturnPathTooShort {
                    required: years as usize,
                    provided: path.len(),
                });
            }
        }
        Ok(())
    }
}

/// Compound a market shock's recovery uplift onto years 1..=recovery_years.
///
/// Every return path goes through this, expected or sampled, so a shocked
/// scenario reverts the same way on both.
pub fn apply_recovery_uplift(params: &ScenarioParameters, path: &mut [AssetReturns]) {
    if let Some((years, uplift)) = params.market_shock.and_then(|s| s.recovery_uplift()) {
        for r in path.iter_mut().skip(1).take(years as usize) {
            *r = r.with_uplift(uplift);
        }
    }
}

/// Mean returns for every projection year, with any recovery uplift applied
pub fn expected_return_path(params: &ScenarioParameters) -> Vec<AssetReturns> {
    let mut path = vec![params.mean_returns(); params.projection_years as usize];
    apply_recovery_uplift(params, &mut path);
    path
}

/// Main projection engine
#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project along the expected-return path
    pub fn project_expected(&self, scenario: &ValidatedScenario) -> Result<ProjectionResult> {
        let path = expected_return_path(scenario.params());
        self.project(scenario, &ReturnPath::PerYear(&path))
    }

    /// Run the year-by-year projection for one return path
    pub fn project(
        &self,
        scenario: &ValidatedScenario,
        returns: &ReturnPath<'_>,
    ) -> Result<ProjectionResult> {
        let params = scenario.params();
        let years = params.projection_years;
        returns.check_covers(years)?;

        let horizon = years.min(params.years_to_life_expectancy());
        let mut result = ProjectionResult::new(horizon);
        let mut state = ProjectionState::from_scenario(scenario);

        for year in 0..years {
            let row = self.calculate_year(scenario, &mut state, returns.for_year(year))?;
            state.advance_year(row.closing_assets);
            result.add_year(row);
        }

        result.depletion_year = state.depletion_year;
        Ok(result)
    }

    /// Calculate a single year and update the holdings in `state`
    fn calculate_year(
        &self,
        scenario: &ValidatedScenario,
        state: &mut ProjectionState,
        returns: AssetReturns,
    ) -> Result<YearProjection> {
        let params = scenario.params();
        let allocation = scenario.allocation();
        let year = state.year;
        let age = state.age;

        // Opening assets; the market shock hits once, before any growth
        let mut opening = state.total_assets;
        let mut shock_loss = 0.0;
        if year == 0 {
            if let Some(shock) = &params.market_shock {
                shock_loss = opening * shock.decline_fraction();
                opening -= shock_loss;
            }
        }

        let growth_factor = match self.config.return_basis {
            ReturnBasis::Real => 1.0,
            ReturnBasis::Nominal => (1.0 + params.inflation_rate).powi(year as i32),
        };

        // Income and expenses
        let retired = age >= params.retirement_age;
        let employment_income = if retired {
            0.0
        } else {
            params.current_income * growth_factor
        };
        let state_pension_income = if age >= params.state_pension_age {
            params.state_pension_amount * growth_factor
        } else {
            0.0
        };
        let income = employment_income + state_pension_income;
        let expenses = params.current_expenses * growth_factor;
        let net_cashflow = income - expenses;

        // Growth on holdings rebalanced to target
        let blended_return = allocation.blended_return(&returns);
        state.rebalance(opening, allocation.as_array());
        for class in AssetClass::ALL {
            state.holdings[class.index()] *= 1.0 + returns.get(class);
        }
        let investment_growth = opening * blended_return;

        let raw_closing = opening * (1.0 + blended_return) + net_cashflow;
        if !raw_closing.is_finite() {
            return Err(EngineError::NumericOverflow {
                year,
                context: format!(
                    "closing assets not finite (opening {}, return {}, net {})",
                    opening, blended_return, net_cashflow
                ),
            });
        }

        let withdrawal = (-net_cashflow).max(0.0);
        if net_cashflow >= 0.0 {
            state.deposit(net_cashflow);
        } else {
            state.withdraw(withdrawal);
        }

        let year_depleted = raw_closing < 0.0 || (raw_closing == 0.0 && net_cashflow < 0.0);
        let shortfall = (-raw_closing).max(0.0);
        let closing_assets = raw_closing.max(0.0);
        if year_depleted {
            state.mark_depleted();
        }

        let withdrawal_rate = (opening > 0.0).then(|| withdrawal / opening);

        let remaining_years = params.life_expectancy as i64 - age as i64;
        let sustainability_ratio = (expenses > 0.0 && remaining_years > 0)
            .then(|| closing_assets / (expenses * remaining_years as f64));

        Ok(YearProjection {
            year,
            age,
            retired,
            opening_assets: opening,
            shock_loss,
            blended_return,
            investment_growth,
            employment_income,
            state_pension_income,
            income,
            expenses,
            net_cashflow,
            withdrawal,
            shortfall,
            closing_assets,
            closing_equity: state.holdings[AssetClass::Equity.index()],
            closing_bond: state.holdings[AssetClass::Bond.index()],
            closing_cash: state.holdings[AssetClass::Cash.index()],
            closing_alternative: state.holdings[AssetClass::Alternative.index()],
            withdrawal_rate,
            sustainability_ratio,
            depleted: state.depleted,
        })
    }
}
