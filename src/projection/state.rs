//! Running state carried from one projection year to the next

use crate::scenario::{AssetClass, ValidatedScenario};

/// State of the client's portfolio at a year boundary
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Year about to be projected (0-indexed)
    pub year: u32,

    /// Client age at the start of `year`
    pub age: u32,

    /// Total assets carried into `year` (prior year's closing assets)
    pub total_assets: f64,

    /// Holdings by asset class, in `AssetClass::ALL` order
    pub holdings: [f64; 4],

    /// Set once assets are exhausted; never cleared
    pub depleted: bool,

    /// First year in which withdrawals could not be met
    pub depletion_year: Option<u32>,
}

impl ProjectionState {
    /// Initial state: starting wealth split by the target allocation
    pub fn from_scenario(scenario: &ValidatedScenario) -> Self {
        let params = scenario.params();
        let total = params.starting_assets();
        let weights = scenario.allocation().as_array();

        Self {
            year: 0,
            age: params.client_age,
            total_assets: total,
            holdings: weights.map(|w| total * w),
            depleted: false,
            depletion_year: None,
        }
    }

    /// Rebalance `opening` to the target weights
    pub fn rebalance(&mut self, opening: f64, weights: [f64; 4]) {
        self.holdings = weights.map(|w| opening * w);
    }

    /// Add a surplus to the cash bucket
    pub fn deposit(&mut self, amount: f64) {
        self.holdings[AssetClass::Cash.index()] += amount;
    }

    /// Sell holdings in withdrawal order (cash, bonds, equities, alternatives).
    /// Returns the part of `amount` that could not be funded.
    pub fn withdraw(&mut self, amount: f64) -> f64 {
        let mut remaining = amount;
        for class in AssetClass::WITHDRAWAL_ORDER {
            if remaining <= 0.0 {
                break;
            }
            let slot = &mut self.holdings[class.index()];
            let available = slot.max(0.0);
            let taken = available.min(remaining);
            *slot = available - taken;
            remaining -= taken;
        }
        remaining.max(0.0)
    }

    /// Mark the path depleted; records the first depletion year only
    pub fn mark_depleted(&mut self) {
        self.holdings = [0.0; 4];
        self.depleted = true;
        if self.depletion_year.is_none() {
            self.depletion_year = Some(self.year);
        }
    }

    /// Move to the next year with the given closing assets
    pub fn advance_year(&mut self, closing_assets: f64) {
        self.total_assets = closing_assets;
        self.year += 1;
        self.age += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{validate, ScenarioParameters};
    use approx::assert_relative_eq;

    fn state() -> ProjectionState {
        ProjectionState::from_scenario(&validate(&ScenarioParameters::example()).unwrap())
    }

    #[test]
    fn test_initial_split() {
        let s = state();
        assert_relative_eq!(s.holdings[AssetClass::Equity.index()], 60_000.0);
        assert_relative_eq!(s.holdings[AssetClass::Bond.index()], 30_000.0);
        assert_relative_eq!(s.holdings[AssetClass::Cash.index()], 10_000.0);
        assert_eq!(s.age, 45);
    }

    #[test]
    fn test_withdraw_drains_cash_then_bonds_then_equities() {
        let mut s = state();

        let unmet = s.withdraw(25_000.0);
        assert_eq!(unmet, 0.0);
        assert_relative_eq!(s.holdings[AssetClass::Cash.index()], 0.0);
        assert_relative_eq!(s.holdings[AssetClass::Bond.index()], 15_000.0);
        assert_relative_eq!(s.holdings[AssetClass::Equity.index()], 60_000.0);

        let unmet = s.withdraw(20_000.0);
        assert_eq!(unmet, 0.0);
        assert_relative_eq!(s.holdings[AssetClass::Bond.index()], 0.0);
        assert_relative_eq!(s.holdings[AssetClass::Equity.index()], 55_000.0);
    }

    #[test]
    fn test_withdraw_reports_unmet_amount() {
        let mut s = state();
        let unmet = s.withdraw(130_000.0);
        assert_relative_eq!(unmet, 30_000.0);
        assert!(s.holdings.iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_depletion_year_is_first_only() {
        let mut s = state();
        s.year = 7;
        s.mark_depleted();
        s.year = 9;
        s.mark_depleted();
        assert_eq!(s.depletion_year, Some(7));
        assert!(s.depleted);
    }
}
