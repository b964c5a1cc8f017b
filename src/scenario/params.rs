//! Scenario input record as resolved by the calling application

use serde::{Deserialize, Serialize};

use super::assets::AssetReturns;

/// One-time market decline applied to opening assets in year 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketShock {
    /// Haircut in percent (30.0 = assets fall by 30%)
    pub decline_percent: f64,

    /// Years over which returns carry a recovery uplift, on the expected path
    /// and on every sampled trial. None = the loss is permanent.
    #[serde(default)]
    pub recovery_years: Option<u32>,
}

impl MarketShock {
    pub fn decline_fraction(&self) -> f64 {
        self.decline_percent / 100.0
    }

    /// Annual uplift that restores the lost level over the recovery window:
    /// (1 + u)^n = 1 / (1 - d)
    pub fn recovery_uplift(&self) -> Option<(u32, f64)> {
        let years = self.recovery_years.filter(|&n| n > 0)?;
        let remaining = 1.0 - self.decline_fraction();
        if remaining <= 0.0 {
            return None;
        }
        Some((years, (1.0 / remaining).powf(1.0 / years as f64) - 1.0))
    }
}

/// Fully-resolved client scenario
///
/// Monetary values are annual amounts in the client's currency. Rates are
/// decimals (0.05 = 5%), allocations are percentages (60.0 = 60%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub client_age: u32,
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub projection_years: u32,

    pub current_income: f64,
    pub current_expenses: f64,

    // Starting wealth by bucket
    pub current_savings: f64,
    pub pension_value: f64,
    pub investment_value: f64,

    pub inflation_rate: f64,
    pub real_equity_return: f64,
    pub real_bond_return: f64,
    pub real_cash_return: f64,
    /// Defaults to the equity return when absent
    #[serde(default)]
    pub real_alternative_return: Option<f64>,

    // Allocations in percent; all absent = derive from risk_score
    #[serde(default)]
    pub equity_allocation: Option<f64>,
    #[serde(default)]
    pub bond_allocation: Option<f64>,
    #[serde(default)]
    pub cash_allocation: Option<f64>,
    #[serde(default)]
    pub alternative_allocation: Option<f64>,

    pub state_pension_age: u32,
    pub state_pension_amount: f64,

    /// Attitude to risk, 1 (cautious) to 10 (adventurous)
    pub risk_score: u8,

    #[serde(default)]
    pub market_shock: Option<MarketShock>,
}

impl ScenarioParameters {
    /// Total starting wealth across buckets
    pub fn starting_assets(&self) -> f64 {
        self.current_savings + self.pension_value + self.investment_value
    }

    pub fn alternative_return(&self) -> f64 {
        self.real_alternative_return.unwrap_or(self.real_equity_return)
    }

    /// Assumed mean returns per asset class
    pub fn mean_returns(&self) -> AssetReturns {
        AssetReturns::new(
            self.real_equity_return,
            self.real_bond_return,
            self.real_cash_return,
            self.alternative_return(),
        )
    }

    pub fn has_explicit_allocation(&self) -> bool {
        self.equity_allocation.is_some()
            || self.bond_allocation.is_some()
            || self.cash_allocation.is_some()
            || self.alternative_allocation.is_some()
    }

    /// Years until the client reaches life expectancy (0 if already past it)
    pub fn years_to_life_expectancy(&self) -> u32 {
        self.life_expectancy.saturating_sub(self.client_age)
    }

    /// Example client used by the CLI and tests: 45 years old, retiring at 65,
    /// planning to 90 with a UK full new state pension from 67.
    pub fn example() -> Self {
        Self {
            client_age: 45,
            retirement_age: 65,
            life_expectancy: 90,
            projection_years: 45,
            current_income: 50_000.0,
            current_expenses: 40_000.0,
            current_savings: 100_000.0,
            pension_value: 0.0,
            investment_value: 0.0,
            inflation_rate: 0.025,
            real_equity_return: 0.05,
            real_bond_return: 0.02,
            real_cash_return: 0.005,
            real_alternative_return: None,
            equity_allocation: Some(60.0),
            bond_allocation: Some(30.0),
            cash_allocation: Some(10.0),
            alternative_allocation: Some(0.0),
            state_pension_age: 67,
            state_pension_amount: 11_502.0,
            risk_score: 6,
            market_shock: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_starting_assets_sums_buckets() {
        let mut params = ScenarioParameters::example();
        params.pension_value = 25_000.0;
        params.investment_value = 5_000.0;
        assert_relative_eq!(params.starting_assets(), 130_000.0);
    }

    #[test]
    fn test_alternative_return_defaults_to_equity() {
        let mut params = ScenarioParameters::example();
        assert_relative_eq!(params.alternative_return(), 0.05);

        params.real_alternative_return = Some(0.04);
        assert_relative_eq!(params.mean_returns().alternative, 0.04);
    }

    #[test]
    fn test_recovery_uplift_restores_level() {
        let shock = MarketShock { decline_percent: 30.0, recovery_years: Some(5) };
        let (years, uplift) = shock.recovery_uplift().unwrap();

        assert_eq!(years, 5);
        assert_relative_eq!(0.7 * (1.0 + uplift).powi(5), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_permanent_shock_has_no_uplift() {
        let shock = MarketShock { decline_percent: 30.0, recovery_years: None };
        assert!(shock.recovery_uplift().is_none());
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{
            "client_age": 50, "retirement_age": 60, "life_expectancy": 85,
            "projection_years": 35, "current_income": 40000, "current_expenses": 30000,
            "current_savings": 10000, "pension_value": 150000, "investment_value": 0,
            "inflation_rate": 0.02, "real_equity_return": 0.04, "real_bond_return": 0.01,
            "real_cash_return": 0.0, "state_pension_age": 67, "state_pension_amount": 11000,
            "risk_score": 4
        }"#;

        let params: ScenarioParameters = serde_json::from_str(json).unwrap();
        assert!(!params.has_explicit_allocation());
        assert!(params.market_shock.is_none());
        assert_eq!(params.years_to_life_expectancy(), 35);
    }
}
