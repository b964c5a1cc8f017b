//! Scenario validation and normalization
//!
//! Every rule is checked so the caller gets the complete list of problems in
//! one `InvalidScenario` error. Rates outside the plausible band are kept but
//! flagged as warnings: advisers model extreme scenarios on purpose.

use log::warn;
use serde::{Deserialize, Serialize};

use super::assets::{AssetAllocation, AssetReturns};
use super::params::ScenarioParameters;
use crate::error::{EngineError, Result, Violation};

/// Allocations may miss 100% by this much and still be rescaled
pub const ALLOCATION_TOLERANCE: f64 = 0.5;

/// Longest supported projection horizon in years
pub const MAX_PROJECTION_YEARS: u32 = 100;

/// Plausible band for annual rates; outside it a warning is raised
pub const RATE_WARNING_BAND: (f64, f64) = (-0.20, 0.20);

/// Model portfolios by risk score (equity, bond, cash, alternative), percent
const RISK_PROFILE_ALLOCATIONS: [[f64; 4]; 10] = [
    [10.0, 50.0, 40.0, 0.0],
    [20.0, 50.0, 30.0, 0.0],
    [30.0, 45.0, 25.0, 0.0],
    [40.0, 40.0, 20.0, 0.0],
    [50.0, 35.0, 15.0, 0.0],
    [60.0, 30.0, 10.0, 0.0],
    [65.0, 25.0, 5.0, 5.0],
    [70.0, 20.0, 5.0, 5.0],
    [75.0, 10.0, 5.0, 10.0],
    [80.0, 5.0, 5.0, 10.0],
];

/// Default allocation percentages for a risk score (clamped to 1..=10)
pub fn allocation_for_risk_score(risk_score: u8) -> [f64; 4] {
    let idx = (risk_score.clamp(1, 10) - 1) as usize;
    RISK_PROFILE_ALLOCATIONS[idx]
}

/// Non-fatal finding on an otherwise valid scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

/// A scenario that passed validation, with allocations resolved to exactly 100%
///
/// Only the validator constructs this type, so everything downstream can rely
/// on the invariants without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedScenario {
    params: ScenarioParameters,
    allocation: AssetAllocation,
    warnings: Vec<ValidationWarning>,
}

impl ValidatedScenario {
    pub fn params(&self) -> &ScenarioParameters {
        &self.params
    }

    /// Target allocation as fractions
    pub fn allocation(&self) -> AssetAllocation {
        self.allocation
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn mean_returns(&self) -> AssetReturns {
        self.params.mean_returns()
    }

    pub fn into_params(self) -> ScenarioParameters {
        self.params
    }
}

/// Validate and normalize a raw scenario
pub fn validate(raw: &ScenarioParameters) -> Result<ValidatedScenario> {
    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    check_ages(raw, &mut violations);
    check_money(raw, &mut violations);
    check_rates(raw, &mut violations, &mut warnings);

    if !(1..=10).contains(&raw.risk_score) {
        violations.push(Violation::new("risk_score", "must be between 1 and 10"));
    }

    if let Some(shock) = &raw.market_shock {
        if !shock.decline_percent.is_finite() || !(0.0..100.0).contains(&shock.decline_percent) {
            violations.push(Violation::new(
                "market_shock.decline_percent",
                format!("must be in [0, 100), got {}", shock.decline_percent),
            ));
        }
        if shock.recovery_years == Some(0) {
            violations.push(Violation::new(
                "market_shock.recovery_years",
                "must be at least 1 when set",
            ));
        }
    }

    let allocation = resolve_allocation(raw, &mut violations);

    if !violations.is_empty() {
        return Err(EngineError::InvalidScenario { violations });
    }

    let percentages = allocation.unwrap_or([0.0; 4]);
    let mut params = raw.clone();
    params.equity_allocation = Some(percentages[0]);
    params.bond_allocation = Some(percentages[1]);
    params.cash_allocation = Some(percentages[2]);
    params.alternative_allocation = Some(percentages[3]);

    for w in &warnings {
        warn!("scenario warning on {}: {}", w.field, w.message);
    }

    Ok(ValidatedScenario {
        params,
        allocation: AssetAllocation::from_percentages(
            percentages[0],
            percentages[1],
            percentages[2],
            percentages[3],
        ),
        warnings,
    })
}

fn check_ages(raw: &ScenarioParameters, violations: &mut Vec<Violation>) {
    if raw.client_age >= raw.retirement_age {
        violations.push(Violation::new(
            "retirement_age",
            format!(
                "must be greater than client_age ({} >= {})",
                raw.client_age, raw.retirement_age
            ),
        ));
    }
    if raw.retirement_age > raw.life_expectancy {
        violations.push(Violation::new(
            "life_expectancy",
            format!(
                "must be at least retirement_age ({} < {})",
                raw.life_expectancy, raw.retirement_age
            ),
        ));
    }
    if raw.projection_years < 1 || raw.projection_years > MAX_PROJECTION_YEARS {
        violations.push(Violation::new(
            "projection_years",
            format!(
                "must be between 1 and {}, got {}",
                MAX_PROJECTION_YEARS, raw.projection_years
            ),
        ));
    }
}

fn check_money(raw: &ScenarioParameters, violations: &mut Vec<Violation>) {
    let fields = [
        ("current_income", raw.current_income),
        ("current_expenses", raw.current_expenses),
        ("current_savings", raw.current_savings),
        ("pension_value", raw.pension_value),
        ("investment_value", raw.investment_value),
        ("state_pension_amount", raw.state_pension_amount),
    ];

    for (field, value) in fields {
        if !value.is_finite() {
            violations.push(Violation::new(field, "must be a finite number"));
        } else if value < 0.0 {
            violations.push(Violation::new(field, format!("must not be negative, got {}", value)));
        }
    }
}

fn check_rates(
    raw: &ScenarioParameters,
    violations: &mut Vec<Violation>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut fields = vec![
        ("inflation_rate", raw.inflation_rate),
        ("real_equity_return", raw.real_equity_return),
        ("real_bond_return", raw.real_bond_return),
        ("real_cash_return", raw.real_cash_return),
    ];
    if let Some(alt) = raw.real_alternative_return {
        fields.push(("real_alternative_return", alt));
    }

    let (low, high) = RATE_WARNING_BAND;
    for (field, value) in fields {
        if !value.is_finite() {
            violations.push(Violation::new(field, "must be a finite number"));
        } else if value <= -1.0 {
            // A rate of -100% or worse wipes out the balance it compounds
            violations.push(Violation::new(field, format!("must be above -100%, got {}", value)));
        } else if value < low || value > high {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!(
                    "{:.1}% per annum is outside the plausible range [{:.0}%, {:.0}%]",
                    value * 100.0,
                    low * 100.0,
                    high * 100.0
                ),
            });
        }
    }
}

/// Resolve allocation percentages, rescaling to exactly 100 within tolerance
fn resolve_allocation(
    raw: &ScenarioParameters,
    violations: &mut Vec<Violation>,
) -> Option<[f64; 4]> {
    if !raw.has_explicit_allocation() {
        return Some(allocation_for_risk_score(raw.risk_score));
    }

    let values = [
        ("equity_allocation", raw.equity_allocation.unwrap_or(0.0)),
        ("bond_allocation", raw.bond_allocation.unwrap_or(0.0)),
        ("cash_allocation", raw.cash_allocation.unwrap_or(0.0)),
        ("alternative_allocation", raw.alternative_allocation.unwrap_or(0.0)),
    ];

    let mut in_range = true;
    for (field, value) in values {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            violations.push(Violation::new(field, format!("must be in [0, 100], got {}", value)));
            in_range = false;
        }
    }
    if !in_range {
        return None;
    }

    let total: f64 = values.iter().map(|(_, v)| v).sum();
    if (total - 100.0).abs() > ALLOCATION_TOLERANCE {
        violations.push(Violation::new(
            "allocation",
            format!("allocations must sum to 100 (±{}), got {}", ALLOCATION_TOLERANCE, total),
        ));
        return None;
    }

    let scale = 100.0 / total;
    Some(values.map(|(_, v)| v * scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::MarketShock;
    use approx::assert_relative_eq;

    #[test]
    fn test_example_is_valid() {
        let scenario = validate(&ScenarioParameters::example()).unwrap();
        assert!(scenario.warnings().is_empty());
        assert_relative_eq!(scenario.allocation().equity, 0.6);
        assert_relative_eq!(scenario.allocation().cash, 0.1);
    }

    #[test]
    fn test_collects_every_violation() {
        let mut params = ScenarioParameters::example();
        params.client_age = 70;
        params.projection_years = 0;
        params.current_expenses = -1.0;
        params.risk_score = 11;

        let err = validate(&params).unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();

        assert!(fields.contains(&"retirement_age"));
        assert!(fields.contains(&"projection_years"));
        assert!(fields.contains(&"current_expenses"));
        assert!(fields.contains(&"risk_score"));
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn test_retirement_at_life_expectancy_allowed() {
        let mut params = ScenarioParameters::example();
        params.retirement_age = 90;
        assert!(validate(&params).is_ok());

        params.life_expectancy = 89;
        assert!(validate(&params).is_err());
    }

    #[test]
    fn test_allocation_rescaled_within_tolerance() {
        let mut params = ScenarioParameters::example();
        params.equity_allocation = Some(60.2);
        params.bond_allocation = Some(30.1);
        params.cash_allocation = Some(10.0);

        let scenario = validate(&params).unwrap();
        let alloc = scenario.allocation();
        assert_relative_eq!(
            alloc.equity + alloc.bond + alloc.cash + alloc.alternative,
            1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            scenario.params().equity_allocation.unwrap(),
            60.2 * 100.0 / 100.3,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_allocation_outside_tolerance_rejected() {
        let mut params = ScenarioParameters::example();
        params.equity_allocation = Some(70.0);

        let err = validate(&params).unwrap_err();
        assert_eq!(err.violations()[0].field, "allocation");
    }

    #[test]
    fn test_allocation_from_risk_score_when_absent() {
        let mut params = ScenarioParameters::example();
        params.equity_allocation = None;
        params.bond_allocation = None;
        params.cash_allocation = None;
        params.alternative_allocation = None;
        params.risk_score = 9;

        let scenario = validate(&params).unwrap();
        assert_relative_eq!(scenario.allocation().equity, 0.75);
        assert_relative_eq!(scenario.allocation().alternative, 0.10);
        assert_eq!(scenario.params().equity_allocation, Some(75.0));
    }

    #[test]
    fn test_risk_profiles_sum_to_100() {
        for score in 1..=10u8 {
            let total: f64 = allocation_for_risk_score(score).iter().sum();
            assert_relative_eq!(total, 100.0);
        }
    }

    #[test]
    fn test_extreme_rate_is_warning_not_error() {
        let mut params = ScenarioParameters::example();
        params.real_equity_return = 0.35;

        let scenario = validate(&params).unwrap();
        assert_eq!(scenario.warnings().len(), 1);
        assert_eq!(scenario.warnings()[0].field, "real_equity_return");
    }

    #[test]
    fn test_rate_at_or_below_total_loss_rejected() {
        let mut params = ScenarioParameters::example();
        params.real_bond_return = -1.0;
        params.real_alternative_return = Some(-1.5);

        let err = validate(&params).unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["real_bond_return", "real_alternative_return"]);

        // Just above the floor is only a warning
        params.real_bond_return = -0.99;
        params.real_alternative_return = None;
        let scenario = validate(&params).unwrap();
        assert_eq!(scenario.warnings().len(), 1);
        assert_eq!(scenario.warnings()[0].field, "real_bond_return");
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut params = ScenarioParameters::example();
        params.current_income = f64::NAN;
        params.inflation_rate = f64::INFINITY;

        let err = validate(&params).unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_market_shock_bounds() {
        let mut params = ScenarioParameters::example();
        params.market_shock = Some(MarketShock { decline_percent: 100.0, recovery_years: Some(0) });

        let err = validate(&params).unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }
}
