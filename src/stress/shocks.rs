//! Parameter shocks and the built-in stress scenarios

use serde::{Deserialize, Serialize};

use super::types::ImpactAnalysis;
use crate::error::{EngineError, Result};
use crate::scenario::validator::MAX_PROJECTION_YEARS;
use crate::scenario::{MarketShock, ScenarioParameters};

/// A single adverse change to a scenario's parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shock {
    /// One-time fall in asset values at the start of the projection
    MarketDecline {
        percent: f64,
        #[serde(default)]
        recovery_years: Option<u32>,
    },
    /// Cut to employment income and state pension
    IncomeReduction { percent: f64 },
    ExpenseIncrease { percent: f64 },
    /// Inflation rises; real bond and cash returns fall by the same amount
    InflationSpike { additional_inflation: f64 },
    /// Client lives longer; horizon extended, capped at 100 years
    LongevityExtension { years: u32 },
}

impl Shock {
    pub fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| {
            Err(EngineError::InvalidShock {
                name: name.to_string(),
                reason,
            })
        };

        match *self {
            Shock::MarketDecline { percent, recovery_years } => {
                if !percent.is_finite() || !(0.0..100.0).contains(&percent) {
                    return invalid(format!("market decline must be in [0, 100), got {}", percent));
                }
                if recovery_years == Some(0) {
                    return invalid("recovery years must be at least 1 when set".to_string());
                }
            }
            Shock::IncomeReduction { percent } => {
                if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                    return invalid(format!("income reduction must be in [0, 100], got {}", percent));
                }
            }
            Shock::ExpenseIncrease { percent } => {
                if !percent.is_finite() || percent < 0.0 {
                    return invalid(format!("expense increase must be non-negative, got {}", percent));
                }
            }
            Shock::InflationSpike { additional_inflation } => {
                if !additional_inflation.is_finite() || additional_inflation.abs() >= 1.0 {
                    return invalid(format!(
                        "additional inflation must be a decimal in (-1, 1), got {}",
                        additional_inflation
                    ));
                }
            }
            Shock::LongevityExtension { years } => {
                if years == 0 {
                    return invalid("longevity extension must be at least 1 year".to_string());
                }
            }
        }
        Ok(())
    }

    /// Apply to a scenario copy; market declines compound with any existing shock
    pub fn apply(&self, params: &mut ScenarioParameters) {
        match *self {
            Shock::MarketDecline { percent, recovery_years } => {
                params.market_shock = Some(match params.market_shock {
                    None => MarketShock {
                        decline_percent: percent,
                        recovery_years,
                    },
                    Some(existing) => {
                        let remaining =
                            (1.0 - existing.decline_fraction()) * (1.0 - percent / 100.0);
                        MarketShock {
                            decline_percent: 100.0 * (1.0 - remaining),
                            // Permanent if either component is permanent
                            recovery_years: existing
                                .recovery_years
                                .zip(recovery_years)
                                .map(|(a, b)| a.max(b)),
                        }
                    }
                });
            }
            Shock::IncomeReduction { percent } => {
                let factor = 1.0 - percent / 100.0;
                params.current_income *= factor;
                params.state_pension_amount *= factor;
            }
            Shock::ExpenseIncrease { percent } => {
                params.current_expenses *= 1.0 + percent / 100.0;
            }
            Shock::InflationSpike { additional_inflation } => {
                params.inflation_rate += additional_inflation;
                params.real_bond_return -= additional_inflation;
                params.real_cash_return -= additional_inflation;
            }
            Shock::LongevityExtension { years } => {
                params.life_expectancy += years;
                params.projection_years = (params.projection_years + years).min(MAX_PROJECTION_YEARS);
            }
        }
    }
}

/// A named set of shocks applied together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub shocks: Vec<Shock>,
}

impl ShockDefinition {
    pub fn new(name: impl Into<String>, shocks: Vec<Shock>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            shocks,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Equity-led crash: assets fall 30%, returns on every path revert over 5 years
    pub fn market_crash() -> Self {
        Self::new(
            "market_crash",
            vec![Shock::MarketDecline { percent: 30.0, recovery_years: Some(5) }],
        )
        .with_description("Portfolio falls 30% immediately, recovering to trend over 5 years")
    }

    pub fn income_loss() -> Self {
        Self::new("income_loss", vec![Shock::IncomeReduction { percent: 25.0 }])
            .with_description("Employment income and state pension fall by 25%")
    }

    pub fn expense_shock() -> Self {
        Self::new("expense_shock", vec![Shock::ExpenseIncrease { percent: 20.0 }])
            .with_description("Annual expenses rise by 20%")
    }

    pub fn inflation_spike() -> Self {
        Self::new(
            "inflation_spike",
            vec![Shock::InflationSpike { additional_inflation: 0.03 }],
        )
        .with_description("Inflation up 3 percentage points, eroding real bond and cash returns")
    }

    pub fn longevity_extension() -> Self {
        Self::new("longevity_extension", vec![Shock::LongevityExtension { years: 5 }])
            .with_description("Client lives 5 years beyond the planned life expectancy")
    }

    /// The five built-in single-factor stresses
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self::market_crash(),
            Self::income_loss(),
            Self::expense_shock(),
            Self::inflation_spike(),
            Self::longevity_extension(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.shocks.is_empty() {
            return Err(EngineError::InvalidShock {
                name: self.name.clone(),
                reason: "definition contains no shocks".to_string(),
            });
        }
        self.shocks.iter().try_for_each(|s| s.validate(&self.name))
    }

    /// Compounded impact of all shocks in percent
    pub fn impact(&self) -> ImpactAnalysis {
        let mut remaining_assets = 1.0;
        let mut remaining_income = 1.0;
        let mut expense_factor = 1.0;

        for shock in &self.shocks {
            match *shock {
                Shock::MarketDecline { percent, .. } => remaining_assets *= 1.0 - percent / 100.0,
                Shock::IncomeReduction { percent } => remaining_income *= 1.0 - percent / 100.0,
                Shock::ExpenseIncrease { percent } => expense_factor *= 1.0 + percent / 100.0,
                Shock::InflationSpike { .. } | Shock::LongevityExtension { .. } => {}
            }
        }

        ImpactAnalysis {
            portfolio_decline_percent: 100.0 * (1.0 - remaining_assets),
            income_reduction_percent: 100.0 * (1.0 - remaining_income),
            expense_increase_percent: 100.0 * (expense_factor - 1.0),
        }
    }
}
