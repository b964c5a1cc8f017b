//! Asset classes, target allocations and per-class annual returns

use serde::{Deserialize, Serialize};

/// The four modelled asset classes, in withdrawal-priority order reversed:
/// withdrawals draw cash first, then bonds, then equities, then alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Bond,
    Cash,
    Alternative,
}

impl AssetClass {
    /// Canonical ordering used for vectors, matrices and CSV columns
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Equity,
        AssetClass::Bond,
        AssetClass::Cash,
        AssetClass::Alternative,
    ];

    /// Order in which holdings are sold to fund a withdrawal
    pub const WITHDRAWAL_ORDER: [AssetClass; 4] = [
        AssetClass::Cash,
        AssetClass::Bond,
        AssetClass::Equity,
        AssetClass::Alternative,
    ];

    pub fn index(self) -> usize {
        match self {
            AssetClass::Equity => 0,
            AssetClass::Bond => 1,
            AssetClass::Cash => 2,
            AssetClass::Alternative => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Bond => "bond",
            AssetClass::Cash => "cash",
            AssetClass::Alternative => "alternative",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "equity" | "equities" => Some(AssetClass::Equity),
            "bond" | "bonds" => Some(AssetClass::Bond),
            "cash" => Some(AssetClass::Cash),
            "alternative" | "alternatives" => Some(AssetClass::Alternative),
            _ => None,
        }
    }
}

/// Target allocation as fractions summing to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub equity: f64,
    pub bond: f64,
    pub cash: f64,
    pub alternative: f64,
}

impl AssetAllocation {
    /// Build from percentages (e.g. 60/30/10/0)
    pub fn from_percentages(equity: f64, bond: f64, cash: f64, alternative: f64) -> Self {
        Self {
            equity: equity / 100.0,
            bond: bond / 100.0,
            cash: cash / 100.0,
            alternative: alternative / 100.0,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.equity, self.bond, self.cash, self.alternative]
    }

    pub fn weight(&self, class: AssetClass) -> f64 {
        self.as_array()[class.index()]
    }

    /// Weighted-average return for the year
    pub fn blended_return(&self, returns: &AssetReturns) -> f64 {
        self.equity * returns.equity
            + self.bond * returns.bond
            + self.cash * returns.cash
            + self.alternative * returns.alternative
    }
}

/// One year's return for each asset class (decimal, e.g. 0.05)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetReturns {
    pub equity: f64,
    pub bond: f64,
    pub cash: f64,
    pub alternative: f64,
}

impl AssetReturns {
    pub fn new(equity: f64, bond: f64, cash: f64, alternative: f64) -> Self {
        Self { equity, bond, cash, alternative }
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.equity, self.bond, self.cash, self.alternative]
    }

    pub fn get(&self, class: AssetClass) -> f64 {
        self.as_array()[class.index()]
    }

    /// Compound an extra uplift on top of every class: (1 + r)(1 + u) - 1
    pub fn with_uplift(&self, uplift: f64) -> Self {
        let arr = self.as_array().map(|r| (1.0 + r) * (1.0 + uplift) - 1.0);
        Self::from_array(arr)
    }

    pub fn min(&self) -> f64 {
        self.as_array().into_iter().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.as_array().into_iter().fold(f64::NEG_INFINITY, f64::max)
    }
}
