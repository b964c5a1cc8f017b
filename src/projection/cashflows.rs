//! Year-by-year projection output structures

use serde::{Deserialize, Serialize};

/// A single projected year
///
/// Flat so a path can be written straight to CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    // Timing
    pub year: u32,
    pub age: u32,
    pub retired: bool,

    // Assets
    pub opening_assets: f64,
    /// Year-0 market shock haircut already removed from `opening_assets`
    pub shock_loss: f64,
    pub blended_return: f64,
    pub investment_growth: f64,

    // Cashflows
    pub employment_income: f64,
    pub state_pension_income: f64,
    pub income: f64,
    pub expenses: f64,
    pub net_cashflow: f64,
    pub withdrawal: f64,
    /// Withdrawal that could not be funded (assets exhausted)
    pub shortfall: f64,

    pub closing_assets: f64,
    pub closing_equity: f64,
    pub closing_bond: f64,
    pub closing_cash: f64,
    pub closing_alternative: f64,

    // Ratios; None where the ratio is undefined
    pub withdrawal_rate: Option<f64>,
    pub sustainability_ratio: Option<f64>,

    pub depleted: bool,
}

/// Complete projection for one return path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub years: Vec<YearProjection>,

    /// First year in which withdrawals could not be met
    pub depletion_year: Option<u32>,

    /// Years until life expectancy, capped at the projection length
    pub horizon_years: u32,
}

impl ProjectionResult {
    pub fn new(horizon_years: u32) -> Self {
        Self {
            years: Vec::new(),
            depletion_year: None,
            horizon_years,
        }
    }

    pub fn add_year(&mut self, row: YearProjection) {
        self.years.push(row);
    }

    /// Closing assets in the last projected year
    pub fn final_assets(&self) -> f64 {
        self.years.last().map(|r| r.closing_assets).unwrap_or(0.0)
    }

    /// Closing assets in the year the client reaches life expectancy
    pub fn assets_at_horizon(&self) -> f64 {
        let idx = (self.horizon_years as usize).min(self.years.len());
        idx.checked_sub(1)
            .and_then(|i| self.years.get(i))
            .map(|r| r.closing_assets)
            .unwrap_or(0.0)
    }

    /// Depletion year if it falls before life expectancy
    pub fn early_depletion_year(&self) -> Option<u32> {
        self.depletion_year.filter(|&y| y < self.horizon_years)
    }

    /// Assets last until life expectancy
    pub fn survived(&self) -> bool {
        self.early_depletion_year().is_none() && self.assets_at_horizon() > 0.0
    }

    /// 1.0 when there is no early depletion, otherwise the fraction of the
    /// horizon elapsed before depletion (earlier = closer to 0)
    pub fn depletion_timing(&self) -> f64 {
        match self.early_depletion_year() {
            Some(y) if self.horizon_years > 0 => y as f64 / self.horizon_years as f64,
            _ => 1.0,
        }
    }

    pub fn closing_path(&self) -> Vec<f64> {
        self.years.iter().map(|r| r.closing_assets).collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let total_income: f64 = self.years.iter().map(|r| r.income).sum();
        let total_expenses: f64 = self.years.iter().map(|r| r.expenses).sum();
        let total_withdrawals: f64 = self.years.iter().map(|r| r.withdrawal).sum();
        let total_shortfall: f64 = self.years.iter().map(|r| r.shortfall).sum();

        let (peak_year, peak_assets) = self
            .years
            .iter()
            .map(|r| (r.year, r.closing_assets))
            .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        let assets_at_retirement = self
            .years
            .iter()
            .find(|r| r.retired)
            .map(|r| r.opening_assets);

        ProjectionSummary {
            total_years: self.years.len() as u32,
            total_income,
            total_expenses,
            total_withdrawals,
            total_shortfall,
            peak_assets,
            peak_year,
            assets_at_retirement,
            final_assets: self.final_assets(),
            depletion_year: self.depletion_year,
            survived: self.survived(),
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_years: u32,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_withdrawals: f64,
    pub total_shortfall: f64,
    pub peak_assets: f64,
    pub peak_year: u32,
    pub assets_at_retirement: Option<f64>,
    pub final_assets: f64,
    pub depletion_year: Option<u32>,
    pub survived: bool,
}
