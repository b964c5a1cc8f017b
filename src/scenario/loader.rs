//! Load client scenarios from JSON or CSV
//!
//! CSV files carry one client per row with a `client_id` column followed by
//! the `ScenarioParameters` fields. Optional columns may be left empty.

use csv::Reader;
use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::path::Path;

use super::params::{MarketShock, ScenarioParameters};

/// A scenario tagged with the caller's identifier
#[derive(Debug, Clone)]
pub struct ScenarioRecord {
    pub client_id: String,
    pub params: ScenarioParameters,
}

/// Raw CSV row; flat so the csv crate can deserialize it directly
#[derive(Debug, Deserialize)]
struct CsvRow {
    client_id: String,
    client_age: u32,
    retirement_age: u32,
    life_expectancy: u32,
    projection_years: u32,
    current_income: f64,
    current_expenses: f64,
    current_savings: f64,
    pension_value: f64,
    investment_value: f64,
    inflation_rate: f64,
    real_equity_return: f64,
    real_bond_return: f64,
    real_cash_return: f64,
    #[serde(default)]
    real_alternative_return: Option<f64>,
    #[serde(default)]
    equity_allocation: Option<f64>,
    #[serde(default)]
    bond_allocation: Option<f64>,
    #[serde(default)]
    cash_allocation: Option<f64>,
    #[serde(default)]
    alternative_allocation: Option<f64>,
    state_pension_age: u32,
    state_pension_amount: f64,
    risk_score: u8,
    #[serde(default)]
    market_decline_percent: Option<f64>,
    #[serde(default)]
    market_recovery_years: Option<u32>,
}

impl CsvRow {
    fn into_record(self) -> ScenarioRecord {
        let market_shock = self.market_decline_percent.map(|decline_percent| MarketShock {
            decline_percent,
            recovery_years: self.market_recovery_years,
        });

        ScenarioRecord {
            client_id: self.client_id,
            params: ScenarioParameters {
                client_age: self.client_age,
                retirement_age: self.retirement_age,
                life_expectancy: self.life_expectancy,
                projection_years: self.projection_years,
                current_income: self.current_income,
                current_expenses: self.current_expenses,
                current_savings: self.current_savings,
                pension_value: self.pension_value,
                investment_value: self.investment_value,
                inflation_rate: self.inflation_rate,
                real_equity_return: self.real_equity_return,
                real_bond_return: self.real_bond_return,
                real_cash_return: self.real_cash_return,
                real_alternative_return: self.real_alternative_return,
                equity_allocation: self.equity_allocation,
                bond_allocation: self.bond_allocation,
                cash_allocation: self.cash_allocation,
                alternative_allocation: self.alternative_allocation,
                state_pension_age: self.state_pension_age,
                state_pension_amount: self.state_pension_amount,
                risk_score: self.risk_score,
                market_shock,
            },
        }
    }
}

/// Load scenarios from any CSV reader
pub fn read_scenarios_csv<R: std::io::Read>(reader: R) -> Result<Vec<ScenarioRecord>, Box<dyn Error>> {
    let mut reader = Reader::from_reader(reader);
    let mut records = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(|e| format!("scenario row {}: {}", line + 1, e))?;
        records.push(row.into_record());
    }

    Ok(records)
}

/// Load scenarios from a CSV file
pub fn load_scenarios_csv(path: &Path) -> Result<Vec<ScenarioRecord>, Box<dyn Error>> {
    let file = File::open(path)?;
    read_scenarios_csv(file)
}

/// Load a single scenario from a JSON file
pub fn load_scenario_json(path: &Path) -> Result<ScenarioParameters, Box<dyn Error>> {
    let file = File::open(path)?;
    let params = serde_json::from_reader(file)?;
    Ok(params)
}
