//! CSV-based assumption loader
//!
//! Loads capital-market and scoring assumptions from CSV files in data/assumptions/

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::path::Path;

use crate::scenario::AssetClass;

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

/// Load annual volatilities from CSV (asset_class,volatility)
/// Returns volatilities in `AssetClass::ALL` order; every class must be present
pub fn load_volatilities(path: &Path) -> Result<[f64; 4], Box<dyn Error>> {
    let file = File::open(path.join("volatility.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut vols = [None; 4];

    for result in reader.records() {
        let record = result?;
        let class = AssetClass::from_name(&record[0])
            .ok_or_else(|| format!("Unknown asset class: {}", &record[0]))?;
        let vol: f64 = record[1].trim().parse()?;
        vols[class.index()] = Some(vol);
    }

    let mut out = [0.0; 4];
    for class in AssetClass::ALL {
        out[class.index()] = vols[class.index()]
            .ok_or_else(|| format!("Missing volatility for {}", class.name()))?;
    }

    Ok(out)
}

/// Load the correlation matrix from CSV
/// Header: asset_class,equity,bond,cash,alternative; one row per class
pub fn load_correlations(path: &Path) -> Result<[[f64; 4]; 4], Box<dyn Error>> {
    let file = File::open(path.join("correlations.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    let mut columns = [0usize; 4];
    for class in AssetClass::ALL {
        columns[class.index()] = headers
            .iter()
            .position(|h| AssetClass::from_name(h) == Some(class))
            .ok_or_else(|| format!("Missing correlation column for {}", class.name()))?;
    }

    let mut rows = [None; 4];

    for result in reader.records() {
        let record = result?;
        let class = AssetClass::from_name(&record[0])
            .ok_or_else(|| format!("Unknown asset class: {}", &record[0]))?;

        let mut row = [0.0; 4];
        for (j, &col) in columns.iter().enumerate() {
            row[j] = record[col].trim().parse()?;
        }
        rows[class.index()] = Some(row);
    }

    let mut matrix = [[0.0; 4]; 4];
    for class in AssetClass::ALL {
        matrix[class.index()] = rows[class.index()]
            .ok_or_else(|| format!("Missing correlation row for {}", class.name()))?;
    }

    Ok(matrix)
}

/// Load resilience score weights from CSV (component,weight)
/// Returns HashMap<component, weight>
pub fn load_resilience_weights(path: &Path) -> Result<HashMap<String, f64>, Box<dyn Error>> {
    let file = File::open(path.join("resilience_weights.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut weights = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let component = record[0].trim().to_string();
        let weight: f64 = record[1].trim().parse()?;
        weights.insert(component, weight);
    }

    Ok(weights)
}

/// All assumption tables read from a directory
pub struct LoadedAssumptions {
    pub volatilities: [f64; 4],
    pub correlations: [[f64; 4]; 4],
    pub resilience_weights: HashMap<String, f64>,
}

impl LoadedAssumptions {
    /// Load all assumptions from the default path
    pub fn load_default() -> Result<Self, Box<dyn Error>> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load all assumptions from a specific path
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            volatilities: load_volatilities(path)?,
            correlations: load_correlations(path)?,
            resilience_weights: load_resilience_weights(path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::returns::{DEFAULT_CORRELATIONS, DEFAULT_VOLATILITIES};

    #[test]
    fn test_load_default_assumptions() {
        let result = LoadedAssumptions::load_default();
        assert!(result.is_ok(), "Failed to load assumptions: {:?}", result.err());

        let assumptions = result.unwrap();

        // Shipped tables match the in-memory defaults
        assert_eq!(assumptions.volatilities, DEFAULT_VOLATILITIES);
        assert_eq!(assumptions.correlations, DEFAULT_CORRELATIONS);

        assert_eq!(assumptions.resilience_weights.get("survival"), Some(&0.60));
        assert_eq!(assumptions.resilience_weights.len(), 3);
    }

    #[test]
    fn test_missing_directory_errors() {
        let result = LoadedAssumptions::load_from(Path::new("data/does-not-exist"));
        assert!(result.is_err());
    }
}
