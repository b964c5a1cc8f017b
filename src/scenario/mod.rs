//! Client scenario inputs, validation and loading

mod assets;
mod params;
pub mod validator;
pub mod loader;

pub use assets::{AssetAllocation, AssetClass, AssetReturns};
pub use params::{MarketShock, ScenarioParameters};
pub use validator::{validate, ValidatedScenario, ValidationWarning};
pub use loader::{load_scenario_json, load_scenarios_csv, ScenarioRecord};
