//! Cashflow Engine - Retirement cashflow projection and stress-testing engine
//!
//! This library provides:
//! - Scenario validation and normalization (allocations, risk-score portfolios)
//! - Deterministic year-by-year wealth projections
//! - Correlated multi-asset return sampling and Monte Carlo survival estimates
//! - Stress scenarios (market, income, expense, inflation, longevity shocks)
//! - Resilience scoring of stressed outcomes against the baseline

pub mod error;
pub mod assumptions;
pub mod scenario;
pub mod projection;
pub mod simulation;
pub mod stress;
pub mod runner;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use assumptions::{Assumptions, ReturnModel};
pub use scenario::{validate, ScenarioParameters, ValidatedScenario};
pub use projection::{ProjectionEngine, ProjectionResult, YearProjection};
pub use simulation::{MonteCarloResult, MonteCarloSimulator};
pub use stress::{ShockDefinition, StressTestResult, StressTester};
pub use runner::ScenarioRunner;
