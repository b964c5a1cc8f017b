//! Deterministic year-by-year projection of a client's assets

mod state;
mod engine;
mod cashflows;

pub use state::ProjectionState;
pub use engine::{apply_recovery_uplift, expected_return_path, ProjectionConfig, ProjectionEngine, ReturnBasis, ReturnPath};
pub use cashflows::{ProjectionResult, ProjectionSummary, YearProjection};
