//! Run the standard stress set against a client scenario
//!
//! Usage: stress_test [scenario.json] [--json]
//! Environment: TRIAL_COUNT (default 1000), SEED (default 42)

use anyhow::Result;
use cashflow_engine::scenario::load_scenario_json;
use cashflow_engine::simulation::DEFAULT_TRIALS;
use cashflow_engine::{ScenarioParameters, ScenarioRunner, ShockDefinition, StressTestResult};
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: String,
    trial_count: usize,
    seed: u64,
    baseline_survival_probability: f64,
    baseline_resilience_score: f64,
    results: &'a [StressTestResult],
}

fn main() -> Result<()> {
    env_logger::init();

    let json_output = env::args().any(|arg| arg == "--json");
    let scenario_path = env::args().skip(1).find(|arg| !arg.starts_with("--"));
    let start = Instant::now();

    let trial_count: usize = env::var("TRIAL_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TRIALS);

    let seed: u64 = env::var("SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let params = match &scenario_path {
        Some(path) => load_scenario_json(Path::new(path)).map_err(|e| anyhow::anyhow!("{}", e))?,
        None => ScenarioParameters::example(),
    };

    let runner = ScenarioRunner::new();
    let report = runner.stress_test(&params, &ShockDefinition::standard_set(), trial_count, seed)?;

    if json_output {
        let out = JsonReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            trial_count,
            seed,
            baseline_survival_probability: report.baseline.monte_carlo.survival_probability,
            baseline_resilience_score: report.baseline_assessment.resilience_score,
            results: &report.results,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Stress Test Report - {}", chrono::Local::now().format("%Y-%m-%d %H:%M"));
    println!("{} trials, seed {}\n", trial_count, seed);

    let base = &report.baseline;
    println!("Baseline:");
    println!("  Survival Probability: {:.1}%", base.monte_carlo.survival_probability);
    println!("  Median Final Assets: {:.2}", base.monte_carlo.median_final_assets);
    println!("  Expected-Path Final Assets: {:.2}", base.projection.final_assets());
    println!("  Resilience Score: {:.1}", report.baseline_assessment.resilience_score);
    println!();

    println!("{:<22} {:>9} {:>9} {:>9} {:>10} {:>10} {:>10}",
        "Scenario", "Decline%", "Income%", "Expense%", "Survival%", "Score", "Recovery");
    println!("{}", "-".repeat(86));

    for r in &report.results {
        let recovery = r
            .recovery_time_years
            .map(|y| format!("{} yrs", y))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<22} {:>9.1} {:>9.1} {:>9.1} {:>10.1} {:>10.1} {:>10}",
            r.scenario_name,
            r.impact_analysis.portfolio_decline_percent,
            r.impact_analysis.income_reduction_percent,
            r.impact_analysis.expense_increase_percent,
            r.survival_probability,
            r.resilience_score,
            recovery);
    }

    println!("\nCompleted in {:?}", start.elapsed());
    Ok(())
}
