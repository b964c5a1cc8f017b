//! Run every client scenario in a CSV file and write a summary CSV
//!
//! Usage: run_batch [scenarios.csv] [output.csv]
//! Environment: TRIAL_COUNT (default 1000), SEED (default 42)

use anyhow::Result;
use cashflow_engine::scenario::load_scenarios_csv;
use cashflow_engine::simulation::DEFAULT_TRIALS;
use cashflow_engine::ScenarioRunner;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;

/// One output row per client
#[derive(Debug, Serialize)]
struct SummaryRow {
    client_id: String,
    status: String,
    survival_probability: Option<f64>,
    p10_final_assets: Option<f64>,
    p50_final_assets: Option<f64>,
    p90_final_assets: Option<f64>,
    expected_final_assets: Option<f64>,
    expected_depletion_year: Option<u32>,
    error: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "data/scenarios/clients.csv".to_string());
    let output = args.next().unwrap_or_else(|| "batch_summary.csv".to_string());

    let trial_count: usize = env::var("TRIAL_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TRIALS);

    let seed: u64 = env::var("SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let start = Instant::now();
    println!("Loading scenarios from {}...", input);
    let records = load_scenarios_csv(Path::new(&input)).map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("Loaded {} scenarios in {:?}", records.len(), start.elapsed());

    let runner = ScenarioRunner::new();

    println!("Running {} trials per scenario...", trial_count);
    let run_start = Instant::now();
    let outcomes = runner.run_batch(&records, trial_count, seed)?;
    println!("Completed in {:?}", run_start.elapsed());

    let mut writer = csv::Writer::from_path(&output)?;
    let mut failures = 0;

    for (record, outcome) in records.iter().zip(outcomes) {
        let row = match outcome {
            Ok(o) => SummaryRow {
                client_id: record.client_id.clone(),
                status: "ok".to_string(),
                survival_probability: Some(o.monte_carlo.survival_probability),
                p10_final_assets: Some(o.monte_carlo.percentile_bands.p10),
                p50_final_assets: Some(o.monte_carlo.percentile_bands.p50),
                p90_final_assets: Some(o.monte_carlo.percentile_bands.p90),
                expected_final_assets: Some(o.projection.final_assets()),
                expected_depletion_year: o.projection.depletion_year,
                error: None,
            },
            Err(e) => {
                failures += 1;
                log::warn!("{}: {}", record.client_id, e);
                SummaryRow {
                    client_id: record.client_id.clone(),
                    status: "error".to_string(),
                    survival_probability: None,
                    p10_final_assets: None,
                    p50_final_assets: None,
                    p90_final_assets: None,
                    expected_final_assets: None,
                    expected_depletion_year: None,
                    error: Some(e.to_string()),
                }
            }
        };

        println!("  {:<10} {:>6} {:>8}",
            row.client_id,
            row.status,
            row.survival_probability
                .map(|s| format!("{:.1}%", s))
                .unwrap_or_else(|| "-".to_string()));
        writer.serialize(&row)?;
    }
    writer.flush()?;

    log::info!("Batch finished: {} scenarios, {} failed", records.len(), failures);
    println!("\nSummary written to: {}", output);
    println!("Total time: {:?}", start.elapsed());
    Ok(())
}
