//! Cashflow Engine CLI
//!
//! Projects one client scenario year by year and optionally runs a Monte Carlo
//! survival estimate on it.

use anyhow::{Context, Result};
use cashflow_engine::projection::{ProjectionConfig, ReturnBasis};
use cashflow_engine::scenario::load_scenario_json;
use cashflow_engine::simulation::MonteCarloConfig;
use cashflow_engine::{Assumptions, ScenarioParameters, ScenarioRunner};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cashflow_engine",
    about = "Retirement cashflow projection for a single client scenario"
)]
struct Cli {
    /// Scenario JSON file. Defaults to the built-in example client.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Assumptions directory (volatility, correlations, resilience weights).
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Inflate income and expenses (returns are nominal).
    #[arg(long, default_value_t = false)]
    nominal: bool,

    /// Write the full year-by-year path to this CSV file.
    #[arg(long, default_value = "projection_output.csv")]
    output: PathBuf,

    /// Number of years printed to the console.
    #[arg(long, default_value_t = 10)]
    show_years: usize,

    /// Also run a Monte Carlo simulation with this many trials.
    #[arg(long)]
    trials: Option<usize>,

    /// Seed for the Monte Carlo simulation.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    println!("Cashflow Engine v{}", env!("CARGO_PKG_VERSION"));
    println!("======================\n");

    let params = match &cli.scenario {
        Some(path) => load_scenario_json(path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioParameters::example(),
    };

    let assumptions = match &cli.assumptions {
        Some(dir) => Assumptions::from_csv_path(dir)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("loading assumptions from {}", dir.display()))?,
        None => Assumptions::default_planning(),
    };

    let return_basis = if cli.nominal { ReturnBasis::Nominal } else { ReturnBasis::Real };
    let runner = ScenarioRunner::with_assumptions(assumptions)
        .with_projection_config(ProjectionConfig { return_basis })
        .with_monte_carlo_config(MonteCarloConfig::default());

    let scenario = runner.validate(&params)?;
    for w in scenario.warnings() {
        println!("  warning: {}: {}", w.field, w.message);
    }

    println!("Client age {}, retiring at {}, planning to {}",
        params.client_age, params.retirement_age, params.life_expectancy);
    println!("  Starting assets: {:.2}", params.starting_assets());
    println!("  Income: {:.2}  Expenses: {:.2}", params.current_income, params.current_expenses);
    let alloc = scenario.allocation();
    println!("  Allocation: equity {:.1}% bond {:.1}% cash {:.1}% alternative {:.1}%",
        alloc.equity * 100.0, alloc.bond * 100.0, alloc.cash * 100.0, alloc.alternative * 100.0);
    println!();

    let result = runner.project(&params)?;

    println!("Projection ({} years):", result.years.len());
    println!("{:>4} {:>4} {:>14} {:>12} {:>12} {:>12} {:>14} {:>8}",
        "Year", "Age", "Opening", "Income", "Expenses", "Net", "Closing", "Sust");
    println!("{}", "-".repeat(90));

    for row in result.years.iter().take(cli.show_years) {
        let sust = row
            .sustainability_ratio
            .map(|r| format!("{:.3}", r))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>4} {:>4} {:>14.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2} {:>8}",
            row.year, row.age, row.opening_assets, row.income, row.expenses,
            row.net_cashflow, row.closing_assets, sust);
    }
    if result.years.len() > cli.show_years {
        println!("... ({} more years)", result.years.len() - cli.show_years);
    }

    let mut writer = csv::Writer::from_path(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    for row in &result.years {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("\nFull results written to: {}", cli.output.display());

    let summary = result.summary();
    println!("\nSummary:");
    println!("  Total Income: {:.2}", summary.total_income);
    println!("  Total Expenses: {:.2}", summary.total_expenses);
    println!("  Total Withdrawals: {:.2}", summary.total_withdrawals);
    println!("  Peak Assets: {:.2} (year {})", summary.peak_assets, summary.peak_year);
    if let Some(at_retirement) = summary.assets_at_retirement {
        println!("  Assets at Retirement: {:.2}", at_retirement);
    }
    println!("  Final Assets: {:.2}", summary.final_assets);
    match summary.depletion_year {
        Some(y) => println!("  Depleted in year {} (age {})", y, params.client_age + y),
        None => println!("  Assets last to life expectancy"),
    }

    if let Some(trials) = cli.trials {
        let mc = runner.simulate(&params, trials, cli.seed)?;
        let b = mc.percentile_bands;
        println!("\nMonte Carlo ({} trials, seed {}):", mc.trial_count, mc.seed);
        println!("  Survival Probability: {:.1}%", mc.survival_probability);
        println!("  Final Assets P10/P25/P50/P75/P90: {:.0} / {:.0} / {:.0} / {:.0} / {:.0}",
            b.p10, b.p25, b.p50, b.p75, b.p90);
        println!("  Mean Final Assets: {:.2}", mc.mean_final_assets);
        if let Some(y) = mc.earliest_depletion_year {
            println!("  Earliest Depletion: year {}", y);
        }
    }

    Ok(())
}
