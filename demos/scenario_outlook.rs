//! Scenario outlook example: fit a synthetic UK-style series and compare scenarios.
//!
//! Run from the project root:
//!   cargo run --example scenario_outlook

use bev_adoption_forecaster::analysis::{logistic, Forecaster};
use bev_adoption_forecaster::config::EngineConfig;
use bev_adoption_forecaster::models::calendar::{add_months, month_end};
use bev_adoption_forecaster::models::{HistoricalSeries, Observation};
use bev_adoption_forecaster::visualization::{
    print_comparison_table, print_fit_table, print_kpi_summary, print_share_chart,
};

/// Monthly history from Jan 2011 to Jun 2024 with a small repeating wobble.
fn synthetic_history() -> HistoricalSeries {
    let start = month_end(2011, 1).expect("valid month");
    let observations = (0..162)
        .map(|i| {
            let wobble = [0.004, -0.003, 0.002, -0.004, 0.001, 0.0][i % 6];
            let share = (logistic(i as f64, 0.98, 0.075, 150.0) + wobble).clamp(0.0, 1.0);
            Observation {
                date: add_months(start, i as i32),
                share,
                registrations: 1_500.0 + share * 160_000.0,
            }
        })
        .collect();
    HistoricalSeries::from_observations("Synthetic UK", observations).expect("valid series")
}

fn main() {
    let history = synthetic_history();
    let config = EngineConfig::default();

    let forecaster = match Forecaster::new(&history, &config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Fit failed: {e}");
            return;
        }
    };

    print_fit_table(forecaster.fitted());

    match forecaster.kpis() {
        Ok(kpis) => print_kpi_summary(&kpis, Some(config.horizon.end)),
        Err(e) => eprintln!("KPI summary failed: {e}"),
    }

    match forecaster.scenario_comparison() {
        Ok(rows) => print_comparison_table(&rows, Some(config.horizon.end)),
        Err(e) => eprintln!("Scenario comparison failed: {e}"),
    }

    for name in ["Economic Stress", "Infrastructure Acceleration"] {
        match forecaster.project(name) {
            Ok(projection) => print_share_chart(&projection),
            Err(e) => eprintln!("Projection failed: {e}"),
        }
    }
}
