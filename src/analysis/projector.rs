use crate::analysis::LogisticParams;
use crate::models::{Horizon, ProjectedPoint, ProjectedSeries, Scenario};

/// Evaluate the fitted curve with its growth rate scaled by `multiplier` at every
/// horizon point, clipping to 0.0..=1.0.
///
/// Pure and deterministic: identical inputs give bit-identical output.
pub fn project(
    params: &LogisticParams,
    scenario_name: &str,
    multiplier: f64,
    horizon: &Horizon,
) -> ProjectedSeries {
    let adjusted = LogisticParams {
        growth_rate: params.growth_rate * multiplier,
        ..*params
    };

    let points = horizon
        .dates
        .iter()
        .zip(&horizon.offsets)
        .map(|(&date, &offset)| ProjectedPoint {
            date,
            time_index: offset,
            share: adjusted.evaluate(offset as f64).clamp(0.0, 1.0),
        })
        .collect();

    ProjectedSeries {
        scenario: scenario_name.to_string(),
        multiplier,
        points,
    }
}

/// Project a catalog scenario.
pub fn project_scenario(
    params: &LogisticParams,
    scenario: &Scenario,
    horizon: &Horizon,
) -> ProjectedSeries {
    tracing::debug!(
        scenario = %scenario.name,
        multiplier = scenario.multiplier,
        points = horizon.len(),
        "projecting scenario"
    );
    project(params, &scenario.name, scenario.multiplier, horizon)
}
