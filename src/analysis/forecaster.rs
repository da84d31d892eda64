use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    compute_kpis, fit_logistic, milestones, project_at, project_scenario, FittedCurve,
    KpiSummary, Milestone, NearTermForecast, RegistrationsStrategy,
};
use crate::config::EngineConfig;
use crate::error::ForecastError;
use crate::models::{HistoricalSeries, Horizon, ProjectedSeries, ScenarioCatalog};

/// One row of the scenario comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub multiplier: f64,
    pub projection_date: NaiveDate,
    pub projected_share: f64,
    pub milestones: Vec<Milestone>,
    /// target threshold - projected share at the projection date
    pub gap_to_target: f64,
}

/// Everything produced for a single run, ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub series: String,
    pub fit: FittedCurve,
    pub projection: ProjectedSeries,
    pub milestones: Vec<Milestone>,
    pub kpis: KpiSummary,
    pub comparison: Vec<ScenarioOutcome>,
    pub projections: Vec<ProjectedSeries>,
    pub near_term: NearTermForecast,
}

/// Unified forecasting API over one historical series.
///
/// The curve is fitted once on construction; every projection is derived from it.
pub struct Forecaster<'a> {
    series: &'a HistoricalSeries,
    config: &'a EngineConfig,
    catalog: ScenarioCatalog,
    horizon: Horizon,
    curve: FittedCurve,
}

impl<'a> Forecaster<'a> {
    /// Validate the inputs, build the horizon and fit the growth curve.
    pub fn new(series: &'a HistoricalSeries, config: &'a EngineConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        series.validate()?;
        let catalog = config.catalog()?;

        let start = series.start().ok_or_else(|| {
            ForecastError::InvalidInput("historical series is empty".to_string())
        })?;
        let horizon = Horizon::new(start, config.horizon.end, config.horizon.step_months)?;
        let curve = fit_logistic(&series.shares(), &config.fit)?;

        tracing::info!(
            series = %series.name,
            observations = series.len(),
            horizon_points = horizon.len(),
            "forecaster ready"
        );

        Ok(Self {
            series,
            config,
            catalog,
            horizon,
            curve,
        })
    }

    pub fn series(&self) -> &HistoricalSeries {
        self.series
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// The fitted baseline curve and its diagnostics.
    pub fn fitted(&self) -> &FittedCurve {
        &self.curve
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Project a named scenario over the full horizon.
    pub fn project(&self, scenario: &str) -> Result<ProjectedSeries, ForecastError> {
        let scenario = self.catalog.get(scenario)?;
        Ok(project_scenario(&self.curve.params, scenario, &self.horizon))
    }

    /// Project every catalog scenario, in catalog order.
    pub fn project_all(&self) -> Vec<ProjectedSeries> {
        self.catalog
            .iter()
            .map(|s| project_scenario(&self.curve.params, s, &self.horizon))
            .collect()
    }

    /// Milestones for the configured thresholds under a named scenario.
    pub fn milestones(&self, scenario: &str) -> Result<Vec<Milestone>, ForecastError> {
        let projection = self.project(scenario)?;
        Ok(milestones(&projection, &self.config.milestones.thresholds))
    }

    /// Headline KPIs under the baseline scenario.
    pub fn kpis(&self) -> Result<KpiSummary, ForecastError> {
        let baseline = self.catalog.baseline();
        let projection = project_scenario(&self.curve.params, baseline, &self.horizon);
        compute_kpis(self.series, &projection, &self.config.kpi)
    }

    /// Projected share, milestones and target gap for each scenario.
    pub fn scenario_comparison(&self) -> Result<Vec<ScenarioOutcome>, ForecastError> {
        let kpi = &self.config.kpi;
        self.project_all()
            .into_iter()
            .map(|projection| {
                let projected_share = project_at(&projection, kpi.projection_date)?;
                Ok(ScenarioOutcome {
                    milestones: milestones(&projection, &self.config.milestones.thresholds),
                    scenario: projection.scenario,
                    multiplier: projection.multiplier,
                    projection_date: kpi.projection_date,
                    projected_share,
                    gap_to_target: kpi.target_threshold - projected_share,
                })
            })
            .collect()
    }

    /// Near-term registrations with the configured linear ramp.
    pub fn near_term(&self) -> Result<NearTermForecast, ForecastError> {
        NearTermForecast::from_history(self.series, &self.config.near_term)
    }

    /// Near-term registrations with a caller-supplied strategy.
    pub fn near_term_with(
        &self,
        strategy: &dyn RegistrationsStrategy,
    ) -> Result<NearTermForecast, ForecastError> {
        NearTermForecast::from_history_with(self.series, strategy, &self.config.near_term)
    }

    /// Assemble the full report around a named scenario.
    pub fn report(&self, scenario: &str) -> Result<ForecastReport, ForecastError> {
        let projection = self.project(scenario)?;
        let milestones = milestones(&projection, &self.config.milestones.thresholds);
        Ok(ForecastReport {
            series: self.series.name.clone(),
            fit: self.curve.clone(),
            projection,
            milestones,
            kpis: self.kpis()?,
            comparison: self.scenario_comparison()?,
            projections: self.project_all(),
            near_term: self.near_term()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{logistic, LinearRamp};
    use crate::models::calendar::{add_months, month_end};
    use crate::models::Observation;
    use assert_approx_eq::assert_approx_eq;

    fn synthetic_series() -> HistoricalSeries {
        let start = month_end(2011, 1).unwrap();
        let observations = (0..162)
            .map(|i| Observation {
                date: add_months(start, i),
                share: logistic(i as f64, 0.98, 0.08, 110.0),
                registrations: 1_000.0 + 500.0 * i as f64,
            })
            .collect();
        HistoricalSeries::from_observations("synthetic", observations).unwrap()
    }

    #[test]
    fn test_horizon_spans_start_to_config_end() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        assert_eq!(f.horizon().start(), Some(month_end(2011, 1).unwrap()));
        assert_eq!(f.horizon().end(), Some(month_end(2035, 12).unwrap()));
        assert_eq!(f.horizon().len(), 300);
    }

    #[test]
    fn test_fit_recovers_curve() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        let p = f.fitted().params;
        assert_approx_eq!(p.ceiling, 0.98, 1e-3);
        assert_approx_eq!(p.growth_rate, 0.08, 1e-3);
        assert_approx_eq!(p.inflection, 110.0, 0.5);
    }

    #[test]
    fn test_project_unknown_scenario() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        assert!(matches!(
            f.project("Moonshot"),
            Err(ForecastError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_project_all_in_catalog_order() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        let all = f.project_all();
        let names: Vec<&str> = all.iter().map(|p| p.scenario.as_str()).collect();
        assert_eq!(names, f.catalog().names());
    }

    #[test]
    fn test_comparison_orders_milestones_by_multiplier() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        let mut rows = f.scenario_comparison().unwrap();
        rows.sort_by(|a, b| a.multiplier.total_cmp(&b.multiplier));
        for pair in rows.windows(2) {
            assert!(pair[0].projected_share <= pair[1].projected_share);
            let slow = pair[0].milestones[0].achieved;
            let fast = pair[1].milestones[0].achieved;
            if let (Some(slow), Some(fast)) = (slow, fast) {
                assert!(fast <= slow);
            }
        }
        for row in &rows {
            assert_approx_eq!(
                row.gap_to_target,
                config.kpi.target_threshold - row.projected_share,
                1e-15
            );
        }
    }

    #[test]
    fn test_kpis_use_baseline() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        let kpis = f.kpis().unwrap();
        assert_eq!(kpis.scenario, f.catalog().baseline().name);
        assert_eq!(kpis.last_date, month_end(2024, 6).unwrap());
    }

    #[test]
    fn test_near_term_with_custom_target() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        let nt = f.near_term_with(&LinearRamp { target: 50_000.0 }).unwrap();
        assert_eq!(nt.normal[0], series.latest().unwrap().registrations);
        assert_eq!(*nt.normal.last().unwrap(), 50_000.0);
    }

    #[test]
    fn test_report_is_complete() {
        let series = synthetic_series();
        let config = EngineConfig::default();
        let f = Forecaster::new(&series, &config).unwrap();
        let report = f.report("baseline").unwrap();
        assert_eq!(report.series, "synthetic");
        assert_eq!(report.milestones.len(), config.milestones.thresholds.len());
        assert_eq!(report.comparison.len(), f.catalog().len());
        assert_eq!(report.projections.len(), f.catalog().len());
        assert_eq!(report.near_term.len(), config.near_term.horizon_months);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kpis\""));
    }

    #[test]
    fn test_too_short_series_rejected() {
        let start = month_end(2024, 1).unwrap();
        let series = HistoricalSeries::from_observations(
            "short",
            (0..3)
                .map(|i| Observation {
                    date: add_months(start, i),
                    share: 0.1 + 0.01 * i as f64,
                    registrations: 100.0,
                })
                .collect(),
        )
        .unwrap();
        let config = EngineConfig::default();
        assert!(matches!(
            Forecaster::new(&series, &config),
            Err(ForecastError::InvalidInput(_))
        ));
    }
}
