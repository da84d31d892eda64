mod fitter;
mod forecaster;
mod kpi;
mod milestones;
mod near_term;
mod projector;

pub use fitter::{fit_logistic, logistic, FitDiagnostics, FittedCurve, LogisticParams};
pub use forecaster::{ForecastReport, Forecaster, ScenarioOutcome};
pub use kpi::{compute_kpis, year_over_year, KpiSummary, PolicyGap, TargetTiming};
pub use milestones::{first_crossing, milestones, months_between, project_at, Milestone};
pub use near_term::{
    linear_ramp, LinearRamp, NearTermForecast, RegistrationsStrategy, ShortfallPeak,
};
pub use projector::{project, project_scenario};
