use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::{first_crossing, months_between, project_at};
use crate::config::KpiConfig;
use crate::error::ForecastError;
use crate::models::calendar::to_month_end;
use crate::models::{HistoricalSeries, ProjectedSeries};

/// Change in share over `lag_months`, in percentage points.
///
/// `None` (undefined, distinct from zero) when fewer than `lag_months + 1`
/// values exist or either end is not a finite number.
///
/// # Examples
///
/// ```
/// use bev_adoption_forecaster::analysis::year_over_year;
///
/// let mut shares = vec![0.10; 12];
/// shares.push(0.16);
/// assert!((year_over_year(&shares, 12).unwrap() - 6.0).abs() < 1e-9);
/// assert!(year_over_year(&shares[..12], 12).is_none());
/// ```
pub fn year_over_year(shares: &[f64], lag_months: usize) -> Option<f64> {
    if lag_months == 0 || shares.len() < lag_months + 1 {
        return None;
    }
    let latest = *shares.last()?;
    let lagged = shares[shares.len() - 1 - lag_months];
    if !latest.is_finite() || !lagged.is_finite() {
        return None;
    }
    Some((latest - lagged) * 100.0)
}

/// Milestone timing relative to a policy target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetTiming {
    Ahead(u32),
    OnTarget,
    Behind(u32),
    NotReached,
}

impl TargetTiming {
    /// Classify a signed month offset (negative = ahead).
    pub fn from_months(months: Option<i32>) -> Self {
        match months {
            None => TargetTiming::NotReached,
            Some(0) => TargetTiming::OnTarget,
            Some(m) if m < 0 => TargetTiming::Ahead(m.unsigned_abs()),
            Some(m) => TargetTiming::Behind(m as u32),
        }
    }

    /// Whether the milestone lands on or before the target.
    pub fn on_track(&self) -> bool {
        matches!(self, TargetTiming::Ahead(_) | TargetTiming::OnTarget)
    }
}

impl std::fmt::Display for TargetTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetTiming::Ahead(m) => write!(f, "ahead by {m} mo"),
            TargetTiming::OnTarget => write!(f, "on target"),
            TargetTiming::Behind(m) => write!(f, "behind by {m} mo"),
            TargetTiming::NotReached => write!(f, "not reached by horizon end"),
        }
    }
}

/// Projected share against a published target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyGap {
    pub date: NaiveDate,
    pub target_share: f64,
    pub projected_share: f64,
    /// target - projected; positive is a shortfall
    pub gap: f64,
}

/// Headline KPIs for the executive summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSummary {
    pub scenario: String,
    pub last_date: NaiveDate,
    pub current_share: f64,
    /// Year-over-year change in percentage points
    pub yoy_change_pp: Option<f64>,
    pub projection_date: NaiveDate,
    pub projected_share: f64,
    pub target_threshold: f64,
    pub target_date: NaiveDate,
    pub milestone: Option<NaiveDate>,
    /// Signed months from target date to milestone (negative = ahead)
    pub months_vs_target: Option<i32>,
    pub timing: TargetTiming,
    pub policy_gaps: Vec<PolicyGap>,
}

/// Compute headline KPIs from the history and a scenario projection.
///
/// # Errors
///
/// `InvalidInput` for an empty history, `OutOfHorizon` when the projection
/// date or a policy target date lies past the projection.
pub fn compute_kpis(
    history: &HistoricalSeries,
    projection: &ProjectedSeries,
    config: &KpiConfig,
) -> Result<KpiSummary, ForecastError> {
    let latest = history.latest().ok_or_else(|| {
        ForecastError::InvalidInput("historical series is empty".to_string())
    })?;

    let yoy_change_pp = year_over_year(&history.shares(), config.yoy_lag_months);
    let projected_share = project_at(projection, config.projection_date)?;

    let milestone = first_crossing(projection, config.target_threshold);
    let target_month = to_month_end(config.target_date);
    let months_vs_target = milestone.map(|d| months_between(d, target_month));

    let policy_gaps = config
        .policy_targets
        .iter()
        .map(|target| {
            let projected = project_at(projection, target.date)?;
            Ok(PolicyGap {
                date: target.date,
                target_share: target.share,
                projected_share: projected,
                gap: target.share - projected,
            })
        })
        .collect::<Result<Vec<_>, ForecastError>>()?;

    Ok(KpiSummary {
        scenario: projection.scenario.clone(),
        last_date: latest.date,
        current_share: latest.share,
        yoy_change_pp,
        projection_date: config.projection_date,
        projected_share,
        target_threshold: config.target_threshold,
        target_date: config.target_date,
        milestone,
        months_vs_target,
        timing: TargetTiming::from_months(months_vs_target),
        policy_gaps,
    })
}
