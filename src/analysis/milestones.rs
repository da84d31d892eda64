use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::models::ProjectedSeries;

pub use crate::models::calendar::months_between;

/// A share threshold and the first grid date a projection reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub threshold: f64,
    /// `None` when the threshold is not reached by the horizon end
    pub achieved: Option<NaiveDate>,
}

impl Milestone {
    pub fn is_reached(&self) -> bool {
        self.achieved.is_some()
    }
}

/// Projected share at `date`, or at the first grid date after it.
///
/// # Errors
///
/// `OutOfHorizon` when the projection ends before `date`.
pub fn project_at(series: &ProjectedSeries, date: NaiveDate) -> Result<f64, ForecastError> {
    series
        .points
        .iter()
        .find(|p| p.date >= date)
        .map(|p| p.share)
        .ok_or_else(|| {
            ForecastError::OutOfHorizon(match series.end() {
                Some(end) => format!(
                    "{date} is after the end of the '{}' projection ({end})",
                    series.scenario
                ),
                None => format!("the '{}' projection is empty", series.scenario),
            })
        })
}

/// First grid date whose projected share is at or above `threshold`.
///
/// `None` means the threshold is not reached within the horizon, which is a
/// valid outcome rather than an error.
pub fn first_crossing(series: &ProjectedSeries, threshold: f64) -> Option<NaiveDate> {
    series
        .points
        .iter()
        .find(|p| p.share >= threshold)
        .map(|p| p.date)
}

/// Milestones for each threshold, in the order given.
pub fn milestones(series: &ProjectedSeries, thresholds: &[f64]) -> Vec<Milestone> {
    thresholds
        .iter()
        .map(|&threshold| Milestone {
            threshold,
            achieved: first_crossing(series, threshold),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{project, LogisticParams};
    use crate::models::calendar::month_end;
    use crate::models::{Horizon, ProjectedPoint};

    fn baseline() -> ProjectedSeries {
        let horizon = Horizon::new(
            month_end(2011, 1).unwrap(),
            month_end(2035, 12).unwrap(),
            1,
        )
        .unwrap();
        project(
            &LogisticParams::new(0.98, 0.08, 150.0),
            "Baseline",
            1.0,
            &horizon,
        )
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_project_at_exact_date() {
        let series = baseline();
        let p = series.points[100];
        assert_eq!(project_at(&series, p.date).unwrap(), p.share);
    }

    #[test]
    fn test_project_at_falls_forward_to_grid() {
        let series = baseline();
        // 2030-01-01 is not a month end; the Jan 2030 point is used.
        let value = project_at(&series, ymd(2030, 1, 1)).unwrap();
        let jan = series
            .points
            .iter()
            .find(|p| p.date == ymd(2030, 1, 31))
            .unwrap();
        assert_eq!(value, jan.share);
    }

    #[test]
    fn test_project_at_before_start_uses_first_point() {
        let series = baseline();
        assert_eq!(
            project_at(&series, ymd(2000, 1, 1)).unwrap(),
            series.points[0].share
        );
    }

    #[test]
    fn test_project_at_beyond_horizon() {
        let series = baseline();
        let result = project_at(&series, ymd(2036, 1, 1));
        assert!(matches!(result, Err(ForecastError::OutOfHorizon(_))));
    }

    #[test]
    fn test_project_at_empty_series() {
        let series = ProjectedSeries {
            scenario: "Empty".to_string(),
            multiplier: 1.0,
            points: vec![],
        };
        assert!(matches!(
            project_at(&series, ymd(2030, 1, 1)),
            Err(ForecastError::OutOfHorizon(_))
        ));
    }

    #[test]
    fn test_first_crossing_zero_threshold_is_first_date() {
        let series = baseline();
        assert_eq!(first_crossing(&series, 0.0), series.start());
    }

    #[test]
    fn test_first_crossing_unreachable_threshold() {
        let series = baseline();
        assert_eq!(first_crossing(&series, 0.985), None);
    }

    #[test]
    fn test_first_crossing_is_first_point_at_or_above() {
        let series = baseline();
        let date = first_crossing(&series, 0.5).unwrap();
        let idx = series.points.iter().position(|p| p.date == date).unwrap();
        assert!(series.points[idx].share >= 0.5);
        assert!(series.points[idx - 1].share < 0.5);
    }

    #[test]
    fn test_first_crossing_exact_hit_counts() {
        let start = month_end(2024, 1).unwrap();
        let series = ProjectedSeries {
            scenario: "Step".to_string(),
            multiplier: 1.0,
            points: [0.2, 0.5, 0.7]
                .iter()
                .enumerate()
                .map(|(i, &share)| ProjectedPoint {
                    date: crate::models::calendar::add_months(start, i as i32),
                    time_index: i as u32,
                    share,
                })
                .collect(),
        };
        assert_eq!(first_crossing(&series, 0.5), Some(month_end(2024, 2).unwrap()));
    }

    #[test]
    fn test_milestones_keep_threshold_order() {
        let series = baseline();
        let ms = milestones(&series, &[0.5, 0.8, 0.98]);
        assert_eq!(ms.len(), 3);
        assert_eq!(ms[0].threshold, 0.5);
        assert!(ms[0].is_reached());
        assert!(ms[1].is_reached());
        assert!(ms[0].achieved < ms[1].achieved);
        assert!(!ms[2].is_reached());
    }

    #[test]
    fn test_months_between_reexport() {
        assert_eq!(months_between(ymd(2029, 6, 30), ymd(2030, 1, 31)), -7);
    }
}
