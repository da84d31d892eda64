use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::{add_months, months_between, to_month_end};
use crate::error::ForecastError;

/// Monthly evaluation grid running from the historical start through a fixed end date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    /// Month-end dates in ascending order
    pub dates: Vec<NaiveDate>,
    /// Months since the historical start for each date
    pub offsets: Vec<u32>,
    /// Grid step in months
    pub step_months: u32,
}

impl Horizon {
    /// Build the grid `start, start + step, ...` up to and including `end`.
    pub fn new(start: NaiveDate, end: NaiveDate, step_months: u32) -> Result<Self, ForecastError> {
        if step_months == 0 {
            return Err(ForecastError::Config(
                "horizon step must be at least one month".to_string(),
            ));
        }
        let start = to_month_end(start);
        let end = to_month_end(end);
        if end < start {
            return Err(ForecastError::Config(format!(
                "horizon end {end} precedes series start {start}"
            )));
        }

        let span = months_between(end, start) as u32;
        let offsets: Vec<u32> = (0..=span).step_by(step_months as usize).collect();
        let dates = offsets
            .iter()
            .map(|&m| add_months(start, m as i32))
            .collect();

        Ok(Self {
            dates,
            offsets,
            step_months,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// One point of a scenario projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub date: NaiveDate,
    /// Months since the historical start
    pub time_index: u32,
    /// Projected BEV share, clipped to 0.0..=1.0
    pub share: f64,
}

/// A scenario's projected share over the horizon. Regenerated on demand, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedSeries {
    pub scenario: String,
    pub multiplier: f64,
    pub points: Vec<ProjectedPoint>,
}

impl ProjectedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn shares(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.share).collect()
    }

    /// Points falling on or after `date`, keeping every `every`-th one.
    pub fn sampled_from(&self, date: NaiveDate, every: usize) -> Vec<ProjectedPoint> {
        self.points
            .iter()
            .filter(|p| p.date >= date)
            .step_by(every.max(1))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calendar::month_end;

    #[test]
    fn test_horizon_monthly_grid() {
        let h = Horizon::new(
            month_end(2011, 1).unwrap(),
            month_end(2035, 12).unwrap(),
            1,
        )
        .unwrap();
        assert_eq!(h.len(), 25 * 12);
        assert_eq!(h.start(), Some(month_end(2011, 1).unwrap()));
        assert_eq!(h.end(), Some(month_end(2035, 12).unwrap()));
        assert_eq!(h.offsets[0], 0);
        assert_eq!(h.offsets[299], 299);
    }

    #[test]
    fn test_horizon_normalizes_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let h = Horizon::new(start, end, 1).unwrap();
        assert_eq!(
            h.dates,
            vec![
                month_end(2024, 1).unwrap(),
                month_end(2024, 2).unwrap(),
                month_end(2024, 3).unwrap()
            ]
        );
    }

    #[test]
    fn test_horizon_quarterly_step() {
        let h = Horizon::new(
            month_end(2024, 1).unwrap(),
            month_end(2024, 12).unwrap(),
            3,
        )
        .unwrap();
        assert_eq!(h.offsets, vec![0, 3, 6, 9]);
        assert_eq!(h.end(), Some(month_end(2024, 10).unwrap()));
    }

    #[test]
    fn test_horizon_single_month() {
        let d = month_end(2024, 5).unwrap();
        let h = Horizon::new(d, d, 1).unwrap();
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_horizon_end_before_start() {
        let result = Horizon::new(month_end(2024, 5).unwrap(), month_end(2024, 4).unwrap(), 1);
        assert!(matches!(result, Err(ForecastError::Config(_))));
    }

    #[test]
    fn test_horizon_zero_step() {
        let d = month_end(2024, 5).unwrap();
        assert!(Horizon::new(d, d, 0).is_err());
    }

    #[test]
    fn test_sampled_from() {
        let start = month_end(2024, 1).unwrap();
        let series = ProjectedSeries {
            scenario: "Baseline".to_string(),
            multiplier: 1.0,
            points: (0..12)
                .map(|i| ProjectedPoint {
                    date: add_months(start, i),
                    time_index: i as u32,
                    share: i as f64 / 100.0,
                })
                .collect(),
        };
        let sampled = series.sampled_from(month_end(2024, 6).unwrap(), 3);
        let months: Vec<u32> = sampled.iter().map(|p| p.time_index).collect();
        assert_eq!(months, vec![5, 8, 11]);
    }
}
