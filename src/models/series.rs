use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::{add_months, month_label};
use crate::error::ForecastError;

/// A single month of historical market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Month-end date
    pub date: NaiveDate,
    /// BEV share of new registrations (0.0 - 1.0)
    pub share: f64,
    /// Absolute BEV registrations in the month
    pub registrations: f64,
}

impl Observation {
    /// Validate the observation's value ranges.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !self.share.is_finite() || !(0.0..=1.0).contains(&self.share) {
            return Err(ForecastError::InvalidInput(format!(
                "{}: share must be in 0.0..=1.0, got {}",
                self.date, self.share
            )));
        }
        if !self.registrations.is_finite() || self.registrations < 0.0 {
            return Err(ForecastError::InvalidInput(format!(
                "{}: registrations must be non-negative, got {}",
                self.date, self.registrations
            )));
        }
        Ok(())
    }
}

/// An ordered monthly series of BEV share and registrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalSeries {
    /// Name or identifier for this dataset
    pub name: String,
    /// Observations in ascending month order
    pub observations: Vec<Observation>,
}

impl HistoricalSeries {
    /// Create a new empty series.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observations: Vec::new(),
        }
    }

    /// Create a series from observations and validate it.
    pub fn from_observations(
        name: impl Into<String>,
        observations: Vec<Observation>,
    ) -> Result<Self, ForecastError> {
        let series = Self {
            name: name.into(),
            observations,
        };
        series.validate()?;
        Ok(series)
    }

    /// Check shape and ranges: non-empty, one observation per consecutive
    /// month in ascending order, values in range.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.observations.is_empty() {
            return Err(ForecastError::InvalidInput(
                "historical series is empty".to_string(),
            ));
        }
        for obs in &self.observations {
            obs.validate()?;
        }
        for pair in self.observations.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.date <= prev.date {
                return Err(ForecastError::InvalidInput(format!(
                    "dates must be strictly increasing: {} follows {}",
                    next.date, prev.date
                )));
            }
            let expected = add_months(prev.date, 1);
            if next.date != expected {
                return Err(ForecastError::InvalidInput(format!(
                    "gap in monthly series: expected {} after {}, got {}",
                    month_label(expected),
                    month_label(prev.date),
                    month_label(next.date)
                )));
            }
        }
        Ok(())
    }

    /// Number of months in the series.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First month of the series.
    pub fn start(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    /// Last month of the series.
    pub fn end(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Most recent observation.
    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Share values in time-index order.
    pub fn shares(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.share).collect()
    }

    /// Registration values in time-index order.
    pub fn registrations(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.registrations).collect()
    }
}
