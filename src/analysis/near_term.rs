use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::NearTermConfig;
use crate::error::ForecastError;
use crate::models::calendar::add_months;
use crate::models::HistoricalSeries;

/// Produces the "normal conditions" registrations path for the near-term forecast.
pub trait RegistrationsStrategy {
    /// Short name shown in reports.
    fn name(&self) -> &str;

    /// Monthly registrations for `months` months, starting from the last historical value.
    fn normal_path(&self, last_registrations: f64, months: usize) -> Result<Vec<f64>, ForecastError>;
}

/// Straight-line ramp from the last historical value to a target value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRamp {
    pub target: f64,
}

impl RegistrationsStrategy for LinearRamp {
    fn name(&self) -> &str {
        "linear ramp"
    }

    fn normal_path(&self, last_registrations: f64, months: usize) -> Result<Vec<f64>, ForecastError> {
        if !self.target.is_finite() || self.target < 0.0 {
            return Err(ForecastError::InvalidInput(format!(
                "target registrations must be non-negative, got {}",
                self.target
            )));
        }
        Ok(linear_ramp(last_registrations, self.target, months))
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// The final value is exactly `end` when `n > 1`; `n == 1` yields `[start]`.
pub fn linear_ramp(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = end;
            values
        }
    }
}

/// Month and size of the largest monthly shortfall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShortfallPeak {
    pub date: NaiveDate,
    pub value: f64,
}

/// Near-term registrations under normal and stress conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearTermForecast {
    pub strategy: String,
    pub stress_factor: f64,
    pub dates: Vec<NaiveDate>,
    pub normal: Vec<f64>,
    pub stress: Vec<f64>,
    /// normal - stress, per month
    pub shortfall: Vec<f64>,
}

impl NearTermForecast {
    /// Build the forecast for the `months` months following `last_date`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a zero-length horizon, a negative or non-finite anchor,
    /// a stress factor outside (0, 1), or a strategy path of the wrong length.
    pub fn build(
        last_date: NaiveDate,
        last_registrations: f64,
        strategy: &dyn RegistrationsStrategy,
        months: usize,
        stress_factor: f64,
    ) -> Result<Self, ForecastError> {
        if months == 0 {
            return Err(ForecastError::InvalidInput(
                "near-term horizon must be at least one month".to_string(),
            ));
        }
        if !last_registrations.is_finite() || last_registrations < 0.0 {
            return Err(ForecastError::InvalidInput(format!(
                "last registrations must be non-negative, got {last_registrations}"
            )));
        }
        if !stress_factor.is_finite() || stress_factor <= 0.0 || stress_factor >= 1.0 {
            return Err(ForecastError::InvalidInput(format!(
                "stress factor must be strictly between 0 and 1, got {stress_factor}"
            )));
        }

        let normal = strategy.normal_path(last_registrations, months)?;
        if normal.len() != months {
            return Err(ForecastError::InvalidInput(format!(
                "strategy '{}' produced {} values for a {months}-month horizon",
                strategy.name(),
                normal.len()
            )));
        }

        let dates = (1..=months as i32)
            .map(|m| add_months(last_date, m))
            .collect();
        let stress: Vec<f64> = normal.iter().map(|v| v * stress_factor).collect();
        let shortfall = normal.iter().zip(&stress).map(|(n, s)| n - s).collect();

        Ok(Self {
            strategy: strategy.name().to_string(),
            stress_factor,
            dates,
            normal,
            stress,
            shortfall,
        })
    }

    /// Forecast from the end of a historical series using the configured ramp.
    pub fn from_history(
        history: &HistoricalSeries,
        config: &NearTermConfig,
    ) -> Result<Self, ForecastError> {
        let strategy = LinearRamp {
            target: config.target_registrations,
        };
        Self::from_history_with(history, &strategy, config)
    }

    /// Forecast from the end of a historical series with any strategy.
    pub fn from_history_with(
        history: &HistoricalSeries,
        strategy: &dyn RegistrationsStrategy,
        config: &NearTermConfig,
    ) -> Result<Self, ForecastError> {
        let latest = history.latest().ok_or_else(|| {
            ForecastError::InvalidInput("historical series is empty".to_string())
        })?;
        Self::build(
            latest.date,
            latest.registrations,
            strategy,
            config.horizon_months,
            config.stress_factor,
        )
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Largest monthly shortfall; the earliest month wins ties.
    pub fn peak_shortfall(&self) -> Option<ShortfallPeak> {
        let mut peak: Option<ShortfallPeak> = None;
        for (&date, &value) in self.dates.iter().zip(&self.shortfall) {
            if peak.map_or(true, |p| value > p.value) {
                peak = Some(ShortfallPeak { date, value });
            }
        }
        peak
    }

    /// Total registrations lost over the horizon under stress.
    pub fn cumulative_at_risk(&self) -> f64 {
        self.shortfall.iter().sum()
    }

    /// `(lower, upper)` band of `normal * (1 -/+ band)` for each month.
    pub fn uncertainty_band(&self, band: f64) -> Vec<(f64, f64)> {
        self.normal
            .iter()
            .map(|v| (v * (1.0 - band), v * (1.0 + band)))
            .collect()
    }
}
