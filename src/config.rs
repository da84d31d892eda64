//! Engine configuration.
//!
//! Every tunable the engine uses (fit bounds, horizon, scenario catalog,
//! milestone thresholds, KPI dates and the near-term stress test) lives here,
//! is loadable from TOML and is validated once at startup. A partial TOML file
//! overrides only the keys it names. Dates are written as quoted
//! `"YYYY-MM-DD"` strings.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::models::{Scenario, ScenarioCatalog};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Bounds and starting point for the logistic curve fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Initial guess for the asymptotic ceiling `L`
    pub ceiling_hint: f64,
    /// Allowed range for `L`
    pub ceiling_bounds: [f64; 2],
    /// Allowed range for the growth rate `k`
    pub growth_rate_bounds: [f64; 2],
    /// Allowed range for the inflection offset `t0` (months since series start)
    pub inflection_bounds: [f64; 2],
    /// Initial guess for `k`
    pub initial_growth_rate: f64,
    /// Initial guess for `t0`; half the series length when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_inflection: Option<f64>,
    pub max_iterations: usize,
    /// Relative convergence tolerance on cost and step size
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            ceiling_hint: 0.98,
            ceiling_bounds: [0.97, 0.99],
            growth_rate_bounds: [0.0, 1.0],
            inflection_bounds: [0.0, 200.0],
            initial_growth_rate: 0.1,
            initial_inflection: None,
            max_iterations: 500,
            tolerance: 1e-10,
        }
    }
}

/// Projection grid settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// Last month projected (normalized to month end)
    pub end: NaiveDate,
    pub step_months: u32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            end: date(2035, 12, 31),
            step_months: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneConfig {
    pub thresholds: Vec<f64>,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![0.50, 0.80, 0.98],
        }
    }
}

/// A published share target at a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTarget {
    pub date: NaiveDate,
    pub share: f64,
}

/// Dates and thresholds behind the headline KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    /// Date of the headline point projection
    pub projection_date: NaiveDate,
    /// Share whose crossing date is compared against `target_date`
    pub target_threshold: f64,
    pub target_date: NaiveDate,
    pub yoy_lag_months: usize,
    pub policy_targets: Vec<PolicyTarget>,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            projection_date: date(2030, 1, 1),
            target_threshold: 0.80,
            target_date: date(2030, 1, 1),
            yoy_lag_months: 12,
            policy_targets: vec![
                PolicyTarget {
                    date: date(2030, 1, 1),
                    share: 0.80,
                },
                PolicyTarget {
                    date: date(2035, 1, 1),
                    share: 0.98,
                },
            ],
        }
    }
}

/// Short-horizon registrations ramp and stress test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearTermConfig {
    pub horizon_months: usize,
    /// Monthly registrations reached at the end of the horizon
    pub target_registrations: f64,
    /// Multiplier applied to the normal path in the stress case (< 1)
    pub stress_factor: f64,
    /// Relative half-width of the band drawn around the normal path
    pub uncertainty_band: f64,
}

impl Default for NearTermConfig {
    fn default() -> Self {
        Self {
            horizon_months: 36,
            target_registrations: 120_000.0,
            stress_factor: 0.75,
            uncertainty_band: 0.06,
        }
    }
}

fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("Baseline", 1.0),
        Scenario::new("Economic Stress", 0.95),
        Scenario::new("Market Driven", 1.05),
        Scenario::new("Infrastructure Acceleration", 1.07),
    ]
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fit: FitConfig,
    pub horizon: HorizonConfig,
    pub milestones: MilestoneConfig,
    pub kpi: KpiConfig,
    pub near_term: NearTermConfig,
    pub scenarios: Vec<Scenario>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fit: FitConfig::default(),
            horizon: HorizonConfig::default(),
            milestones: MilestoneConfig::default(),
            kpi: KpiConfig::default(),
            near_term: NearTermConfig::default(),
            scenarios: default_scenarios(),
        }
    }
}

fn check_bounds(name: &str, bounds: [f64; 2]) -> Result<(), ForecastError> {
    let [lo, hi] = bounds;
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(ForecastError::Config(format!(
            "{name} must be finite with lower <= upper, got [{lo}, {hi}]"
        )));
    }
    Ok(())
}

fn check_fraction(name: &str, value: f64) -> Result<(), ForecastError> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(ForecastError::Config(format!(
            "{name} must be strictly between 0 and 1, got {value}"
        )));
    }
    Ok(())
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ForecastError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ForecastError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The scenario catalog built from `scenarios`.
    pub fn catalog(&self) -> Result<ScenarioCatalog, ForecastError> {
        ScenarioCatalog::new(self.scenarios.clone())
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ForecastError> {
        let fit = &self.fit;
        check_bounds("fit.ceiling_bounds", fit.ceiling_bounds)?;
        check_bounds("fit.growth_rate_bounds", fit.growth_rate_bounds)?;
        check_bounds("fit.inflection_bounds", fit.inflection_bounds)?;

        let [l_lo, l_hi] = fit.ceiling_bounds;
        if l_lo <= 0.0 || l_hi > 1.0 {
            return Err(ForecastError::Config(format!(
                "fit.ceiling_bounds must lie within (0, 1], got [{l_lo}, {l_hi}]"
            )));
        }
        if fit.growth_rate_bounds[0] < 0.0 {
            return Err(ForecastError::Config(
                "fit.growth_rate_bounds must be non-negative".to_string(),
            ));
        }
        if fit.inflection_bounds[0] < 0.0 {
            return Err(ForecastError::Config(
                "fit.inflection_bounds must be non-negative".to_string(),
            ));
        }
        if !(l_lo..=l_hi).contains(&fit.ceiling_hint) {
            return Err(ForecastError::Config(format!(
                "fit.ceiling_hint {} is outside ceiling bounds [{l_lo}, {l_hi}]",
                fit.ceiling_hint
            )));
        }
        let [k_lo, k_hi] = fit.growth_rate_bounds;
        if !(k_lo..=k_hi).contains(&fit.initial_growth_rate) {
            return Err(ForecastError::Config(format!(
                "fit.initial_growth_rate {} is outside growth rate bounds [{k_lo}, {k_hi}]",
                fit.initial_growth_rate
            )));
        }
        if let Some(t0) = fit.initial_inflection {
            let [t_lo, t_hi] = fit.inflection_bounds;
            if !(t_lo..=t_hi).contains(&t0) {
                return Err(ForecastError::Config(format!(
                    "fit.initial_inflection {t0} is outside inflection bounds [{t_lo}, {t_hi}]"
                )));
            }
        }
        if fit.max_iterations == 0 {
            return Err(ForecastError::Config(
                "fit.max_iterations must be at least 1".to_string(),
            ));
        }
        if !fit.tolerance.is_finite() || fit.tolerance <= 0.0 {
            return Err(ForecastError::Config(
                "fit.tolerance must be positive".to_string(),
            ));
        }

        if self.horizon.step_months == 0 {
            return Err(ForecastError::Config(
                "horizon.step_months must be at least 1".to_string(),
            ));
        }

        self.catalog()?;

        for &t in &self.milestones.thresholds {
            check_fraction("milestone threshold", t)?;
        }
        check_fraction("kpi.target_threshold", self.kpi.target_threshold)?;
        for target in &self.kpi.policy_targets {
            check_fraction("kpi.policy_targets share", target.share)?;
        }
        if self.kpi.yoy_lag_months == 0 {
            return Err(ForecastError::Config(
                "kpi.yoy_lag_months must be at least 1".to_string(),
            ));
        }

        let nt = &self.near_term;
        if nt.horizon_months == 0 {
            return Err(ForecastError::Config(
                "near_term.horizon_months must be at least 1".to_string(),
            ));
        }
        if !nt.target_registrations.is_finite() || nt.target_registrations < 0.0 {
            return Err(ForecastError::Config(format!(
                "near_term.target_registrations must be non-negative, got {}",
                nt.target_registrations
            )));
        }
        check_fraction("near_term.stress_factor", nt.stress_factor)?;
        if !nt.uncertainty_band.is_finite() || !(0.0..1.0).contains(&nt.uncertainty_band) {
            return Err(ForecastError::Config(format!(
                "near_term.uncertainty_band must be in [0, 1), got {}",
                nt.uncertainty_band
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.scenarios.len(), 4);
        assert_eq!(config.fit.ceiling_bounds, [0.97, 0.99]);
        assert_eq!(config.horizon.end, date(2035, 12, 31));
    }

    #[test]
    fn test_partial_toml_overrides_only_named_keys() {
        let config = EngineConfig::from_toml_str(
            r#"
            [near_term]
            stress_factor = 0.6

            [horizon]
            end = "2040-12-31"
            "#,
        )
        .unwrap();
        assert_eq!(config.near_term.stress_factor, 0.6);
        assert_eq!(config.near_term.horizon_months, 36);
        assert_eq!(config.horizon.end, date(2040, 12, 31));
        assert_eq!(config.fit, FitConfig::default());
    }

    #[test]
    fn test_custom_scenarios() {
        let config = EngineConfig::from_toml_str(
            r#"
            [[scenarios]]
            name = "Baseline"
            multiplier = 1.0

            [[scenarios]]
            name = "Mandate"
            multiplier = 1.2
            "#,
        )
        .unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.names(), vec!["Baseline", "Mandate"]);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        let back = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_ceiling_hint_outside_bounds() {
        let mut config = EngineConfig::default();
        config.fit.ceiling_hint = 0.5;
        assert!(matches!(config.validate(), Err(ForecastError::Config(_))));
    }

    #[test]
    fn test_inverted_bounds() {
        let mut config = EngineConfig::default();
        config.fit.growth_rate_bounds = [1.0, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ceiling_above_one_rejected() {
        let mut config = EngineConfig::default();
        config.fit.ceiling_bounds = [0.97, 1.2];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_initial_inflection_outside_bounds() {
        let mut config = EngineConfig::default();
        config.fit.initial_inflection = Some(500.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stress_factor_must_be_below_one() {
        let mut config = EngineConfig::default();
        config.near_term.stress_factor = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = EngineConfig::default();
        config.milestones.thresholds.push(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_step_rejected() {
        let mut config = EngineConfig::default();
        config.horizon.step_months = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_scenarios_rejected() {
        let mut config = EngineConfig::default();
        config.scenarios.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_near_term_horizon_rejected() {
        let mut config = EngineConfig::default();
        config.near_term.horizon_months = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let result = EngineConfig::from_toml_str("[fit\nceiling_hint = ");
        assert!(matches!(result, Err(ForecastError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[milestones]\nthresholds = [0.25, 0.5]\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.milestones.thresholds, vec![0.25, 0.5]);
    }
}
