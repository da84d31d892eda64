use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// A named adjustment to the fitted growth rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name (e.g., "Economic Stress")
    pub name: String,
    /// Multiplier applied to the fitted growth rate `k`
    pub multiplier: f64,
}

impl Scenario {
    pub fn new(name: impl Into<String>, multiplier: f64) -> Self {
        Self {
            name: name.into(),
            multiplier,
        }
    }

    /// Whether `query` names this scenario. Case-insensitive; `-` and `_`
    /// count as spaces so CLI spellings like `economic-stress` match.
    pub fn matches(&self, query: &str) -> bool {
        normalize(&self.name) == normalize(query)
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (k x {:.2})", self.name, self.multiplier)
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fixed, ordered catalog of scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    /// Build a catalog, rejecting empty catalogs, duplicate names and
    /// non-positive multipliers.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, ForecastError> {
        if scenarios.is_empty() {
            return Err(ForecastError::Config(
                "scenario catalog must contain at least one scenario".to_string(),
            ));
        }
        for (i, s) in scenarios.iter().enumerate() {
            if !s.multiplier.is_finite() || s.multiplier <= 0.0 {
                return Err(ForecastError::Config(format!(
                    "scenario '{}': multiplier must be positive, got {}",
                    s.name, s.multiplier
                )));
            }
            if scenarios[..i].iter().any(|other| other.matches(&s.name)) {
                return Err(ForecastError::Config(format!(
                    "duplicate scenario name '{}'",
                    s.name
                )));
            }
        }
        Ok(Self { scenarios })
    }

    /// Look up a scenario by name.
    pub fn get(&self, name: &str) -> Result<&Scenario, ForecastError> {
        self.scenarios
            .iter()
            .find(|s| s.matches(name))
            .ok_or_else(|| ForecastError::UnknownScenario(name.to_string()))
    }

    /// The first scenario in the catalog, used as the reference case.
    pub fn baseline(&self) -> &Scenario {
        // Non-empty by construction.
        &self.scenarios[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
