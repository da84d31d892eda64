pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod visualization;

pub use analysis::{Forecaster, ForecastReport};
pub use config::EngineConfig;
pub use error::ForecastError;
pub use io::{ReportWriter, SeriesReader};
pub use models::{HistoricalSeries, Observation, ProjectedSeries, Scenario, ScenarioCatalog};
