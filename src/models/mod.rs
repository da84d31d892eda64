pub mod calendar;
mod projection;
mod scenario;
mod series;

pub use projection::{Horizon, ProjectedPoint, ProjectedSeries};
pub use scenario::{Scenario, ScenarioCatalog};
pub use series::{HistoricalSeries, Observation};
