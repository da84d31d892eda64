use std::io::Read;
use std::path::Path;

use crate::error::ForecastError;
use crate::models::calendar::parse_month;
use crate::models::{HistoricalSeries, Observation, ProjectedSeries};

/// CSV row structure for the monthly market series.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct SeriesRow {
    #[serde(alias = "Date")]
    date: String,
    #[serde(rename = "BEV_Share", alias = "bev_share")]
    share: f64,
    #[serde(rename = "BEV_Registrations", alias = "bev_registrations")]
    registrations: f64,
}

fn parse_csv_records<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<Observation>, ForecastError> {
    let mut observations = Vec::new();

    for result in rdr.deserialize() {
        let row: SeriesRow = result?;
        let observation = Observation {
            date: parse_month(&row.date)?,
            share: row.share,
            registrations: row.registrations,
        };
        observation.validate()?;
        observations.push(observation);
    }

    Ok(observations)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).trim(csv::Trim::All);
    builder
}

/// Read a historical series from a CSV file with `date`, `BEV_Share` and
/// `BEV_Registrations` columns.
pub fn read_csv(path: impl AsRef<Path>) -> Result<HistoricalSeries, ForecastError> {
    let path = path.as_ref();
    let mut rdr = reader_builder().from_path(path)?;
    let observations = parse_csv_records(&mut rdr)?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    tracing::debug!(path = %path.display(), rows = observations.len(), "read CSV series");
    HistoricalSeries::from_observations(name, observations)
}

/// Read a historical series from CSV bytes.
pub fn read_csv_from_bytes(data: &[u8], name: &str) -> Result<HistoricalSeries, ForecastError> {
    let mut rdr = reader_builder().from_reader(data);
    let observations = parse_csv_records(&mut rdr)?;
    HistoricalSeries::from_observations(name, observations)
}

/// Write a historical series back to CSV.
pub fn write_csv(series: &HistoricalSeries, path: impl AsRef<Path>) -> Result<(), ForecastError> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;

    for obs in &series.observations {
        wtr.serialize(SeriesRow {
            date: obs.date.to_string(),
            share: obs.share,
            registrations: obs.registrations,
        })?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the projection grid: a `date` column followed by one column per scenario.
///
/// All projections must share the same date grid.
pub fn write_projection_csv(
    projections: &[ProjectedSeries],
    path: impl AsRef<Path>,
) -> Result<(), ForecastError> {
    let first = projections.first().ok_or_else(|| {
        ForecastError::InvalidInput("no projections to write".to_string())
    })?;
    if let Some(other) = projections
        .iter()
        .find(|p| p.len() != first.len() || p.start() != first.start())
    {
        return Err(ForecastError::InvalidInput(format!(
            "projection '{}' is on a different grid from '{}'",
            other.scenario, first.scenario
        )));
    }

    let mut wtr = csv::Writer::from_path(path.as_ref())?;

    let mut header = vec!["date".to_string()];
    header.extend(projections.iter().map(|p| p.scenario.clone()));
    wtr.write_record(&header)?;

    for (i, point) in first.points.iter().enumerate() {
        let mut record = vec![point.date.to_string()];
        record.extend(projections.iter().map(|p| format!("{:.6}", p.points[i].share)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
