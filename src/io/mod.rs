mod csv_io;
mod excel_io;
mod json_io;

use std::path::Path;

use crate::analysis::ForecastReport;
use crate::error::ForecastError;
use crate::models::HistoricalSeries;

pub use csv_io::{read_csv, read_csv_from_bytes, write_csv, write_projection_csv};
pub use excel_io::{read_excel, read_excel_from_bytes, write_excel};
pub use json_io::{read_json, read_json_from_bytes, write_json};

/// Trait for reading a historical series from a file.
pub trait SeriesReader {
    fn read(&self, path: &Path) -> Result<HistoricalSeries, ForecastError>;
}

/// Trait for exporting a forecast report to a file.
pub trait ReportWriter {
    fn write(&self, report: &ForecastReport, path: &Path) -> Result<(), ForecastError>;
}

/// CSV series reader; exports the scenario projection grid.
pub struct CsvFormat;

impl SeriesReader for CsvFormat {
    fn read(&self, path: &Path) -> Result<HistoricalSeries, ForecastError> {
        read_csv(path)
    }
}

impl ReportWriter for CsvFormat {
    fn write(&self, report: &ForecastReport, path: &Path) -> Result<(), ForecastError> {
        write_projection_csv(&report.projections, path)
    }
}

/// JSON series reader; exports the whole report.
#[derive(Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl SeriesReader for JsonFormat {
    fn read(&self, path: &Path) -> Result<HistoricalSeries, ForecastError> {
        read_json(path)
    }
}

impl ReportWriter for JsonFormat {
    fn write(&self, report: &ForecastReport, path: &Path) -> Result<(), ForecastError> {
        write_json(report, path, self.pretty)
    }
}

/// Excel (.xlsx) series reader; exports a three-sheet workbook.
pub struct ExcelFormat;

impl SeriesReader for ExcelFormat {
    fn read(&self, path: &Path) -> Result<HistoricalSeries, ForecastError> {
        read_excel(path)
    }
}

impl ReportWriter for ExcelFormat {
    fn write(&self, report: &ForecastReport, path: &Path) -> Result<(), ForecastError> {
        write_excel(report, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{logistic, Forecaster};
    use crate::config::EngineConfig;
    use crate::models::calendar::{add_months, month_end};
    use crate::models::Observation;

    fn sample_series() -> HistoricalSeries {
        let start = month_end(2011, 1).unwrap();
        HistoricalSeries::from_observations(
            "IO Trait Test",
            (0..162)
                .map(|i| Observation {
                    date: add_months(start, i),
                    share: logistic(i as f64, 0.98, 0.08, 110.0),
                    registrations: 2_000.0 + 400.0 * i as f64,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_csv_trait_roundtrip() {
        let series = sample_series();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        write_csv(&series, &path).unwrap();

        let reader: &dyn SeriesReader = &CsvFormat;
        let loaded = reader.read(&path).unwrap();
        assert_eq!(loaded.len(), series.len());
        assert_eq!(loaded.end(), series.end());
    }

    #[test]
    fn test_json_trait_roundtrip() {
        let series = sample_series();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        write_json(&series, &path, false).unwrap();

        let reader: &dyn SeriesReader = &JsonFormat::default();
        let loaded = reader.read(&path).unwrap();
        assert_eq!(loaded.observations, series.observations);
    }

    #[test]
    fn test_report_writers() {
        let series = sample_series();
        let config = EngineConfig::default();
        let report = Forecaster::new(&series, &config)
            .unwrap()
            .report("Baseline")
            .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let writers: [(&dyn ReportWriter, &str); 3] = [
            (&CsvFormat, "report.csv"),
            (&JsonFormat { pretty: true }, "report.json"),
            (&ExcelFormat, "report.xlsx"),
        ];
        for (writer, file) in writers {
            let path = dir.path().join(file);
            writer.write(&report, &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0, "{file} is empty");
        }

        let json = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["series"], "IO Trait Test");
        assert_eq!(value["projections"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_json_format_default() {
        let fmt = JsonFormat::default();
        assert!(!fmt.pretty);
    }
}
