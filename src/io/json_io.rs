use std::path::Path;

use serde::Serialize;

use crate::error::ForecastError;
use crate::models::calendar::to_month_end;
use crate::models::HistoricalSeries;

fn normalize(mut series: HistoricalSeries) -> Result<HistoricalSeries, ForecastError> {
    for obs in &mut series.observations {
        obs.date = to_month_end(obs.date);
    }
    series.validate()?;
    Ok(series)
}

/// Read a historical series from a JSON file.
pub fn read_json(path: impl AsRef<Path>) -> Result<HistoricalSeries, ForecastError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let series: HistoricalSeries = serde_json::from_str(&content)?;
    normalize(series)
}

/// Read a historical series from JSON bytes.
pub fn read_json_from_bytes(data: &[u8], name: &str) -> Result<HistoricalSeries, ForecastError> {
    let content = std::str::from_utf8(data)
        .map_err(|e| ForecastError::ParseError(format!("Invalid UTF-8: {e}")))?;
    let mut series: HistoricalSeries = serde_json::from_str(content)?;
    series.name = name.to_string();
    normalize(series)
}

/// Write any serializable value (a series, a report) as JSON.
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), ForecastError> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calendar::month_end;

    const SAMPLE: &str = r#"{
        "name": "uk",
        "observations": [
            {"date": "2024-01-01", "share": 0.15, "registrations": 20000},
            {"date": "2024-02-29", "share": 0.16, "registrations": 21000}
        ]
    }"#;

    #[test]
    fn test_read_from_bytes_renames_and_normalizes() {
        let series = read_json_from_bytes(SAMPLE.as_bytes(), "renamed").unwrap();
        assert_eq!(series.name, "renamed");
        assert_eq!(series.start(), Some(month_end(2024, 1).unwrap()));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_invalid_share_rejected() {
        let data = r#"{"name":"x","observations":[{"date":"2024-01-31","share":-0.1,"registrations":1}]}"#;
        assert!(matches!(
            read_json_from_bytes(data.as_bytes(), "x"),
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            read_json_from_bytes(b"{not json", "x"),
            Err(ForecastError::Json(_))
        ));
    }

    #[test]
    fn test_file_roundtrip_pretty() {
        let series = read_json_from_bytes(SAMPLE.as_bytes(), "uk").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");
        write_json(&series, &path, true).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        let loaded = read_json(&path).unwrap();
        assert_eq!(loaded.observations, series.observations);
    }
}
