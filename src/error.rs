use thiserror::Error;

/// Errors that can occur while loading data or forecasting adoption.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Excel error: {0}")]
    Excel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Curve fit failed: {0}")]
    FitFailure(String),

    #[error("Out of horizon: {0}")]
    OutOfHorizon(String),

    #[error("Unknown scenario: '{0}'")]
    UnknownScenario(String),
}

impl From<calamine::Error> for ForecastError {
    fn from(e: calamine::Error) -> Self {
        ForecastError::Excel(e.to_string())
    }
}

impl From<calamine::XlsxError> for ForecastError {
    fn from(e: calamine::XlsxError) -> Self {
        ForecastError::Excel(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ForecastError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ForecastError::Excel(e.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(e: toml::de::Error) -> Self {
        ForecastError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for ForecastError {
    fn from(e: toml::ser::Error) -> Self {
        ForecastError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ForecastError::from(io_err);
        let msg = err.to_string();
        assert!(msg.contains("IO error"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_fit_failure_display() {
        let err = ForecastError::FitFailure("did not converge".to_string());
        assert_eq!(err.to_string(), "Curve fit failed: did not converge");
    }

    #[test]
    fn test_out_of_horizon_display() {
        let err = ForecastError::OutOfHorizon("2040-01-31 is after 2035-12-31".to_string());
        assert_eq!(
            err.to_string(),
            "Out of horizon: 2040-01-31 is after 2035-12-31"
        );
    }

    #[test]
    fn test_unknown_scenario_display() {
        let err = ForecastError::UnknownScenario("Utopia".to_string());
        assert_eq!(err.to_string(), "Unknown scenario: 'Utopia'");
    }

    #[test]
    fn test_invalid_input_display() {
        let err = ForecastError::InvalidInput("share must be in 0..=1".to_string());
        assert_eq!(err.to_string(), "Invalid input: share must be in 0..=1");
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let result: Result<toml::Table, _> = toml::from_str("horizon = [");
        let err: ForecastError = result.unwrap_err().into();
        assert!(matches!(err, ForecastError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_json_error_from_conversion() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("not valid json{{{");
        let err: ForecastError = result.unwrap_err().into();
        assert!(matches!(err, ForecastError::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = ForecastError::ParseError("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("ParseError"));
    }
}
