//! Month-end date arithmetic.
//!
//! Every date handled by the engine sits on the last day of its month, so a
//! monthly series can be compared, stepped and differenced without caring
//! about month lengths.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::ForecastError;

/// Last day of the given month.
pub fn month_end(year: i32, month: u32) -> Result<NaiveDate, ForecastError> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| ForecastError::InvalidInput(format!("invalid month {year}-{month:02}")))
}

/// Normalize any date to the last day of its month.
pub fn to_month_end(date: NaiveDate) -> NaiveDate {
    // The year/month of an existing date always has a valid month end.
    month_end(date.year(), date.month()).unwrap_or(date)
}

/// Month end `months` months after the month of `date` (negative steps back).
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    let shifted = if months >= 0 {
        first.checked_add_months(Months::new(months as u32))
    } else {
        first.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    to_month_end(shifted.unwrap_or(first))
}

/// Signed number of calendar months from `to` to `from`.
///
/// Positive when `from` falls after `to`, so a milestone date compared with a
/// policy target date reads as "behind" when positive and "ahead" when negative.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (from.year() - to.year()) * 12 + (from.month() as i32 - to.month() as i32)
}

/// Parse a date in `YYYY-MM-DD`, `YYYY-MM` or `DD/MM/YYYY` form and normalize it to month end.
pub fn parse_month(text: &str) -> Result<NaiveDate, ForecastError> {
    let text = text.trim();
    // Timestamps such as "2024-06-30 00:00:00" keep only the date part.
    let date_part = text.split([' ', 'T']).next().unwrap_or(text);

    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Ok(to_month_end(d));
    }
    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%d/%m/%Y") {
        return Ok(to_month_end(d));
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{date_part}-01"), "%Y-%m-%d") {
        return Ok(to_month_end(d));
    }
    Err(ForecastError::ParseError(format!(
        "Unrecognized date '{text}', expected YYYY-MM-DD"
    )))
}

/// Short "Jan 2030" label.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}
