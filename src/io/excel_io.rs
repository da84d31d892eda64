use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Days, NaiveDate};
use rust_xlsxwriter::{Format, Workbook};

use crate::analysis::ForecastReport;
use crate::error::ForecastError;
use crate::models::calendar::{parse_month, to_month_end};
use crate::models::{HistoricalSeries, Observation};

const DATE_COLUMN: &str = "date";
const SHARE_COLUMN: &str = "bev_share";
const REGISTRATIONS_COLUMN: &str = "bev_registrations";

/// Excel stores dates as days since 1899-12-30.
fn serial_to_date(serial: f64) -> Result<NaiveDate, ForecastError> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)
        .ok_or_else(|| ForecastError::ParseError("invalid Excel epoch".to_string()))?;
    if !serial.is_finite() || serial < 0.0 {
        return Err(ForecastError::ParseError(format!(
            "invalid Excel date serial {serial}"
        )));
    }
    base.checked_add_days(Days::new(serial.floor() as u64))
        .map(to_month_end)
        .ok_or_else(|| ForecastError::ParseError(format!("Excel date serial {serial} out of range")))
}

fn cell_date(cell: &Data) -> Result<NaiveDate, ForecastError> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) => parse_month(s),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()),
        Data::Float(f) => serial_to_date(*f),
        Data::Int(i) => serial_to_date(*i as f64),
        other => Err(ForecastError::ParseError(format!(
            "unsupported date cell '{other}'"
        ))),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn find_column(header: &[Data], name: &str) -> Result<usize, ForecastError> {
    header
        .iter()
        .position(|c| c.to_string().trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            ForecastError::InvalidInput(format!("required column '{name}' not found in header"))
        })
}

fn parse_workbook<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
) -> Result<Vec<Observation>, ForecastError> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ForecastError::Excel("No sheets found in workbook".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| ForecastError::InvalidInput(format!("sheet '{sheet_name}' is empty")))?;
    let date_col = find_column(header, DATE_COLUMN)?;
    let share_col = find_column(header, SHARE_COLUMN)?;
    let reg_col = find_column(header, REGISTRATIONS_COLUMN)?;

    let mut observations = Vec::new();
    for (i, row) in rows.enumerate() {
        // Trailing blank rows are common in hand-edited workbooks.
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let line = i + 2;
        let number = |col: usize, label: &str| {
            row.get(col).and_then(cell_number).ok_or_else(|| {
                ForecastError::ParseError(format!("row {line}: missing or non-numeric {label}"))
            })
        };

        let date = row
            .get(date_col)
            .ok_or_else(|| ForecastError::ParseError(format!("row {line}: missing date")))
            .and_then(cell_date)?;
        let observation = Observation {
            date,
            share: number(share_col, "BEV_Share")?,
            registrations: number(reg_col, "BEV_Registrations")?,
        };
        observation.validate()?;
        observations.push(observation);
    }

    Ok(observations)
}

/// Read a historical series from an Excel (.xlsx) file.
///
/// The first sheet must have a header row with `date`, `BEV_Share` and
/// `BEV_Registrations` columns (any order, case-insensitive).
pub fn read_excel(path: impl AsRef<Path>) -> Result<HistoricalSeries, ForecastError> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let observations = parse_workbook(&mut workbook)?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    tracing::debug!(path = %path.display(), rows = observations.len(), "read Excel series");
    HistoricalSeries::from_observations(name, observations)
}

/// Read a historical series from Excel bytes.
pub fn read_excel_from_bytes(data: &[u8], name: &str) -> Result<HistoricalSeries, ForecastError> {
    let mut workbook = Xlsx::new(Cursor::new(data))?;
    let observations = parse_workbook(&mut workbook)?;
    HistoricalSeries::from_observations(name, observations)
}

/// Write a forecast report as a workbook with `Projections`, `Milestones`
/// and `NearTerm` sheets.
pub fn write_excel(report: &ForecastReport, path: impl AsRef<Path>) -> Result<(), ForecastError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Projections")?;
        sheet.write_string_with_format(0, 0, "date", &bold)?;
        for (col, projection) in report.projections.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16 + 1, &projection.scenario, &bold)?;
        }
        if let Some(first) = report.projections.first() {
            for (row, point) in first.points.iter().enumerate() {
                sheet.write_string(row as u32 + 1, 0, point.date.to_string())?;
            }
        }
        for (col, projection) in report.projections.iter().enumerate() {
            for (row, point) in projection.points.iter().enumerate() {
                sheet.write_number(row as u32 + 1, col as u16 + 1, point.share)?;
            }
        }
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Milestones")?;
        for (col, header) in ["scenario", "multiplier", "threshold", "achieved"]
            .iter()
            .enumerate()
        {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        let mut row: u32 = 1;
        for outcome in &report.comparison {
            for milestone in &outcome.milestones {
                sheet.write_string(row, 0, &outcome.scenario)?;
                sheet.write_number(row, 1, outcome.multiplier)?;
                sheet.write_number(row, 2, milestone.threshold)?;
                match milestone.achieved {
                    Some(date) => sheet.write_string(row, 3, date.to_string())?,
                    None => sheet.write_string(row, 3, "Not reached")?,
                };
                row += 1;
            }
        }
    }

    {
        let nt = &report.near_term;
        let sheet = workbook.add_worksheet();
        sheet.set_name("NearTerm")?;
        for (col, header) in ["date", "normal", "stress", "shortfall"].iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        for (i, date) in nt.dates.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, date.to_string())?;
            sheet.write_number(row, 1, nt.normal[i])?;
            sheet.write_number(row, 2, nt.stress[i])?;
            sheet.write_number(row, 3, nt.shortfall[i])?;
        }
    }

    workbook.save(path.as_ref())?;
    Ok(())
}
