use std::collections::BTreeMap;

use chrono::Datelike;
use colored::Colorize;

use crate::analysis::NearTermForecast;
use crate::models::calendar::month_label;
use crate::models::ProjectedSeries;

const BAR_WIDTH: usize = 40;

fn bar(value: f64, max: f64) -> String {
    let len = if max > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "\u{2588}".repeat(len.min(BAR_WIDTH))
}

/// Format a text bar chart of projected share, one bar per year.
pub fn format_share_chart(series: &ProjectedSeries) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{}\n",
        format!("Projected BEV Share: {}", series.scenario).bold().green()
    ));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    if series.is_empty() {
        output.push_str("  No data available.\n");
        return output;
    }

    // Last grid point of each calendar year.
    let yearly: BTreeMap<i32, f64> = series
        .points
        .iter()
        .map(|p| (p.date.year(), p.share))
        .collect();

    output.push_str(&format!("  {:>6}  {:>7}  Share\n", "Year", "%"));
    output.push_str(&format!("  {}\n", "-".repeat(58)));
    for (year, share) in yearly {
        output.push_str(&format!(
            "  {:>6}  {:>6.1}%  {}\n",
            year,
            share * 100.0,
            bar(share, 1.0).green()
        ));
    }

    output.push('\n');
    output
}

/// Print a text bar chart of projected share.
pub fn print_share_chart(series: &ProjectedSeries) {
    print!("{}", format_share_chart(series));
}

/// Format a text bar chart of the monthly stress shortfall.
pub fn format_shortfall_chart(forecast: &NearTermForecast) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Stress Shortfall".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    if forecast.is_empty() {
        output.push_str("  No data available.\n");
        return output;
    }

    let max = forecast.shortfall.iter().copied().fold(0.0f64, f64::max);
    output.push_str(&format!("  {:>8}  {:>9}  Shortfall\n", "Month", "Units"));
    output.push_str(&format!("  {}\n", "-".repeat(58)));
    for (date, value) in forecast.dates.iter().zip(&forecast.shortfall) {
        output.push_str(&format!(
            "  {:>8}  {:>9.0}  {}\n",
            month_label(*date),
            value,
            bar(*value, max).red()
        ));
    }

    output.push('\n');
    output
}

/// Print a text bar chart of the monthly stress shortfall.
pub fn print_shortfall_chart(forecast: &NearTermForecast) {
    print!("{}", format_shortfall_chart(forecast));
}
