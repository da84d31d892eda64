use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, ContentArrangement, Table,
};

use crate::analysis::{FittedCurve, KpiSummary, Milestone, NearTermForecast, ScenarioOutcome};
use crate::models::calendar::month_label;
use crate::models::{ProjectedPoint, ScenarioCatalog};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn title(output: &mut String, text: &str, width: usize) {
    output.push_str(&format!("\n{}\n", text.bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(width)));
}

fn pct(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

/// "Mar 2031", or "Not reached by Dec 2035" when the milestone falls past the horizon.
pub fn milestone_label(achieved: Option<NaiveDate>, horizon_end: Option<NaiveDate>) -> String {
    match (achieved, horizon_end) {
        (Some(date), _) => month_label(date),
        (None, Some(end)) => format!("Not reached by {}", month_label(end)),
        (None, None) => "Not reached".to_string(),
    }
}

/// Format the fitted parameters and fit quality as a string.
pub fn format_fit_table(curve: &FittedCurve) -> String {
    let d = &curve.diagnostics;
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Logistic Fit".bold().green()));
    output.push_str(&format!(
        "{}\n",
        format!(
            "Observations: {} | Iterations: {} | Confidence Level: {:.0}%",
            d.observations,
            d.iterations,
            d.confidence_level * 100.0
        )
        .dimmed()
    ));
    output.push_str(&format!("{}\n", "=".repeat(70)));

    let mut table = new_table(vec!["Parameter", "Estimate", "Std Error", "Lower CI", "Upper CI"]);

    let p = &curve.params;
    let rows = [
        ("Ceiling (L)", p.ceiling),
        ("Growth rate (k)", p.growth_rate),
        ("Inflection (t0, months)", p.inflection),
    ];
    for (i, (name, estimate)) in rows.iter().enumerate() {
        let se = d.std_errors.map(|s| format!("{:.4}", s[i]));
        let ci = d.confidence_intervals.map(|c| c[i]);
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{estimate:.4}")),
            Cell::new(se.unwrap_or_else(|| "-".to_string())),
            Cell::new(ci.map_or("-".to_string(), |c| format!("{:.4}", c[0]))),
            Cell::new(ci.map_or("-".to_string(), |c| format!("{:.4}", c[1]))),
        ]);
    }
    table.add_row(vec![
        Cell::new("RMSE"),
        Cell::new(format!("{:.5}", d.rmse)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("R²"),
        Cell::new(format!("{:.4}", d.r_squared)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);

    output.push_str(&format!("{table}"));
    output
}

/// Print the fitted parameters table.
pub fn print_fit_table(curve: &FittedCurve) {
    print!("{}", format_fit_table(curve));
}

/// Format projected points for one scenario as a string.
pub fn format_projection_table(scenario: &str, points: &[ProjectedPoint]) -> String {
    let mut output = String::new();
    title(&mut output, &format!("Projection: {scenario}"), 50);

    let mut table = new_table(vec!["Month", "Time Index", "BEV Share"]);
    for point in points {
        table.add_row(vec![
            Cell::new(month_label(point.date)),
            Cell::new(point.time_index),
            Cell::new(pct(point.share)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print projected points for one scenario.
pub fn print_projection_table(scenario: &str, points: &[ProjectedPoint]) {
    print!("{}", format_projection_table(scenario, points));
}

/// Format milestone dates for one scenario as a string.
pub fn format_milestone_table(
    scenario: &str,
    milestones: &[Milestone],
    horizon_end: Option<NaiveDate>,
) -> String {
    let mut output = String::new();
    title(&mut output, &format!("Milestones: {scenario}"), 50);

    let mut table = new_table(vec!["Threshold", "First Reached"]);
    for m in milestones {
        table.add_row(vec![
            Cell::new(format!("{:.0}%", m.threshold * 100.0)),
            Cell::new(milestone_label(m.achieved, horizon_end)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print milestone dates for one scenario.
pub fn print_milestone_table(scenario: &str, milestones: &[Milestone], horizon_end: Option<NaiveDate>) {
    print!("{}", format_milestone_table(scenario, milestones, horizon_end));
}

/// Format the headline KPI summary as a string.
pub fn format_kpi_summary(kpis: &KpiSummary, horizon_end: Option<NaiveDate>) -> String {
    let mut output = String::new();
    title(&mut output, &format!("KPI Summary ({})", kpis.scenario), 50);

    let mut table = new_table(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new(format!("Current share ({})", month_label(kpis.last_date))),
        Cell::new(pct(kpis.current_share)),
    ]);
    table.add_row(vec![
        Cell::new("Year-over-year change"),
        Cell::new(
            kpis.yoy_change_pp
                .map_or("n/a".to_string(), |pp| format!("{pp:+.1} pp")),
        ),
    ]);
    table.add_row(vec![
        Cell::new(format!("Projected share ({})", month_label(kpis.projection_date))),
        Cell::new(pct(kpis.projected_share)),
    ]);
    table.add_row(vec![
        Cell::new(format!("{:.0}% milestone", kpis.target_threshold * 100.0)),
        Cell::new(milestone_label(kpis.milestone, horizon_end)),
    ]);
    let timing = kpis.timing.to_string();
    table.add_row(vec![
        Cell::new(format!("vs target ({})", month_label(kpis.target_date))),
        Cell::new(timing).fg(if kpis.timing.on_track() {
            Color::Green
        } else {
            Color::Red
        }),
    ]);
    for gap in &kpis.policy_gaps {
        table.add_row(vec![
            Cell::new(format!(
                "Gap to {} target ({})",
                pct(gap.target_share),
                month_label(gap.date)
            )),
            Cell::new(format!("{:+.1} pp", gap.gap * 100.0)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the headline KPI summary.
pub fn print_kpi_summary(kpis: &KpiSummary, horizon_end: Option<NaiveDate>) {
    print!("{}", format_kpi_summary(kpis, horizon_end));
}

/// Format the scenario comparison as a string.
pub fn format_comparison_table(outcomes: &[ScenarioOutcome], horizon_end: Option<NaiveDate>) -> String {
    let mut output = String::new();
    title(&mut output, "Scenario Comparison", 70);

    let mut header = vec!["Scenario".to_string(), "Multiplier".to_string()];
    if let Some(first) = outcomes.first() {
        header.push(format!("Share {}", month_label(first.projection_date)));
        header.push("Gap to Target".to_string());
        header.extend(
            first
                .milestones
                .iter()
                .map(|m| format!("{:.0}% Reached", m.threshold * 100.0)),
        );
    }
    let mut table = new_table(header.iter().map(String::as_str).collect());

    for outcome in outcomes {
        let mut row = vec![
            Cell::new(&outcome.scenario),
            Cell::new(format!("{:.2}", outcome.multiplier)),
            Cell::new(pct(outcome.projected_share)),
            Cell::new(format!("{:+.1} pp", outcome.gap_to_target * 100.0)),
        ];
        row.extend(
            outcome
                .milestones
                .iter()
                .map(|m| Cell::new(milestone_label(m.achieved, horizon_end))),
        );
        table.add_row(row);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the scenario comparison.
pub fn print_comparison_table(outcomes: &[ScenarioOutcome], horizon_end: Option<NaiveDate>) {
    print!("{}", format_comparison_table(outcomes, horizon_end));
}

/// Format the near-term registrations forecast as a string.
///
/// Stress and shortfall columns are shown only when `show_stress` is set.
pub fn format_near_term_table(forecast: &NearTermForecast, band: f64, show_stress: bool) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Near-Term Registrations".bold().green()));
    output.push_str(&format!(
        "{}\n",
        format!(
            "Strategy: {} | Band: ±{:.0}% | Stress factor: {:.2}",
            forecast.strategy,
            band * 100.0,
            forecast.stress_factor
        )
        .dimmed()
    ));
    output.push_str(&format!("{}\n", "=".repeat(70)));

    let mut header = vec!["Month", "Normal", "Lower", "Upper"];
    if show_stress {
        header.extend(["Stress", "Shortfall"]);
    }
    let mut table = new_table(header);

    let bands = forecast.uncertainty_band(band);
    for (i, date) in forecast.dates.iter().enumerate() {
        let mut row = vec![
            Cell::new(month_label(*date)),
            Cell::new(format!("{:.0}", forecast.normal[i])),
            Cell::new(format!("{:.0}", bands[i].0)),
            Cell::new(format!("{:.0}", bands[i].1)),
        ];
        if show_stress {
            row.push(Cell::new(format!("{:.0}", forecast.stress[i])));
            row.push(Cell::new(format!("{:.0}", forecast.shortfall[i])));
        }
        table.add_row(row);
    }
    output.push_str(&format!("{table}\n"));

    if show_stress {
        if let Some(peak) = forecast.peak_shortfall() {
            output.push_str(&format!(
                "  Peak shortfall: {:.0} ({})\n",
                peak.value,
                month_label(peak.date)
            ));
        }
        output.push_str(&format!(
            "  Cumulative at risk: {:.0}\n",
            forecast.cumulative_at_risk()
        ));
    }
    output
}

/// Print the near-term registrations forecast.
pub fn print_near_term_table(forecast: &NearTermForecast, band: f64, show_stress: bool) {
    print!("{}", format_near_term_table(forecast, band, show_stress));
}

/// Format the scenario catalog as a string.
pub fn format_scenario_table(catalog: &ScenarioCatalog) -> String {
    let mut output = String::new();
    title(&mut output, "Scenarios", 40);

    let mut table = new_table(vec!["Scenario", "Growth Multiplier"]);
    for (i, scenario) in catalog.iter().enumerate() {
        let name = if i == 0 {
            format!("{} (baseline)", scenario.name)
        } else {
            scenario.name.clone()
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.2}", scenario.multiplier)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the scenario catalog.
pub fn print_scenario_table(catalog: &ScenarioCatalog) {
    print!("{}", format_scenario_table(catalog));
}
