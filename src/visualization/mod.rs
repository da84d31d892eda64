mod charts;
mod tables;

pub use charts::{
    format_share_chart, format_shortfall_chart, print_share_chart, print_shortfall_chart,
};
pub use tables::{
    format_comparison_table, format_fit_table, format_kpi_summary, format_milestone_table,
    format_near_term_table, format_projection_table, format_scenario_table, milestone_label,
    print_comparison_table, print_fit_table, print_kpi_summary, print_milestone_table,
    print_near_term_table, print_projection_table, print_scenario_table,
};
