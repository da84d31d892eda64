use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bev_adoption_forecaster::{
    config::EngineConfig,
    io::{self, CsvFormat, ExcelFormat, JsonFormat, ReportWriter},
    models::HistoricalSeries,
    visualization::{
        print_comparison_table, print_fit_table, print_kpi_summary, print_milestone_table,
        print_near_term_table, print_projection_table, print_scenario_table, print_share_chart,
        print_shortfall_chart,
    },
    Forecaster,
};

#[derive(Parser)]
#[command(
    name = "bev-forecast",
    about = "BEV Adoption Forecaster - logistic growth scenarios, milestones and near-term stress tests",
    version,
    author
)]
struct Cli {
    /// Engine configuration file (TOML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the logistic growth curve and show parameters and diagnostics
    Fit {
        /// Path to the historical series (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Project a scenario over the horizon
    Project {
        /// Path to the historical series (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// Scenario name (case-insensitive; dashes allowed for spaces)
        #[arg(short, long, default_value = "Baseline")]
        scenario: String,

        /// Show every N-th month from the end of the history
        #[arg(short, long, default_value = "12")]
        every: usize,
    },

    /// Show the months each milestone threshold is first reached
    Milestones {
        /// Path to the historical series (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// Scenario name; every scenario when omitted
        #[arg(short, long)]
        scenario: Option<String>,
    },

    /// Show headline KPIs for the baseline scenario
    Kpi {
        /// Path to the historical series (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compare every scenario side by side
    Compare {
        /// Path to the historical series (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Forecast near-term registrations
    NearTerm {
        /// Path to the historical series (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// Include the stress scenario and shortfall metrics
        #[arg(long)]
        stress: bool,
    },

    /// Export the full forecast report
    Export {
        /// Path to the historical series (CSV, JSON, or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (.json, .csv, or .xlsx)
        #[arg(short, long)]
        output: PathBuf,

        /// Scenario the report is built around
        #[arg(short, long, default_value = "Baseline")]
        scenario: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the scenario catalog
    Scenarios,

    /// Print the effective configuration as TOML
    Config,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn load_series(path: &Path) -> Result<HistoricalSeries> {
    let ext = extension(path);
    let series = match ext.as_str() {
        "csv" => io::read_csv(path)?,
        "json" => io::read_json(path)?,
        "xlsx" => io::read_excel(path)?,
        _ => anyhow::bail!("Unsupported file format: .{ext}. Use .csv, .json, or .xlsx"),
    };
    Ok(series)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn banner(text: String) {
    println!("\n{}", text.bold().cyan());
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let horizon_end = Some(config.horizon.end);

    match cli.command {
        Commands::Fit { input } => {
            let series = load_series(&input)?;
            let forecaster = Forecaster::new(&series, &config)?;
            banner(format!("BEV Adoption Fit: {}", input.display()));
            println!(
                "  Loaded {} months ({} to {})",
                series.len(),
                series.start().map(|d| d.to_string()).unwrap_or_default(),
                series.end().map(|d| d.to_string()).unwrap_or_default()
            );
            print_fit_table(forecaster.fitted());
        }

        Commands::Project {
            input,
            scenario,
            every,
        } => {
            let series = load_series(&input)?;
            let forecaster = Forecaster::new(&series, &config)?;
            let projection = forecaster.project(&scenario)?;
            let from = series.end().unwrap_or_default();
            print_projection_table(&projection.scenario, &projection.sampled_from(from, every));
            print_share_chart(&projection);
        }

        Commands::Milestones { input, scenario } => {
            let series = load_series(&input)?;
            let forecaster = Forecaster::new(&series, &config)?;
            let names: Vec<String> = match scenario {
                Some(name) => vec![forecaster.catalog().get(&name)?.name.clone()],
                None => forecaster
                    .catalog()
                    .names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            };
            for name in names {
                let milestones = forecaster.milestones(&name)?;
                print_milestone_table(&name, &milestones, horizon_end);
            }
        }

        Commands::Kpi { input } => {
            let series = load_series(&input)?;
            let forecaster = Forecaster::new(&series, &config)?;
            print_kpi_summary(&forecaster.kpis()?, horizon_end);
        }

        Commands::Compare { input } => {
            let series = load_series(&input)?;
            let forecaster = Forecaster::new(&series, &config)?;
            print_comparison_table(&forecaster.scenario_comparison()?, horizon_end);
        }

        Commands::NearTerm { input, stress } => {
            let series = load_series(&input)?;
            let forecaster = Forecaster::new(&series, &config)?;
            let forecast = forecaster.near_term()?;
            print_near_term_table(&forecast, config.near_term.uncertainty_band, stress);
            if stress {
                print_shortfall_chart(&forecast);
            }
        }

        Commands::Export {
            input,
            output,
            scenario,
            pretty,
        } => {
            let series = load_series(&input)?;
            let forecaster = Forecaster::new(&series, &config)?;
            let report = forecaster.report(&scenario)?;

            let out_ext = extension(&output);
            let json = JsonFormat { pretty };
            let writer: &dyn ReportWriter = match out_ext.as_str() {
                "csv" => &CsvFormat,
                "json" => &json,
                "xlsx" => &ExcelFormat,
                _ => anyhow::bail!("Unsupported output format: .{out_ext}"),
            };
            writer.write(&report, &output)?;

            println!(
                "{} Exported {} -> {}",
                "Success:".green().bold(),
                input.display(),
                output.display()
            );
        }

        Commands::Scenarios => {
            print_scenario_table(&config.catalog()?);
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
