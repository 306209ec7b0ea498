mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::forecast::{CompareArgs, ForecastArgs, ScenariosArgs};
use commands::perspectives::PerspectivesArgs;
use commands::quality::{AccuracyArgs, AnomaliesArgs, ConfidenceArgs, DataQualityArgs, ValidateArgs};
use commands::reconcile::ReconcileArgs;
use commands::risk::{RiskCatalogArgs, RiskScenariosArgs};
use commands::series::SeriesArgs;

/// Scenario revenue forecasting, reconciliation and forecast quality
#[derive(Parser)]
#[command(
    name = "revfc",
    version,
    about = "Scenario revenue forecasting, reconciliation and forecast quality",
    long_about = "A CLI for scenario-based revenue forecasting with decimal precision. \
                  Builds historical series, projects scenarios, applies risk factors, \
                  derives Finance and Sales perspectives, reconciles them and scores \
                  forecast quality."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Forecast config (JSON or YAML): perspectives, reconciliation, risk factors
    #[arg(long, global = true)]
    config: Option<String>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an ordered historical revenue series from raw records
    Series(SeriesArgs),
    /// Build per-project, per-period revenue rows from raw records
    ProjectSeries(SeriesArgs),
    /// Project revenue forward under one scenario
    Forecast(ForecastArgs),
    /// List the seeded scenarios and their assumptions
    Scenarios(ScenariosArgs),
    /// Project several scenarios side by side over one history
    CompareScenarios(CompareArgs),
    /// Show the risk factor catalog
    RiskCatalog(RiskCatalogArgs),
    /// Optimistic, pessimistic and most-likely variants of a forecast
    RiskScenarios(RiskScenariosArgs),
    /// Finance and Sales perspectives of per-project revenue
    Perspectives(PerspectivesArgs),
    /// Reconcile Finance and Sales forecasts
    Reconcile(ReconcileArgs),
    /// Confidence scores for produced scenarios
    Confidence(ConfidenceArgs),
    /// Detect spikes, zero periods and extreme growth
    Anomalies(AnomaliesArgs),
    /// Score raw input records for data quality
    DataQuality(DataQualityArgs),
    /// Full validation report with recommendations
    Validate(ValidateArgs),
    /// Forecast accuracy against realized actuals
    Accuracy(AccuracyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match input::file::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Series(args) => commands::series::run_series(args),
        Commands::ProjectSeries(args) => commands::series::run_project_series(args),
        Commands::Forecast(args) => commands::forecast::run_forecast(args),
        Commands::Scenarios(args) => commands::forecast::run_scenarios(args),
        Commands::CompareScenarios(args) => commands::forecast::run_compare(args),
        Commands::RiskCatalog(args) => commands::risk::run_risk_catalog(args, config.as_ref()),
        Commands::RiskScenarios(args) => commands::risk::run_risk_scenarios(args, config.as_ref()),
        Commands::Perspectives(args) => commands::perspectives::run_perspectives(args, config.as_ref()),
        Commands::Reconcile(args) => commands::reconcile::run_reconcile(args, config.as_ref()),
        Commands::Confidence(args) => commands::quality::run_confidence(args),
        Commands::Anomalies(args) => commands::quality::run_anomalies(args),
        Commands::DataQuality(args) => commands::quality::run_data_quality(args),
        Commands::Validate(args) => commands::quality::run_validate(args),
        Commands::Accuracy(args) => commands::quality::run_accuracy(args),
        Commands::Version => {
            println!("revfc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
