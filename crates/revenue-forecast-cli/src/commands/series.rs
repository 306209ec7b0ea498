use clap::Args;
use serde_json::Value;

use revenue_forecast_core::series::{self, SeriesInput};
use revenue_forecast_core::Granularity;

use crate::input;

/// Arguments for the historical and per-project series builders
#[derive(Args)]
pub struct SeriesArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Bucket by fiscal quarter instead of calendar month
    #[arg(long)]
    pub quarterly: bool,

    /// Fiscal year start month (1-12), overriding the input calendar
    #[arg(long)]
    pub fiscal_start: Option<u32>,
}

fn series_input(args: &SeriesArgs, command: &str) -> Result<SeriesInput, Box<dyn std::error::Error>> {
    let mut series_input: SeriesInput = input::read_input(args.input.as_deref(), command)?;
    if args.quarterly {
        series_input.granularity = Granularity::Quarterly;
    }
    if let Some(month) = args.fiscal_start {
        series_input.calendar.start_month = month;
    }
    Ok(series_input)
}

pub fn run_series(args: SeriesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series_input = series_input(&args, "series")?;
    let result = series::build_historical_series(&series_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_project_series(args: SeriesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series_input = series_input(&args, "project-series")?;
    let result = series::build_project_series(&series_input)?;
    Ok(serde_json::to_value(result)?)
}
