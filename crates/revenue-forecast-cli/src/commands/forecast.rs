use clap::Args;
use serde_json::{json, Value};

use revenue_forecast_core::projection::{self, ComparisonInput, ForecastInput, ScenarioStore};

use crate::input;

/// Arguments for single-scenario projection
#[derive(Args)]
pub struct ForecastArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Seeded scenario whose assumptions replace the input's
    /// (e.g. "Optimistic")
    #[arg(long)]
    pub scenario: Option<String>,

    /// Number of periods to project
    #[arg(long)]
    pub periods: Option<u32>,

    /// Prepend the historical points and report growth over the whole series
    #[arg(long)]
    pub include_history: bool,
}

/// Arguments for listing scenarios
#[derive(Args)]
pub struct ScenariosArgs {
    /// Show only this scenario
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for side-by-side scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON or YAML input file with the historical series
    #[arg(long)]
    pub input: Option<String>,

    /// Scenario to include; repeat for several (default: all seeded scenarios)
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Number of periods to project
    #[arg(long)]
    pub periods: Option<u32>,
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut forecast_input: ForecastInput = input::read_input(args.input.as_deref(), "forecast")?;

    if let Some(ref name) = args.scenario {
        let store = ScenarioStore::new();
        forecast_input.assumptions = store.assumptions(name)?;
        forecast_input.scenario_name = name.clone();
    }
    if let Some(periods) = args.periods {
        forecast_input.periods = periods;
    }

    let output = projection::forecast_revenue(&forecast_input)?;
    let points = if args.include_history {
        projection::combine_historical_and_forecast(
            &forecast_input.historical,
            &output.result,
            &forecast_input.scenario_name,
        )
    } else {
        output.result.clone()
    };
    let growth = projection::calculate_growth_metrics(&points);

    let mut value = serde_json::to_value(&output)?;
    value["result"] = json!({
        "points": points,
        "growth_metrics": growth,
    });
    Ok(value)
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store = ScenarioStore::new();
    match args.name {
        Some(ref name) => {
            let scenario = store
                .get(name)
                .ok_or_else(|| format!("Unknown scenario '{}'; available: {}", name, store.names().join(", ")))?;
            Ok(serde_json::to_value(scenario)?)
        }
        None => Ok(serde_json::to_value(store.scenarios())?),
    }
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut compare_input: ComparisonInput = input::read_input(args.input.as_deref(), "compare-scenarios")?;
    if !args.scenarios.is_empty() {
        compare_input.scenario_names = args.scenarios;
    }
    if let Some(periods) = args.periods {
        compare_input.periods = periods;
    }

    let store = ScenarioStore::new();
    let output = projection::compare_scenarios(&store, &compare_input)?;
    Ok(serde_json::to_value(&output)?)
}
