use clap::Args;
use serde_json::Value;

use revenue_forecast_core::config::ForecastConfig;
use revenue_forecast_core::risk::{self, RiskCategory, RiskFactor, RiskFactorCatalog, RiskScenarioInput};

use crate::input;

/// Arguments for showing the risk factor catalog
#[derive(Args)]
pub struct RiskCatalogArgs {
    /// Only factors in this category: market, operational, financial, competitive
    #[arg(long)]
    pub category: Option<String>,

    /// Only factors applicable to these dimensions (repeatable)
    #[arg(long = "dimension")]
    pub dimensions: Vec<String>,
}

/// Arguments for risk-adjusted scenario generation
#[derive(Args)]
pub struct RiskScenariosArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Dimensions selecting applicable factors (repeatable, replaces the input's)
    #[arg(long = "dimension")]
    pub dimensions: Vec<String>,
}

fn catalog(config: Option<&ForecastConfig>) -> Result<RiskFactorCatalog, Box<dyn std::error::Error>> {
    match config {
        Some(config) => Ok(config.catalog()?),
        None => Ok(RiskFactorCatalog::new()),
    }
}

pub fn run_risk_catalog(
    args: RiskCatalogArgs,
    config: Option<&ForecastConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let catalog = catalog(config)?;

    let mut factors: Vec<&RiskFactor> = if args.dimensions.is_empty() {
        catalog.factors().iter().collect()
    } else {
        catalog.applicable(args.dimensions.as_slice())
    };
    if let Some(ref category) = args.category {
        let category: RiskCategory = category.parse()?;
        factors.retain(|f| f.category == category);
    }

    Ok(serde_json::to_value(factors)?)
}

pub fn run_risk_scenarios(
    args: RiskScenariosArgs,
    config: Option<&ForecastConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut risk_input: RiskScenarioInput = input::read_input(args.input.as_deref(), "risk scenarios")?;
    if !args.dimensions.is_empty() {
        risk_input.dimensions = args.dimensions;
    }
    let catalog = catalog(config)?;
    let result = risk::generate_risk_scenarios(&risk_input, &catalog)?;
    Ok(serde_json::to_value(result)?)
}
