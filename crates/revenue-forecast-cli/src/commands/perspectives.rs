use clap::Args;
use serde_json::Value;

use revenue_forecast_core::config::ForecastConfig;
use revenue_forecast_core::perspectives::{self, PerspectiveInput};

use crate::input;

/// Arguments for the Finance/Sales perspective generator
#[derive(Args)]
pub struct PerspectivesArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// A `--config` file replaces the perspective settings embedded in the input.
pub fn run_perspectives(
    args: PerspectivesArgs,
    config: Option<&ForecastConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut p_input: PerspectiveInput = input::read_input(args.input.as_deref(), "perspectives")?;
    if let Some(config) = config {
        p_input.config = config.perspectives.clone();
    }
    let result = perspectives::generate_perspectives(&p_input)?;
    Ok(serde_json::to_value(result)?)
}
