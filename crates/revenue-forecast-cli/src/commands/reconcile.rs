use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use revenue_forecast_core::config::ForecastConfig;
use revenue_forecast_core::perspectives::{self, PerspectiveInput};
use revenue_forecast_core::reconciliation::{
    self, ReconcileInput, ReconciliationMethod, ReconciliationSettings, UnmatchedPeriods,
};

use crate::input;

/// Arguments for Finance/Sales reconciliation
#[derive(Args)]
pub struct ReconcileArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Reconciliation method: finance_priority, sales_priority, weighted_average
    #[arg(long)]
    pub method: Option<String>,

    /// Finance weight for weighted_average (0-1)
    #[arg(long)]
    pub finance_weight: Option<Decimal>,

    /// Keep one-sided periods, treating the missing side as zero
    #[arg(long)]
    pub zero_fill: bool,

    /// Treat the input as perspective input and reconcile the generated
    /// Finance and Sales views
    #[arg(long)]
    pub from_perspectives: bool,
}

/// Settings precedence: input, then `--config`, then flags.
fn settings(
    base: ReconciliationSettings,
    args: &ReconcileArgs,
    config: Option<&ForecastConfig>,
) -> Result<ReconciliationSettings, Box<dyn std::error::Error>> {
    let mut settings = config.map(|c| c.reconciliation).unwrap_or(base);
    if let Some(ref method) = args.method {
        settings.method = method.parse::<ReconciliationMethod>()?;
    }
    if let Some(weight) = args.finance_weight {
        settings.finance_weight = weight;
    }
    if args.zero_fill {
        settings.unmatched = UnmatchedPeriods::ZeroFill;
    }
    Ok(settings)
}

pub fn run_reconcile(
    args: ReconcileArgs,
    config: Option<&ForecastConfig>,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.from_perspectives {
        let mut p_input: PerspectiveInput = input::read_input(args.input.as_deref(), "reconcile")?;
        if let Some(config) = config {
            p_input.config = config.perspectives.clone();
        }
        let dual = perspectives::generate_perspectives(&p_input)?;
        let settings = settings(ReconciliationSettings::default(), &args, config)?;
        let mut result = reconciliation::reconcile_perspectives(&dual.result, &settings)?;
        let mut warnings = dual.warnings;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        return Ok(serde_json::to_value(result)?);
    }

    let r_input: ReconcileInput = input::read_input(args.input.as_deref(), "reconcile")?;
    let settings = settings(r_input.settings(), &args, config)?;
    let r_input = ReconcileInput::new(r_input.finance, r_input.sales, &settings);
    let result = reconciliation::reconcile_forecasts(&r_input)?;
    Ok(serde_json::to_value(result)?)
}
